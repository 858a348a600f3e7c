//! Integration tests for the command layer, using chart files on disk.

use std::io::Write;
use std::path::PathBuf;

use serde_json::{json, Value};

use ziwei_patterns::{Branch, Scope, ScopeFlags};
use ziwei_patterns_cli::commands::{self, OutputFormat};
use ziwei_patterns_cli::config::{resolve_from, ChartSource};
use ziwei_patterns_cli::{resolve_chart_path, CliError};

// ─────────────────────── helpers ───────────────────────

const ROLES: [&str; 12] = [
    "命宫", "兄弟", "夫妻", "子女", "财帛", "疾厄", "迁移", "交友", "官禄", "田宅", "福德", "父母",
];

/// A chart with 命宫 at index 4 (午) and roles laid out against the ring.
fn chart_json() -> Value {
    let palaces: Vec<Value> = (0..12)
        .map(|i: usize| {
            let role = ROLES[(4 + 12 - i) % 12];
            let mut palace = json!({
                "index": i,
                "earthlyBranch": Branch::for_palace_index(i).label(),
                "heavenlyStem": "甲",
                "name": role,
                "isBodyPalace": i == 8,
                "majorStars": [],
                "minorStars": [],
                "adjectiveStars": [],
            });
            if i == 4 {
                palace["majorStars"] = json!([{ "name": "紫微", "brightness": "庙" }]);
            }
            if i == 3 {
                palace["minorStars"] = json!([{ "name": "左辅" }]);
            }
            if i == 5 {
                palace["minorStars"] = json!([{ "name": "右弼" }]);
            }
            palace
        })
        .collect();
    json!({ "palaces": palaces })
}

fn write_json(dir: &tempfile::TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    path
}

// ─────────────────────── tests ───────────────────────

#[test]
fn test_explicit_chart_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    assert_eq!(resolve_chart_path(Some(path.as_path())), path);
}

#[test]
fn test_working_dir_chart_before_home() {
    let dir = tempfile::tempdir().unwrap();
    let home = PathBuf::from("/home/nobody");
    let (_, source) = resolve_from(None, None, dir.path(), Some(home.clone()));
    assert_eq!(source, ChartSource::Home);

    let path = write_json(&dir, "chart.json", &chart_json());
    let (found, source) = resolve_from(None, None, dir.path(), Some(home));
    assert_eq!(source, ChartSource::WorkingDir);
    assert_eq!(found, path);
    assert!(commands::load_chart(&found, None).is_ok());
}

#[test]
fn test_default_target_is_life_palace() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let target = commands::resolve_target(&chart, None, ScopeFlags::default()).unwrap();
    assert_eq!(target, 4);
}

#[test]
fn test_target_by_index_name_role_and_branch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let flags = ScopeFlags::default();

    assert_eq!(commands::resolve_target(&chart, Some("7"), flags).unwrap(), 7);
    assert_eq!(commands::resolve_target(&chart, Some("财帛"), flags).unwrap(), 0);
    assert_eq!(commands::resolve_target(&chart, Some("财帛宫"), flags).unwrap(), 0);
    assert_eq!(commands::resolve_target(&chart, Some("子"), flags).unwrap(), 10);
    assert!(matches!(
        commands::resolve_target(&chart, Some("99"), flags),
        Err(CliError::UnknownPalace(_))
    ));
    assert!(matches!(
        commands::resolve_target(&chart, Some("不存在"), flags),
        Err(CliError::UnknownPalace(_))
    ));
}

#[test]
fn test_missing_chart_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let result = commands::load_chart(&path, None);
    assert!(matches!(result, Err(CliError::Chart(_))));
}

#[test]
fn test_invalid_chart_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut value = chart_json();
    value["palaces"].as_array_mut().unwrap().pop();
    let path = write_json(&dir, "chart.json", &value);
    let err = commands::load_chart(&path, None).unwrap_err();
    assert!(err.to_string().contains("Expected 12 palaces"));
}

#[test]
fn test_detect_renders_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let report = chart.detect(4, ScopeFlags::default());
    let text = commands::render_reports(
        &chart,
        &[report],
        ScopeFlags::default(),
        OutputFormat::Json,
    )
    .unwrap();

    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(1));
    let parsed = &parsed[0];
    assert_eq!(parsed["palace"], 4);
    let names: Vec<&str> = parsed["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"左右夹命"));
    assert!(names.contains(&"极向离明"));
    assert!(names.contains(&"紫微辅弼"));
    assert!(parsed["matches"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["scope"] == "natal"));
}

#[test]
fn test_detect_all_renders_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let reports = chart.detect_all(ScopeFlags::default());
    let text =
        commands::render_reports(&chart, &reports, ScopeFlags::default(), OutputFormat::Text)
            .unwrap();
    assert!(text.contains("命宫 [午] (palace 4)"));
    assert!(text.contains("左右夹命"));
    assert_eq!(text.matches("(palace ").count(), 12);
}

#[test]
fn test_separate_horoscope_file() {
    let dir = tempfile::tempdir().unwrap();
    let chart_path = write_json(&dir, "chart.json", &chart_json());
    let mut stars = vec![json!([]); 12];
    stars[4] = json!([{ "name": "运羊" }]);
    let mut names = vec![json!(""); 12];
    names[2] = json!("命宫");
    let horoscope = json!({
        "decadal": { "heavenlyStem": "甲", "stars": stars, "palaceNames": names }
    });
    let horoscope_path = write_json(&dir, "horoscope.json", &horoscope);

    let chart = commands::load_chart(&chart_path, Some(horoscope_path.as_path())).unwrap();
    let flags = ScopeFlags {
        decadal: true,
        ..ScopeFlags::default()
    };
    assert_eq!(commands::resolve_target(&chart, None, flags).unwrap(), 2);

    let report = chart.detect(4, flags);
    assert_eq!(report.scope_of("马头带箭"), Some(Scope::Decadal));
    assert_eq!(report.scope_of("极向离明"), Some(Scope::Natal));
}

#[test]
fn test_catalog_listing() {
    let text = commands::render_catalog(OutputFormat::Text).unwrap();
    let count = ziwei_patterns::catalog().len();
    assert!(text.ends_with(&format!("{count} patterns\n")));
    assert!(text.starts_with("紫府同宫"));

    let json = commands::render_catalog(OutputFormat::Json).unwrap();
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), count);
    assert_eq!(parsed[0]["family"], "co-location");
}

#[test]
fn test_validate_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let summary = commands::summarize_chart(&chart);
    assert!(summary.contains("Palaces: 12"));
    assert!(summary.contains("Stars: 3"));
    assert!(summary.contains("Life palace: 4 (午)"));
    assert!(summary.contains("Body palace: 8 (戌)"));
    assert!(summary.contains("Overlays: none"));
}

#[test]
fn test_detect_all_json_is_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(&dir, "chart.json", &chart_json());
    let chart = commands::load_chart(&path, None).unwrap();
    let reports = chart.detect_all(ScopeFlags::default());
    let text =
        commands::render_reports(&chart, &reports, ScopeFlags::default(), OutputFormat::Json)
            .unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(12));
    assert_eq!(parsed[11]["palace"], 11);
}

#[test]
fn test_text_shows_palace_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut value = chart_json();
    value["palaces"][4]["heavenlyStem"] = json!("乙");
    let chart_path = write_json(&dir, "chart.json", &value);
    let horoscope = json!({ "decadal": { "heavenlyStem": "壬" } });
    let horoscope_path = write_json(&dir, "horoscope.json", &horoscope);
    let chart = commands::load_chart(&chart_path, Some(horoscope_path.as_path())).unwrap();
    let flags = ScopeFlags {
        decadal: true,
        ..ScopeFlags::default()
    };

    let reports = vec![chart.detect(4, flags), chart.detect(0, flags)];
    let text = commands::render_reports(&chart, &reports, flags, OutputFormat::Text).unwrap();
    assert!(text.contains("宫中宫 命之命"));
    assert!(text.contains("宫中宫 命之财"));
    // 壬 turns 紫微 into 化权 for the decade
    assert!(text.contains("四化 紫微 - 权 - -"));
    // 乙 flies 化科 onto 紫微 in palace 4
    assert!(text.contains("化科 紫微 @ 4"));
    assert!(text.contains("化禄 天机 @ -"));
}
