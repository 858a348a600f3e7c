//! Command implementations shared by the binary and the tests.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use ziwei_patterns::{
    catalog, flying_mutagens, load_horoscope, Branch, Chart, DetectionReport, Palace, PalaceRole,
    PatternFamily, ScopeFlags, TemporalContextBuilder,
};

use crate::error::{CliError, CliResult};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Load a chart, optionally replacing its overlays with a separate horoscope file.
pub fn load_chart(chart_path: &Path, horoscope_path: Option<&Path>) -> CliResult<Chart> {
    tracing::info!("Loading chart: {}", chart_path.display());
    let mut chart = Chart::from_file(chart_path)?;
    if let Some(path) = horoscope_path {
        tracing::info!("Loading horoscope: {}", path.display());
        chart = chart.with_horoscope(load_horoscope(path)?);
    }
    Ok(chart)
}

/// Resolve `--palace`: a ring index, a palace name, a role such as `财帛`, or
/// a branch label. Without one, the life palace at the deepest active scope.
pub fn resolve_target(chart: &Chart, palace: Option<&str>, flags: ScopeFlags) -> CliResult<usize> {
    let Some(query) = palace.map(str::trim) else {
        return TemporalContextBuilder::new(chart.horoscope.as_ref())
            .locate_life_palace(&chart.palaces, flags)
            .ok_or(CliError::NoLifePalace);
    };

    if let Ok(index) = query.parse::<usize>() {
        return chart
            .graph()
            .by_index(index)
            .map(|p| p.index)
            .ok_or_else(|| CliError::UnknownPalace(query.to_string()));
    }

    let graph = chart.graph();
    let by_name = chart.palaces.iter().find(|p| p.name == query);
    let by_role = PalaceRole::from_name(query)
        .and_then(|role| chart.palaces.iter().find(|p| p.role() == Some(role)));
    let by_branch = Branch::from_label(query).and_then(|b| graph.by_branch(b));

    by_name
        .or(by_role)
        .or(by_branch)
        .map(|p| p.index)
        .ok_or_else(|| CliError::UnknownPalace(query.to_string()))
}

fn palace_heading(chart: &Chart, index: usize) -> String {
    match chart.graph().by_index(index) {
        Some(p) if !p.name.is_empty() => format!("{} [{}] (palace {index})", p.name, p.branch),
        Some(p) => format!("[{}] (palace {index})", p.branch),
        None => format!("(palace {index})"),
    }
}

/// Chart context for a palace: its 宫中宫 name seen from the life palace,
/// the 四化 stack of each transformed star, and where its stem flies.
fn palace_details(chart: &Chart, palace: &Palace, flags: ScopeFlags) -> Vec<String> {
    let graph = chart.graph();
    let builder = TemporalContextBuilder::new(chart.horoscope.as_ref());
    let mut lines = Vec::new();

    if let Some(life) = graph.life_palace() {
        lines.push(format!("宫中宫 {}", graph.relative_name(life, palace)));
    }

    for star in palace.stars() {
        let stack = builder.mutagen_stack(star.name, star.mutagen, flags);
        if stack.iter().all(Option::is_none) {
            continue;
        }
        let labels: Vec<&str> = stack
            .iter()
            .map(|m| m.map_or("-", |m| m.label()))
            .collect();
        lines.push(format!("四化 {} {}", star.name, labels.join(" ")));
    }

    let legs: Vec<String> = flying_mutagens(palace, &chart.palaces)
        .iter()
        .map(|leg| match leg.target {
            Some(target) => format!("{} {} @ {target}", leg.mutagen, leg.star),
            None => format!("{} {} @ -", leg.mutagen, leg.star),
        })
        .collect();
    if !legs.is_empty() {
        lines.push(format!("飞化 {}", legs.join(", ")));
    }
    lines
}

/// Render detection reports. JSON output is always an array of reports,
/// one per palace, even for a single target.
pub fn render_reports(
    chart: &Chart,
    reports: &[DetectionReport],
    flags: ScopeFlags,
    format: OutputFormat,
) -> CliResult<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(reports)?);
    }

    let graph = chart.graph();
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "{}", palace_heading(chart, report.palace));
        if let Some(palace) = graph.by_index(report.palace) {
            for line in palace_details(chart, palace, flags) {
                let _ = writeln!(out, "  {line}");
            }
        }
        if report.matches.is_empty() {
            let _ = writeln!(out, "  (no patterns)");
        }
        for m in &report.matches {
            let _ = writeln!(out, "  {:<8} {}", m.name, m.scope);
        }
        for outcome in &report.indeterminate {
            let _ = writeln!(
                out,
                "  ? {} at {}: {}",
                outcome.pattern, outcome.scope, outcome.reason
            );
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct CatalogEntry {
    name: &'static str,
    family: PatternFamily,
}

/// Render the pattern catalog in reporting order.
pub fn render_catalog(format: OutputFormat) -> CliResult<String> {
    let entries: Vec<CatalogEntry> = catalog()
        .iter()
        .map(|p| CatalogEntry {
            name: p.name,
            family: p.family,
        })
        .collect();

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }

    let mut out = String::new();
    for entry in &entries {
        let _ = writeln!(out, "{:<8} {}", entry.name, entry.family);
    }
    let _ = writeln!(out, "{} patterns", entries.len());
    Ok(out)
}

/// One-screen summary of a validated chart.
pub fn summarize_chart(chart: &Chart) -> String {
    let graph = chart.graph();
    let star_count: usize = chart.palaces.iter().map(|p| p.stars().count()).sum();
    let label = |p: Option<&ziwei_patterns::Palace>| {
        p.map(|p| format!("{} ({})", p.index, p.branch))
            .unwrap_or_else(|| "none".to_string())
    };
    let scopes: Vec<&str> = ziwei_patterns::Scope::TRANSIENT
        .into_iter()
        .filter(|s| chart.horoscope.as_ref().is_some_and(|h| h.has(*s)))
        .map(|s| s.as_str())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "  Palaces: {}", chart.palaces.len());
    let _ = writeln!(out, "  Stars: {star_count}");
    let _ = writeln!(out, "  Life palace: {}", label(graph.life_palace()));
    let _ = writeln!(out, "  Body palace: {}", label(graph.body_palace()));
    let _ = writeln!(
        out,
        "  Overlays: {}",
        if scopes.is_empty() {
            "none".to_string()
        } else {
            scopes.join(", ")
        }
    );
    out
}
