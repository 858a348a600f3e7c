//! Chart file location.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming a chart export.
pub const CHART_ENV: &str = "ZIWEI_CHART";

const CWD_CHART: &str = "chart.json";
const HOME_CHART: &str = ".ziwei/chart.json";

/// Where a chart path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSource {
    Explicit,
    Env,
    WorkingDir,
    Home,
}

/// Resolve the chart file path: explicit flag, then `ZIWEI_CHART`, then
/// `./chart.json` if it exists, then `~/.ziwei/chart.json`.
pub fn resolve_chart_path(explicit: Option<&Path>) -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);
    let (path, source) = resolve_from(explicit, std::env::var_os(CHART_ENV), Path::new("."), home);
    tracing::debug!("Chart path {} ({source:?})", path.display());
    path
}

/// Resolution with the environment passed in.
pub fn resolve_from(
    explicit: Option<&Path>,
    env: Option<OsString>,
    cwd: &Path,
    home: Option<PathBuf>,
) -> (PathBuf, ChartSource) {
    if let Some(path) = explicit {
        return (path.to_path_buf(), ChartSource::Explicit);
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return (PathBuf::from(path), ChartSource::Env);
    }
    let local = cwd.join(CWD_CHART);
    if local.exists() {
        return (local, ChartSource::WorkingDir);
    }
    let home = home.unwrap_or_else(|| PathBuf::from("."));
    (home.join(HOME_CHART), ChartSource::Home)
}
