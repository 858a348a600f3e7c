//! Zi Wei Dou Shu pattern detection: palace ring algebra, temporal overlays,
//! a catalog of classical chart patterns, and a cascading evaluator.

pub mod catalog;
pub mod chart;
pub mod context;
pub mod evaluator;
pub mod graph;
pub mod star;
pub mod types;

pub use catalog::{catalog, Fact, Pattern, PatternFamily, Rule};
pub use chart::{load_horoscope, parse_horoscope, Chart, RawChart};
pub use context::{
    flying_mutagens, four_transformations, EvaluationContext, FlyingMutagen, Horoscope,
    ScopeFlags, ScopeOverlay, TemporalContext, TemporalContextBuilder,
};
pub use evaluator::{
    detect_chart, detect_patterns, DetectionReport, IndeterminateOutcome, PatternEvaluator,
    Verdict,
};
pub use graph::{PalaceGraph, PALACE_COUNT};
pub use star::{StarKind, StarName};
pub use types::*;
