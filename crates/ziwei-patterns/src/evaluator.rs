//! Cascading pattern evaluation across natal and overlay scopes.

use serde::Serialize;

use crate::catalog::{self, Pattern};
use crate::context::{EvaluationContext, Horoscope, ScopeFlags, TemporalContextBuilder};
use crate::graph::PalaceGraph;
use crate::types::{Indeterminate, Palace, PatternMatch, Scope};

/// Outcome of one rule for one palace in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    NotMatched,
    Indeterminate(Indeterminate),
}

impl From<Result<bool, Indeterminate>> for Verdict {
    fn from(result: Result<bool, Indeterminate>) -> Self {
        match result {
            Ok(true) => Verdict::Matched,
            Ok(false) => Verdict::NotMatched,
            Err(reason) => Verdict::Indeterminate(reason),
        }
    }
}

/// A rule that could not be decided during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndeterminateOutcome {
    pub pattern: &'static str,
    pub scope: Scope,
    pub reason: String,
}

/// Everything found for one target palace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    pub palace: usize,
    pub matches: Vec<PatternMatch>,
    pub indeterminate: Vec<IndeterminateOutcome>,
}

impl DetectionReport {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.matches.iter().map(|m| m.name)
    }

    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        self.matches.iter().find(|m| m.name == name).map(|m| m.scope)
    }
}

/// One evaluation pass: the scope it tags matches with, and the overlay
/// scopes merged into its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub scope: Scope,
    pub merged: Vec<Scope>,
}

/// Natal pass first, then one pass per overlay scope that is both requested
/// and present. Each overlay pass merges every earlier overlay pass.
pub fn plan_passes(horoscope: Option<&Horoscope>, flags: ScopeFlags) -> Vec<Pass> {
    let mut passes = vec![Pass {
        scope: Scope::Natal,
        merged: Vec::new(),
    }];
    let mut merged = Vec::new();
    for scope in Scope::TRANSIENT {
        if !flags.is_active(scope) {
            continue;
        }
        if !horoscope.is_some_and(|h| h.has(scope)) {
            tracing::debug!("Skipping {scope} pass: no overlay data");
            continue;
        }
        merged.push(scope);
        passes.push(Pass {
            scope,
            merged: merged.clone(),
        });
    }
    passes
}

/// Runs a catalog over a chart.
#[derive(Debug, Clone, Copy)]
pub struct PatternEvaluator<'c> {
    catalog: &'c [Pattern],
}

impl Default for PatternEvaluator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEvaluator<'static> {
    /// Evaluator over the built-in catalog.
    pub fn new() -> Self {
        Self {
            catalog: catalog::catalog(),
        }
    }
}

impl<'c> PatternEvaluator<'c> {
    pub fn with_catalog(catalog: &'c [Pattern]) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c [Pattern] {
        self.catalog
    }

    /// Evaluate every pattern for the palace at ring position `target`.
    ///
    /// A pattern that matches in a pass is tagged with that pass's scope and
    /// is not evaluated again. Matches are reported in catalog order.
    pub fn evaluate(
        &self,
        target: usize,
        palaces: &[Palace],
        horoscope: Option<&Horoscope>,
        flags: ScopeFlags,
    ) -> DetectionReport {
        let mut report = DetectionReport {
            palace: target,
            ..DetectionReport::default()
        };

        let Some(palace) = PalaceGraph::new(palaces).by_index(target) else {
            tracing::debug!("Target palace {target} is not in the supplied palace set");
            let reason = Indeterminate::UnknownTarget(target).to_string();
            report.indeterminate = self
                .catalog
                .iter()
                .map(|pattern| IndeterminateOutcome {
                    pattern: pattern.name,
                    scope: Scope::Natal,
                    reason: reason.clone(),
                })
                .collect();
            return report;
        };

        let builder = TemporalContextBuilder::new(horoscope);
        let mut first_found: Vec<Option<Scope>> = vec![None; self.catalog.len()];

        for pass in plan_passes(horoscope, flags) {
            let overlay = (!pass.merged.is_empty()).then(|| builder.build(&pass.merged));
            let ctx = match &overlay {
                Some(overlay) => EvaluationContext::with_overlay(palaces, overlay),
                None => EvaluationContext::natal(palaces),
            };

            let mut found = 0usize;
            for (slot, pattern) in first_found.iter_mut().zip(self.catalog) {
                if slot.is_some() {
                    continue;
                }
                match Verdict::from(pattern.evaluate(&ctx, palace)) {
                    Verdict::Matched => {
                        *slot = Some(pass.scope);
                        found += 1;
                    }
                    Verdict::NotMatched => {}
                    Verdict::Indeterminate(reason) => {
                        tracing::debug!(
                            "{} undecided for palace {target} at {}: {reason}",
                            pattern.name,
                            pass.scope
                        );
                        report.indeterminate.push(IndeterminateOutcome {
                            pattern: pattern.name,
                            scope: pass.scope,
                            reason: reason.to_string(),
                        });
                    }
                }
            }
            tracing::debug!(
                "Palace {target} {} pass merged {:?}: {found} new matches",
                pass.scope,
                pass.merged
            );
        }

        report.matches = first_found
            .into_iter()
            .zip(self.catalog)
            .filter_map(|(scope, pattern)| {
                scope.map(|scope| PatternMatch {
                    name: pattern.name,
                    scope,
                })
            })
            .collect();
        report
    }

    /// Evaluate every palace, in ring order.
    pub fn evaluate_all(
        &self,
        palaces: &[Palace],
        horoscope: Option<&Horoscope>,
        flags: ScopeFlags,
    ) -> Vec<DetectionReport> {
        let mut indices: Vec<usize> = palaces.iter().map(|p| p.index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .map(|index| self.evaluate(index, palaces, horoscope, flags))
            .collect()
    }
}

/// Patterns present for one palace, each tagged with the scope where it first held.
pub fn detect_patterns(
    target: usize,
    palaces: &[Palace],
    horoscope: Option<&Horoscope>,
    flags: ScopeFlags,
) -> Vec<PatternMatch> {
    PatternEvaluator::new()
        .evaluate(target, palaces, horoscope, flags)
        .matches
}

/// Full reports for every palace of a chart.
pub fn detect_chart(
    palaces: &[Palace],
    horoscope: Option<&Horoscope>,
    flags: ScopeFlags,
) -> Vec<DetectionReport> {
    PatternEvaluator::new().evaluate_all(palaces, horoscope, flags)
}
