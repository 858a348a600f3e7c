//! Chart ingestion: the upstream astrolabe JSON export into the closed model.
//!
//! Text labels stop here. Branch and stem labels must resolve, since the ring
//! depends on them. Star labels that do not resolve are skipped so a newer
//! upstream vocabulary never blocks detection.

use std::path::Path;

use serde::Deserialize;

use crate::context::{four_transformations, Horoscope, ScopeFlags, ScopeOverlay};
use crate::evaluator::{DetectionReport, PatternEvaluator};
use crate::graph::{PalaceGraph, PALACE_COUNT};
use crate::star::StarName;
use crate::types::{
    Branch, Brightness, ChartError, ChartResult, DecadeSpan, Mutagen, Palace, Star, Stem,
};

/// Chart export as produced upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChart {
    pub palaces: Vec<RawPalace>,
    #[serde(default)]
    pub horoscope: Option<RawHoroscope>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPalace {
    pub index: usize,
    pub earthly_branch: String,
    #[serde(default)]
    pub heavenly_stem: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_body_palace: bool,
    #[serde(default)]
    pub major_stars: Vec<RawStar>,
    #[serde(default)]
    pub minor_stars: Vec<RawStar>,
    #[serde(default)]
    pub adjective_stars: Vec<RawStar>,
    #[serde(default)]
    pub decadal: Option<RawDecade>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStar {
    pub name: String,
    #[serde(default)]
    pub brightness: Option<String>,
    #[serde(default)]
    pub mutagen: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecade {
    pub range: [u32; 2],
    #[serde(default)]
    pub heavenly_stem: Option<String>,
    #[serde(default)]
    pub earthly_branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHoroscope {
    #[serde(default)]
    pub decadal: Option<RawScope>,
    #[serde(default)]
    pub yearly: Option<RawScope>,
    #[serde(default)]
    pub monthly: Option<RawScope>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScope {
    #[serde(default)]
    pub stars: Vec<Vec<RawStar>>,
    #[serde(default)]
    pub mutagen: Vec<String>,
    #[serde(default)]
    pub heavenly_stem: Option<String>,
    #[serde(default)]
    pub palace_names: Vec<String>,
}

/// A validated chart: twelve palaces in ring order plus any overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub palaces: Vec<Palace>,
    pub horoscope: Option<Horoscope>,
}

impl Chart {
    pub fn from_raw(raw: RawChart) -> ChartResult<Self> {
        if raw.palaces.len() != PALACE_COUNT {
            return Err(ChartError::PalaceCount(raw.palaces.len()));
        }

        let mut slots: Vec<Option<Palace>> = vec![None; PALACE_COUNT];
        for raw_palace in raw.palaces {
            let palace = convert_palace(raw_palace)?;
            let index = palace.index;
            if slots[index].is_some() {
                return Err(ChartError::DuplicateIndex(index));
            }
            slots[index] = Some(palace);
        }
        // Twelve distinct in-range indices fill every slot.
        let palaces: Vec<Palace> = slots.into_iter().flatten().collect();

        let horoscope = raw.horoscope.map(convert_horoscope).transpose()?;
        tracing::debug!(
            "Loaded chart: {} palaces, horoscope {}",
            palaces.len(),
            if horoscope.is_some() { "present" } else { "absent" }
        );
        Ok(Self { palaces, horoscope })
    }

    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        let raw: RawChart = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_file(path: &Path) -> ChartResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn graph(&self) -> PalaceGraph<'_> {
        PalaceGraph::new(&self.palaces)
    }

    /// Replace the overlays, e.g. with ones loaded from a separate file.
    pub fn with_horoscope(mut self, horoscope: Horoscope) -> Self {
        self.horoscope = Some(horoscope);
        self
    }

    pub fn detect(&self, target: usize, flags: ScopeFlags) -> DetectionReport {
        PatternEvaluator::new().evaluate(target, &self.palaces, self.horoscope.as_ref(), flags)
    }

    pub fn detect_all(&self, flags: ScopeFlags) -> Vec<DetectionReport> {
        PatternEvaluator::new().evaluate_all(&self.palaces, self.horoscope.as_ref(), flags)
    }
}

/// Parse a standalone horoscope payload.
pub fn parse_horoscope(json: &str) -> ChartResult<Horoscope> {
    let raw: RawHoroscope = serde_json::from_str(json)?;
    convert_horoscope(raw)
}

pub fn load_horoscope(path: &Path) -> ChartResult<Horoscope> {
    let text = std::fs::read_to_string(path)?;
    parse_horoscope(&text)
}

fn parse_stem(label: Option<&str>) -> ChartResult<Option<Stem>> {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(None),
        Some(label) => Stem::from_label(label)
            .map(Some)
            .ok_or_else(|| ChartError::UnknownStem(label.to_string())),
    }
}

fn parse_branch(label: &str) -> ChartResult<Branch> {
    Branch::from_label(label.trim()).ok_or_else(|| ChartError::UnknownBranch(label.to_string()))
}

fn convert_palace(raw: RawPalace) -> ChartResult<Palace> {
    if raw.index >= PALACE_COUNT {
        return Err(ChartError::IndexOutOfRange(raw.index));
    }
    let branch = parse_branch(&raw.earthly_branch)?;
    let expected = Branch::for_palace_index(raw.index);
    if branch != expected {
        return Err(ChartError::BranchMismatch {
            index: raw.index,
            expected,
            found: branch,
        });
    }

    let decadal = match raw.decadal {
        Some(decade) => Some(DecadeSpan {
            from_age: decade.range[0],
            to_age: decade.range[1],
            stem: parse_stem(decade.heavenly_stem.as_deref())?,
            branch: decade
                .earthly_branch
                .as_deref()
                .filter(|l| !l.is_empty())
                .map(parse_branch)
                .transpose()?,
        }),
        None => None,
    };

    Ok(Palace {
        index: raw.index,
        branch,
        stem: parse_stem(raw.heavenly_stem.as_deref())?,
        name: raw.name,
        is_body_palace: raw.is_body_palace,
        major_stars: convert_stars(raw.major_stars, raw.index),
        minor_stars: convert_stars(raw.minor_stars, raw.index),
        adjective_stars: convert_stars(raw.adjective_stars, raw.index),
        decadal,
    })
}

fn convert_stars(raw: Vec<RawStar>, index: usize) -> Vec<Star> {
    raw.into_iter()
        .filter_map(|star| {
            let Some(name) = StarName::from_label(&star.name) else {
                tracing::debug!("Skipping unknown star {:?} in palace {index}", star.name);
                return None;
            };
            Some(Star {
                name,
                brightness: star.brightness.as_deref().and_then(Brightness::from_label),
                mutagen: star.mutagen.as_deref().and_then(Mutagen::from_label),
            })
        })
        .collect()
}

fn convert_horoscope(raw: RawHoroscope) -> ChartResult<Horoscope> {
    Ok(Horoscope {
        decadal: raw.decadal.map(convert_scope).transpose()?,
        yearly: raw.yearly.map(convert_scope).transpose()?,
        monthly: raw.monthly.map(convert_scope).transpose()?,
    })
}

fn convert_scope(raw: RawScope) -> ChartResult<ScopeOverlay> {
    let stem = parse_stem(raw.heavenly_stem.as_deref())?;

    let stars = raw
        .stars
        .into_iter()
        .enumerate()
        .map(|(index, list)| {
            list.into_iter()
                .filter_map(|star| {
                    let name = StarName::from_transient_label(&star.name);
                    if name.is_none() {
                        tracing::debug!(
                            "Skipping unknown transient star {:?} at palace {index}",
                            star.name
                        );
                    }
                    name
                })
                .collect()
        })
        .collect();

    let mut mutagen = [None; 4];
    if raw.mutagen.is_empty() {
        if let Some(stem) = stem {
            mutagen = four_transformations(stem).map(Some);
        }
    } else {
        for (slot, label) in mutagen.iter_mut().zip(&raw.mutagen) {
            *slot = StarName::from_label(label);
            if slot.is_none() && !label.is_empty() {
                tracing::debug!("Skipping unknown mutagen star {label:?}");
            }
        }
    }

    Ok(ScopeOverlay {
        stem,
        stars,
        mutagen,
        palace_names: raw.palace_names,
    })
}
