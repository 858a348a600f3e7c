//! Core data types for charts, palaces, stars, and detection results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::star::StarName;

/// Earthly branch (地支), in the conventional order starting at 子.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    const LABELS: [&'static str; 12] = [
        "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
    ];

    /// Position in the 子-based cycle.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        Self::LABELS[self.ordinal()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| Self::ALL[i])
    }

    /// Branch that owns a palace ring position. Position 0 is 寅.
    pub fn for_palace_index(index: usize) -> Self {
        Self::ALL[(index + 2) % 12]
    }

    /// Palace ring position that owns this branch.
    pub fn palace_index(self) -> usize {
        (self.ordinal() + 10) % 12
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Heavenly stem (天干).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stem {
    Jia,
    Yi,
    Bing,
    Ding,
    Wu,
    Ji,
    Geng,
    Xin,
    Ren,
    Gui,
}

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    const LABELS: [&'static str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| Self::ALL[i])
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four transformations (四化): 禄, 权, 科, 忌.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mutagen {
    Lu,
    Quan,
    Ke,
    Ji,
}

impl Mutagen {
    /// Fixed order that overlay mutagen arrays are aligned to.
    pub const ALL: [Mutagen; 4] = [Mutagen::Lu, Mutagen::Quan, Mutagen::Ke, Mutagen::Ji];

    pub fn label(self) -> &'static str {
        match self {
            Mutagen::Lu => "禄",
            Mutagen::Quan => "权",
            Mutagen::Ke => "科",
            Mutagen::Ji => "忌",
        }
    }

    /// Accepts the bare label or the `化`-prefixed form.
    pub fn from_label(label: &str) -> Option<Self> {
        let bare = label.strip_prefix('化').unwrap_or(label);
        Self::ALL.into_iter().find(|m| m.label() == bare)
    }
}

impl fmt::Display for Mutagen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "化{}", self.label())
    }
}

impl Serialize for Mutagen {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Star brightness grade, brightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Brightness {
    Temple,
    Prosperous,
    Gain,
    Benefit,
    Neutral,
    Weak,
    Trapped,
}

impl Brightness {
    const TABLE: [(Brightness, &'static str); 7] = [
        (Brightness::Temple, "庙"),
        (Brightness::Prosperous, "旺"),
        (Brightness::Gain, "得"),
        (Brightness::Benefit, "利"),
        (Brightness::Neutral, "平"),
        (Brightness::Weak, "不"),
        (Brightness::Trapped, "陷"),
    ];

    pub fn label(self) -> &'static str {
        Self::TABLE[self as usize].1
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(b, _)| *b)
    }

    /// 庙 or 旺.
    pub fn is_bright(self) -> bool {
        self <= Brightness::Prosperous
    }

    /// 不 or 陷.
    pub fn is_dim(self) -> bool {
        self >= Brightness::Weak
    }
}

/// Temporal layer a fact or a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Natal,
    Decadal,
    Yearly,
    Monthly,
}

impl Scope {
    /// Overlay scopes, coarsest first.
    pub const TRANSIENT: [Scope; 3] = [Scope::Decadal, Scope::Yearly, Scope::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Natal => "natal",
            Scope::Decadal => "decadal",
            Scope::Yearly => "yearly",
            Scope::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic role encoded in a palace display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PalaceRole {
    Life,
    Siblings,
    Spouse,
    Children,
    Wealth,
    Health,
    Travel,
    Friends,
    Career,
    Property,
    Fortune,
    Parents,
}

impl PalaceRole {
    /// Roles counted outward from the life palace against the ring direction.
    pub const SEQUENCE: [PalaceRole; 12] = [
        PalaceRole::Life,
        PalaceRole::Siblings,
        PalaceRole::Spouse,
        PalaceRole::Children,
        PalaceRole::Wealth,
        PalaceRole::Health,
        PalaceRole::Travel,
        PalaceRole::Friends,
        PalaceRole::Career,
        PalaceRole::Property,
        PalaceRole::Fortune,
        PalaceRole::Parents,
    ];

    /// One-character abbreviation, e.g. `命`.
    pub fn short(self) -> &'static str {
        match self {
            PalaceRole::Life => "命",
            PalaceRole::Siblings => "兄",
            PalaceRole::Spouse => "夫",
            PalaceRole::Children => "子",
            PalaceRole::Wealth => "财",
            PalaceRole::Health => "疾",
            PalaceRole::Travel => "迁",
            PalaceRole::Friends => "友",
            PalaceRole::Career => "官",
            PalaceRole::Property => "田",
            PalaceRole::Fortune => "福",
            PalaceRole::Parents => "父",
        }
    }

    /// Parse a palace display name such as `命宫`, `财帛` or `仆役`.
    pub fn from_name(name: &str) -> Option<Self> {
        let role = match name.trim_end_matches('宫') {
            "命" => PalaceRole::Life,
            "兄弟" => PalaceRole::Siblings,
            "夫妻" => PalaceRole::Spouse,
            "子女" => PalaceRole::Children,
            "财帛" => PalaceRole::Wealth,
            "疾厄" => PalaceRole::Health,
            "迁移" => PalaceRole::Travel,
            "交友" | "仆役" => PalaceRole::Friends,
            "官禄" => PalaceRole::Career,
            "田宅" => PalaceRole::Property,
            "福德" => PalaceRole::Fortune,
            "父母" => PalaceRole::Parents,
            _ => return None,
        };
        Some(role)
    }
}

/// A star placed in a natal palace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Star {
    pub name: StarName,
    pub brightness: Option<Brightness>,
    pub mutagen: Option<Mutagen>,
}

impl Star {
    pub fn new(name: StarName) -> Self {
        Self {
            name,
            brightness: None,
            mutagen: None,
        }
    }

    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_mutagen(mut self, mutagen: Mutagen) -> Self {
        self.mutagen = Some(mutagen);
        self
    }
}

/// The decade a palace governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecadeSpan {
    pub from_age: u32,
    pub to_age: u32,
    pub stem: Option<Stem>,
    pub branch: Option<Branch>,
}

impl DecadeSpan {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.from_age && age <= self.to_age
    }
}

/// One of the twelve chart sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palace {
    pub index: usize,
    pub branch: Branch,
    pub stem: Option<Stem>,
    pub name: String,
    pub is_body_palace: bool,
    pub major_stars: Vec<Star>,
    pub minor_stars: Vec<Star>,
    pub adjective_stars: Vec<Star>,
    pub decadal: Option<DecadeSpan>,
}

impl Palace {
    /// An empty palace at a ring position, with the branch the position owns.
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            branch: Branch::for_palace_index(index),
            stem: None,
            name: String::new(),
            is_body_palace: false,
            major_stars: Vec::new(),
            minor_stars: Vec::new(),
            adjective_stars: Vec::new(),
            decadal: None,
        }
    }

    /// All natal stars across the three lists.
    pub fn stars(&self) -> impl Iterator<Item = &Star> {
        self.major_stars
            .iter()
            .chain(self.minor_stars.iter())
            .chain(self.adjective_stars.iter())
    }

    pub fn star(&self, name: StarName) -> Option<&Star> {
        self.stars().find(|s| s.name == name)
    }

    pub fn role(&self) -> Option<PalaceRole> {
        PalaceRole::from_name(&self.name)
    }

    pub fn is_on(&self, branches: &[Branch]) -> bool {
        branches.contains(&self.branch)
    }
}

/// A pattern found for a palace and the scope at which it first held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub name: &'static str,
    pub scope: Scope,
}

/// Errors raised while turning an external chart export into the closed model.
#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected 12 palaces, got {0}")]
    PalaceCount(usize),

    #[error("Palace index out of range: {0}")]
    IndexOutOfRange(usize),

    #[error("Duplicate palace index: {0}")]
    DuplicateIndex(usize),

    #[error("Unknown earthly branch label: {0}")]
    UnknownBranch(String),

    #[error("Unknown heavenly stem label: {0}")]
    UnknownStem(String),

    #[error("Palace {index} sits on {found}, expected {expected}")]
    BranchMismatch {
        index: usize,
        expected: Branch,
        found: Branch,
    },
}

/// Convenience result type.
pub type ChartResult<T> = Result<T, ChartError>;

/// Positional relation a rule depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    PreviousNeighbour,
    NextNeighbour,
    Opposite,
    HiddenCombination,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::PreviousNeighbour => "previous neighbour",
            Relation::NextNeighbour => "next neighbour",
            Relation::Opposite => "opposite",
            Relation::HiddenCombination => "hidden-combination partner",
        })
    }
}

/// A rule could not be decided for a palace.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Indeterminate {
    #[error("palace {index} has no {relation} in the supplied palace set")]
    MissingRelation { index: usize, relation: Relation },

    #[error("palace {0} is not part of the supplied palace set")]
    UnknownTarget(usize),
}
