//! Positional algebra over the twelve-palace ring.
//!
//! Every lookup answers `None` (or drops the entry) when the related palace is
//! not present in the supplied slice; callers treat that as "relation absent".

use crate::types::{Branch, Palace, PalaceRole};

/// Ring size.
pub const PALACE_COUNT: usize = 12;

/// Hidden-combination (暗合) partner of every branch. The pairing is an involution.
const HIDDEN_COMBINATION: [(Branch, Branch); 12] = [
    (Branch::Zi, Branch::Si),
    (Branch::Chou, Branch::Yin),
    (Branch::Yin, Branch::Chou),
    (Branch::Mao, Branch::Shen),
    (Branch::Chen, Branch::You),
    (Branch::Si, Branch::Zi),
    (Branch::Wu, Branch::Hai),
    (Branch::Wei, Branch::Xu),
    (Branch::Shen, Branch::Mao),
    (Branch::You, Branch::Chen),
    (Branch::Xu, Branch::Wei),
    (Branch::Hai, Branch::Wu),
];

/// Hidden-combination partner of a branch.
pub fn hidden_partner(branch: Branch) -> Branch {
    HIDDEN_COMBINATION
        .iter()
        .find(|(b, _)| *b == branch)
        .map(|(_, partner)| *partner)
        .unwrap_or(branch)
}

/// Read-only view over a palace slice.
#[derive(Debug, Clone, Copy)]
pub struct PalaceGraph<'a> {
    palaces: &'a [Palace],
}

impl<'a> PalaceGraph<'a> {
    pub fn new(palaces: &'a [Palace]) -> Self {
        Self { palaces }
    }

    pub fn palaces(&self) -> &'a [Palace] {
        self.palaces
    }

    /// True when every ring position is present exactly once.
    pub fn is_complete(&self) -> bool {
        self.palaces.len() == PALACE_COUNT
            && (0..PALACE_COUNT).all(|i| self.palaces.iter().filter(|p| p.index == i).count() == 1)
    }

    pub fn by_index(&self, index: usize) -> Option<&'a Palace> {
        self.palaces.iter().find(|p| p.index == index)
    }

    pub fn by_branch(&self, branch: Branch) -> Option<&'a Palace> {
        self.palaces.iter().find(|p| p.branch == branch)
    }

    fn step(&self, palace: &Palace, offset: usize) -> Option<&'a Palace> {
        self.by_index((palace.index + offset) % PALACE_COUNT)
    }

    /// Neighbours `(i-1, i+1)`.
    pub fn flank(&self, palace: &Palace) -> (Option<&'a Palace>, Option<&'a Palace>) {
        (
            self.step(palace, PALACE_COUNT - 1),
            self.step(palace, 1),
        )
    }

    /// Palace at `i+6`.
    pub fn opposite(&self, palace: &Palace) -> Option<&'a Palace> {
        self.step(palace, 6)
    }

    /// Trine partners at `i+4` and `i+8`.
    pub fn triangle(&self, palace: &Palace) -> Vec<&'a Palace> {
        [self.step(palace, 4), self.step(palace, 8)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// The 三方四正 window: the palace itself, its trine partners, and its opposite.
    pub fn sanfang(&self, palace: &Palace) -> Vec<&'a Palace> {
        [
            self.by_index(palace.index),
            self.step(palace, 4),
            self.step(palace, 8),
            self.step(palace, 6),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Palace owning the hidden-combination partner branch.
    pub fn hidden_combination(&self, palace: &Palace) -> Option<&'a Palace> {
        self.by_branch(hidden_partner(palace.branch))
    }

    /// Role of `to` when `from` is read as the life palace (宫中宫).
    pub fn relative_role(&self, from: &Palace, to: &Palace) -> PalaceRole {
        let offset =
            (from.branch.ordinal() + PALACE_COUNT - to.branch.ordinal()) % PALACE_COUNT;
        PalaceRole::SEQUENCE[offset]
    }

    /// Derived name of `to` as seen from `from`, e.g. `命之财`.
    pub fn relative_name(&self, from: &Palace, to: &Palace) -> String {
        let base: String = match from.role() {
            Some(role) => role.short().to_string(),
            None => from.name.chars().take(1).collect(),
        };
        format!("{base}之{}", self.relative_role(from, to).short())
    }

    pub fn life_palace(&self) -> Option<&'a Palace> {
        self.palaces
            .iter()
            .find(|p| p.role() == Some(PalaceRole::Life))
    }

    pub fn body_palace(&self) -> Option<&'a Palace> {
        self.palaces.iter().find(|p| p.is_body_palace)
    }
}
