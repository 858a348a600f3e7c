//! Temporal overlays and the evaluation context rules read facts through.
//!
//! Natal palaces are never modified. A [`TemporalContext`] is a separate,
//! merged view of the transient stars and mutagens of one or more overlay
//! scopes; an [`EvaluationContext`] pairs the natal palaces with at most one
//! such overlay and answers the fact queries the pattern rules ask.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::PalaceGraph;
use crate::star::StarName;
use crate::types::{Indeterminate, Mutagen, Palace, Relation, Scope, Stem};

/// Which overlays the caller wants considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFlags {
    #[serde(default)]
    pub decadal: bool,
    #[serde(default)]
    pub yearly: bool,
    #[serde(default)]
    pub monthly: bool,
}

impl ScopeFlags {
    pub fn all() -> Self {
        Self {
            decadal: true,
            yearly: true,
            monthly: true,
        }
    }

    /// Natal is always active.
    pub fn is_active(&self, scope: Scope) -> bool {
        match scope {
            Scope::Natal => true,
            Scope::Decadal => self.decadal,
            Scope::Yearly => self.yearly,
            Scope::Monthly => self.monthly,
        }
    }
}

/// Overlay data for one transient scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeOverlay {
    pub stem: Option<Stem>,
    /// Transient stars per palace ring position.
    pub stars: Vec<Vec<StarName>>,
    /// Stars carrying 禄, 权, 科, 忌 in that order.
    pub mutagen: [Option<StarName>; 4],
    /// Palace names at this scope, per ring position.
    pub palace_names: Vec<String>,
}

impl ScopeOverlay {
    /// Label this scope gives a star, if any.
    pub fn mutagen_of(&self, star: StarName) -> Option<Mutagen> {
        self.mutagen
            .iter()
            .position(|s| *s == Some(star))
            .map(|i| Mutagen::ALL[i])
    }

    pub fn star_for(&self, mutagen: Mutagen) -> Option<StarName> {
        self.mutagen[mutagen as usize]
    }
}

/// Decade, year, and month overlays as produced by the horoscope collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Horoscope {
    pub decadal: Option<ScopeOverlay>,
    pub yearly: Option<ScopeOverlay>,
    pub monthly: Option<ScopeOverlay>,
}

impl Horoscope {
    pub fn scope(&self, scope: Scope) -> Option<&ScopeOverlay> {
        match scope {
            Scope::Natal => None,
            Scope::Decadal => self.decadal.as_ref(),
            Scope::Yearly => self.yearly.as_ref(),
            Scope::Monthly => self.monthly.as_ref(),
        }
    }

    pub fn has(&self, scope: Scope) -> bool {
        self.scope(scope).is_some()
    }
}

/// Stars a stem transforms into 禄, 权, 科, 忌 (十干四化).
pub fn four_transformations(stem: Stem) -> [StarName; 4] {
    use StarName::*;
    match stem {
        Stem::Jia => [LianZhen, PoJun, WuQu, TaiYang],
        Stem::Yi => [TianJi, TianLiang, ZiWei, TaiYin],
        Stem::Bing => [TianTong, TianJi, WenChang, LianZhen],
        Stem::Ding => [TaiYin, TianTong, TianJi, JuMen],
        Stem::Wu => [TanLang, TaiYin, YouBi, TianJi],
        Stem::Ji => [WuQu, TanLang, TianLiang, WenQu],
        Stem::Geng => [TaiYang, WuQu, TaiYin, TianTong],
        Stem::Xin => [JuMen, TaiYang, WenQu, WenChang],
        Stem::Ren => [TianLiang, ZiWei, ZuoFu, WuQu],
        Stem::Gui => [PoJun, JuMen, TaiYin, TanLang],
    }
}

/// Merged transient facts for a set of overlay scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalContext {
    pub flow_stars: BTreeMap<usize, Vec<StarName>>,
    pub transient_mutagens: BTreeMap<StarName, BTreeSet<Mutagen>>,
    /// Scopes that contributed data, in merge order.
    pub scopes: Vec<Scope>,
}

impl TemporalContext {
    pub fn flow_stars_at(&self, index: usize) -> &[StarName] {
        self.flow_stars.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_tagged(&self, star: StarName, mutagen: Mutagen) -> bool {
        self.transient_mutagens
            .get(&star)
            .is_some_and(|labels| labels.contains(&mutagen))
    }

    pub fn is_empty(&self) -> bool {
        self.flow_stars.is_empty() && self.transient_mutagens.is_empty()
    }
}

/// Builds [`TemporalContext`] values from a horoscope payload.
#[derive(Debug, Clone, Copy)]
pub struct TemporalContextBuilder<'a> {
    horoscope: Option<&'a Horoscope>,
}

impl<'a> TemporalContextBuilder<'a> {
    pub fn new(horoscope: Option<&'a Horoscope>) -> Self {
        Self { horoscope }
    }

    /// Merge the requested scopes. Scopes without data are ignored, and the
    /// result is empty (never absent) when nothing contributes.
    pub fn build(&self, scopes: &[Scope]) -> TemporalContext {
        let mut ctx = TemporalContext::default();
        let Some(horoscope) = self.horoscope else {
            return ctx;
        };

        for &scope in scopes {
            let Some(overlay) = horoscope.scope(scope) else {
                continue;
            };
            ctx.scopes.push(scope);

            for (index, stars) in overlay.stars.iter().enumerate() {
                if stars.is_empty() {
                    continue;
                }
                let slot = ctx.flow_stars.entry(index).or_default();
                for star in stars {
                    if !slot.contains(star) {
                        slot.push(*star);
                    }
                }
            }

            for (i, star) in overlay.mutagen.iter().enumerate() {
                if let Some(star) = star {
                    ctx.transient_mutagens
                        .entry(*star)
                        .or_default()
                        .insert(Mutagen::ALL[i]);
                }
            }
        }

        tracing::trace!(
            "Built temporal context from {:?}: {} palaces with flow stars, {} transformed stars",
            ctx.scopes,
            ctx.flow_stars.len(),
            ctx.transient_mutagens.len()
        );
        ctx
    }

    /// Label stack `[natal, decadal, yearly, monthly]` for one star.
    pub fn mutagen_stack(
        &self,
        star: StarName,
        natal: Option<Mutagen>,
        flags: ScopeFlags,
    ) -> [Option<Mutagen>; 4] {
        let mut stack = [natal, None, None, None];
        if let Some(horoscope) = self.horoscope {
            for (slot, scope) in Scope::TRANSIENT.into_iter().enumerate() {
                if !flags.is_active(scope) {
                    continue;
                }
                stack[slot + 1] = horoscope
                    .scope(scope)
                    .and_then(|overlay| overlay.mutagen_of(star));
            }
        }
        stack
    }

    /// Ring position of the life palace at the deepest active scope that names
    /// its palaces, falling back to the natal life palace.
    pub fn locate_life_palace(&self, palaces: &[Palace], flags: ScopeFlags) -> Option<usize> {
        if let Some(horoscope) = self.horoscope {
            for scope in Scope::TRANSIENT.into_iter().rev() {
                if !flags.is_active(scope) {
                    continue;
                }
                let found = horoscope.scope(scope).and_then(|overlay| {
                    overlay
                        .palace_names
                        .iter()
                        .position(|name| name == "命宫" || name == "命")
                });
                if found.is_some() {
                    return found;
                }
            }
        }
        PalaceGraph::new(palaces).life_palace().map(|p| p.index)
    }
}

/// One leg of a palace's 飞化: the star its stem transforms and where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlyingMutagen {
    pub mutagen: Mutagen,
    pub star: StarName,
    /// Ring position holding the star natally, if it is placed.
    pub target: Option<usize>,
}

/// Where a palace's stem sends its four transformations.
pub fn flying_mutagens(palace: &Palace, palaces: &[Palace]) -> Vec<FlyingMutagen> {
    let Some(stem) = palace.stem else {
        return Vec::new();
    };
    four_transformations(stem)
        .into_iter()
        .zip(Mutagen::ALL)
        .map(|(star, mutagen)| FlyingMutagen {
            mutagen,
            star,
            target: palaces
                .iter()
                .find(|p| p.star(star).is_some())
                .map(|p| p.index),
        })
        .collect()
}

/// Natal palaces plus an optional overlay: everything a rule may consult.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    graph: PalaceGraph<'a>,
    overlay: Option<&'a TemporalContext>,
}

impl<'a> EvaluationContext<'a> {
    /// Natal-only context.
    pub fn natal(palaces: &'a [Palace]) -> Self {
        Self {
            graph: PalaceGraph::new(palaces),
            overlay: None,
        }
    }

    pub fn with_overlay(palaces: &'a [Palace], overlay: &'a TemporalContext) -> Self {
        Self {
            graph: PalaceGraph::new(palaces),
            overlay: Some(overlay),
        }
    }

    pub fn graph(&self) -> &PalaceGraph<'a> {
        &self.graph
    }

    pub fn overlay(&self) -> Option<&'a TemporalContext> {
        self.overlay
    }

    fn flow_stars(&self, palace: &Palace) -> &'a [StarName] {
        self.overlay
            .map(|o| o.flow_stars_at(palace.index))
            .unwrap_or(&[])
    }

    /// Star present natally, or as a transient visitor under the overlay.
    pub fn has_star<'p>(&self, palace: impl Into<Option<&'p Palace>>, star: StarName) -> bool {
        let Some(palace) = palace.into() else {
            return false;
        };
        palace.star(star).is_some() || self.flow_stars(palace).contains(&star)
    }

    /// Some star in the palace carries the label natally, or any natal or
    /// transient star in it is tagged with the label by the overlay.
    pub fn has_mutagen<'p>(&self, palace: impl Into<Option<&'p Palace>>, mutagen: Mutagen) -> bool {
        let Some(palace) = palace.into() else {
            return false;
        };
        if palace.stars().any(|s| s.mutagen == Some(mutagen)) {
            return true;
        }
        let Some(overlay) = self.overlay else {
            return false;
        };
        palace
            .stars()
            .map(|s| s.name)
            .chain(self.flow_stars(palace).iter().copied())
            .any(|star| overlay.is_tagged(star, mutagen))
    }

    /// Natal malefic present. Overlays are not consulted.
    pub fn has_malefic<'p>(&self, palace: impl Into<Option<&'p Palace>>) -> bool {
        palace
            .into()
            .is_some_and(|p| p.stars().any(|s| s.name.is_malefic()))
    }

    /// No natal major star (命无正曜).
    pub fn is_empty_palace(&self, palace: &Palace) -> bool {
        !palace.stars().any(|s| s.name.is_major())
    }

    pub fn require_flank(&self, palace: &Palace) -> Result<(&'a Palace, &'a Palace), Indeterminate> {
        let (prev, next) = self.graph.flank(palace);
        let prev = prev.ok_or(Indeterminate::MissingRelation {
            index: palace.index,
            relation: Relation::PreviousNeighbour,
        })?;
        let next = next.ok_or(Indeterminate::MissingRelation {
            index: palace.index,
            relation: Relation::NextNeighbour,
        })?;
        Ok((prev, next))
    }

    pub fn require_opposite(&self, palace: &Palace) -> Result<&'a Palace, Indeterminate> {
        self.graph
            .opposite(palace)
            .ok_or(Indeterminate::MissingRelation {
                index: palace.index,
                relation: Relation::Opposite,
            })
    }

    pub fn require_hidden_combination(&self, palace: &Palace) -> Result<&'a Palace, Indeterminate> {
        self.graph
            .hidden_combination(palace)
            .ok_or(Indeterminate::MissingRelation {
                index: palace.index,
                relation: Relation::HiddenCombination,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Star;

    fn ring() -> Vec<Palace> {
        (0..12).map(Palace::empty).collect()
    }

    fn overlay(stars: &[(usize, StarName)], mutagen: [Option<StarName>; 4]) -> ScopeOverlay {
        let mut per_palace = vec![Vec::new(); 12];
        for (index, star) in stars {
            per_palace[*index].push(*star);
        }
        ScopeOverlay {
            stars: per_palace,
            mutagen,
            ..ScopeOverlay::default()
        }
    }

    #[test]
    fn test_build_without_horoscope_is_empty() {
        let ctx = TemporalContextBuilder::new(None).build(&Scope::TRANSIENT);
        assert!(ctx.is_empty());
        assert!(ctx.scopes.is_empty());
    }

    #[test]
    fn test_build_merges_as_union() {
        let horoscope = Horoscope {
            decadal: Some(overlay(
                &[(2, StarName::QingYang)],
                [Some(StarName::TaiYang), None, None, None],
            )),
            yearly: Some(overlay(
                &[(2, StarName::QingYang), (2, StarName::TianMa)],
                [None, None, None, Some(StarName::TaiYang)],
            )),
            monthly: None,
        };
        let builder = TemporalContextBuilder::new(Some(&horoscope));
        let ctx = builder.build(&[Scope::Decadal, Scope::Yearly, Scope::Monthly]);
        assert_eq!(ctx.scopes, vec![Scope::Decadal, Scope::Yearly]);
        assert_eq!(
            ctx.flow_stars_at(2),
            &[StarName::QingYang, StarName::TianMa]
        );
        assert!(ctx.is_tagged(StarName::TaiYang, Mutagen::Lu));
        assert!(ctx.is_tagged(StarName::TaiYang, Mutagen::Ji));

        let reversed = builder.build(&[Scope::Yearly, Scope::Decadal]);
        assert_eq!(reversed.transient_mutagens, ctx.transient_mutagens);
    }

    #[test]
    fn test_build_does_not_touch_payload() {
        let horoscope = Horoscope {
            decadal: Some(overlay(&[(0, StarName::WenChang)], [None; 4])),
            ..Horoscope::default()
        };
        let before = horoscope.clone();
        let _ = TemporalContextBuilder::new(Some(&horoscope)).build(&[Scope::Decadal]);
        assert_eq!(horoscope, before);
    }

    #[test]
    fn test_four_transformations() {
        assert_eq!(
            four_transformations(Stem::Jia),
            [StarName::LianZhen, StarName::PoJun, StarName::WuQu, StarName::TaiYang]
        );
        assert_eq!(four_transformations(Stem::Ren)[2], StarName::ZuoFu);
    }

    #[test]
    fn test_mutagen_stack_respects_flags() {
        let horoscope = Horoscope {
            decadal: Some(overlay(&[], [Some(StarName::TianJi), None, None, None])),
            yearly: Some(overlay(&[], [None, None, Some(StarName::TianJi), None])),
            monthly: None,
        };
        let builder = TemporalContextBuilder::new(Some(&horoscope));
        let flags = ScopeFlags {
            decadal: true,
            yearly: false,
            monthly: false,
        };
        let stack = builder.mutagen_stack(StarName::TianJi, Some(Mutagen::Quan), flags);
        assert_eq!(stack, [Some(Mutagen::Quan), Some(Mutagen::Lu), None, None]);

        let stack = builder.mutagen_stack(StarName::TianJi, None, ScopeFlags::all());
        assert_eq!(stack, [None, Some(Mutagen::Lu), Some(Mutagen::Ke), None]);
    }

    #[test]
    fn test_locate_life_palace_prefers_deepest_scope() {
        let mut palaces = ring();
        palaces[3].name = "命宫".to_string();
        let mut decadal_names = vec![String::new(); 12];
        decadal_names[6] = "命宫".to_string();
        let horoscope = Horoscope {
            decadal: Some(ScopeOverlay {
                palace_names: decadal_names,
                ..ScopeOverlay::default()
            }),
            ..Horoscope::default()
        };
        let builder = TemporalContextBuilder::new(Some(&horoscope));
        assert_eq!(builder.locate_life_palace(&palaces, ScopeFlags::all()), Some(6));
        assert_eq!(
            builder.locate_life_palace(&palaces, ScopeFlags::default()),
            Some(3)
        );
    }

    #[test]
    fn test_flying_mutagens() {
        let mut palaces = ring();
        palaces[0].stem = Some(Stem::Jia);
        palaces[5].major_stars.push(Star::new(StarName::LianZhen));
        let legs = flying_mutagens(&palaces[0], &palaces);
        assert_eq!(legs.len(), 4);
        assert_eq!(legs[0].star, StarName::LianZhen);
        assert_eq!(legs[0].target, Some(5));
        assert_eq!(legs[3].mutagen, Mutagen::Ji);
        assert_eq!(legs[3].target, None);
    }

    #[test]
    fn test_flying_mutagen_serializes_labels() {
        let mut palaces = ring();
        palaces[0].stem = Some(Stem::Jia);
        palaces[5].major_stars.push(Star::new(StarName::LianZhen));
        let legs = flying_mutagens(&palaces[0], &palaces);
        let json = serde_json::to_value(legs[0]).unwrap();
        assert_eq!(json["mutagen"], "禄");
        assert_eq!(json["star"], "廉贞");
        assert_eq!(json["target"], 5);
        assert_eq!(serde_json::to_string(&Mutagen::Ji).unwrap(), "\"忌\"");
    }

    #[test]
    fn test_has_star_and_mutagen_with_overlay() {
        let mut palaces = ring();
        palaces[1].major_stars.push(Star::new(StarName::WuQu));
        let horoscope = Horoscope {
            decadal: Some(overlay(
                &[(1, StarName::TuoLuo)],
                [Some(StarName::WuQu), None, None, Some(StarName::TuoLuo)],
            )),
            ..Horoscope::default()
        };
        let temporal = TemporalContextBuilder::new(Some(&horoscope)).build(&[Scope::Decadal]);

        let natal = EvaluationContext::natal(&palaces);
        assert!(!natal.has_star(&palaces[1], StarName::TuoLuo));
        assert!(!natal.has_mutagen(&palaces[1], Mutagen::Lu));

        let ctx = EvaluationContext::with_overlay(&palaces, &temporal);
        assert!(ctx.has_star(&palaces[1], StarName::TuoLuo));
        assert!(ctx.has_mutagen(&palaces[1], Mutagen::Lu));
        assert!(ctx.has_mutagen(&palaces[1], Mutagen::Ji));
        assert!(!ctx.has_malefic(&palaces[1]));
        assert!(!ctx.has_star(None::<&Palace>, StarName::WuQu));
    }
}
