//! Patterns too irregular to express as a plain [`Rule`](super::Rule) shape.

use crate::context::EvaluationContext;
use crate::star::StarName::{self, *};
use crate::types::{Branch, Brightness, Indeterminate, Mutagen, Palace, PalaceRole};

use super::{converge, Fact};

type Outcome = Result<bool, Indeterminate>;

fn any_lu(ctx: &EvaluationContext<'_>, palace: &Palace) -> bool {
    Fact::AnyLu.holds(ctx, palace)
}

fn flanked_by(ctx: &EvaluationContext<'_>, palace: &Palace, a: Fact, b: Fact) -> Outcome {
    let (prev, next) = ctx.require_flank(palace)?;
    Ok((a.holds(ctx, prev) && b.holds(ctx, next)) || (b.holds(ctx, prev) && a.holds(ctx, next)))
}

fn is_bright(palace: &Palace, star: StarName) -> bool {
    palace
        .star(star)
        .and_then(|s| s.brightness)
        .is_some_and(Brightness::is_bright)
}

fn in_window_on(
    ctx: &EvaluationContext<'_>,
    palace: &Palace,
    star: StarName,
    branches: &[Branch],
) -> bool {
    ctx.graph()
        .sanfang(palace)
        .iter()
        .any(|p| p.is_on(branches) && ctx.has_star(*p, star))
}

pub(super) fn wen_liang_zhen_ji(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, TianLiang) && (ctx.has_star(p, WenChang) || ctx.has_star(p, WenQu)))
}

/// 紫微 in 午 without a natal malefic beside it.
pub(super) fn ji_xiang_li_ming(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(p.branch == Branch::Wu && ctx.has_star(p, ZiWei) && !ctx.has_malefic(p))
}

pub(super) fn shi_zhong_yin_yu(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(p.is_on(&[Branch::Zi, Branch::Wu])
        && ctx.has_star(p, JuMen)
        && !ctx.has_mutagen(p, Mutagen::Ji))
}

pub(super) fn xiong_su_chao_yuan(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(p.is_on(&[Branch::Yin, Branch::Shen]) && ctx.has_star(p, LianZhen) && !ctx.has_malefic(p))
}

/// 天相 flanked by 天梁 and a 禄.
pub(super) fn cai_yin_jia_yin(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !ctx.has_star(p, TianXiang) {
        return Ok(false);
    }
    flanked_by(ctx, p, Fact::Has(TianLiang), Fact::AnyLu)
}

/// 天相 flanked by 擎羊 and a 化忌.
pub(super) fn xing_ji_jia_yin(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !ctx.has_star(p, TianXiang) {
        return Ok(false);
    }
    flanked_by(ctx, p, Fact::Has(QingYang), Fact::Transformed(Mutagen::Ji))
}

pub(super) fn yang_tuo_jia_ji(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !ctx.has_mutagen(p, Mutagen::Ji) {
        return Ok(false);
    }
    flanked_by(ctx, p, Fact::Has(QingYang), Fact::Has(TuoLuo))
}

/// 紫微 with 左辅 and 右弼 each on some neighbour.
pub(super) fn zi_wei_fu_bi(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !ctx.has_star(p, ZiWei) {
        return Ok(false);
    }
    let (prev, next) = ctx.require_flank(p)?;
    let left = ctx.has_star(prev, ZuoFu) || ctx.has_star(next, ZuoFu);
    let right = ctx.has_star(prev, YouBi) || ctx.has_star(next, YouBi);
    Ok(left && right)
}

pub(super) fn jun_chen_qing_hui(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, ZiWei) && converge(ctx, p, &[Fact::Has(ZuoFu), Fact::Has(YouBi)]))
}

pub(super) fn fu_bi_gong_zhu(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, ZiWei)
        && (converge(ctx, p, &[Fact::Has(ZuoFu)]) || converge(ctx, p, &[Fact::Has(YouBi)])))
}

/// One of 七杀, 破军, 贪狼 in the palace with all three across the window.
pub(super) fn sha_po_lang(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    let trio = [QiSha, PoJun, TanLang];
    Ok(trio.iter().any(|s| ctx.has_star(p, *s))
        && converge(ctx, p, &[Fact::Has(QiSha), Fact::Has(PoJun), Fact::Has(TanLang)]))
}

/// 禄存 and 化禄 both in the window, in different palaces.
pub(super) fn shuang_lu_chao_yuan(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    let window = ctx.graph().sanfang(p);
    Ok(window.iter().any(|a| {
        ctx.has_star(*a, LuCun)
            && window
                .iter()
                .any(|b| b.index != a.index && ctx.has_mutagen(*b, Mutagen::Lu))
    }))
}

pub(super) fn lu_wen_gong_ming(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(any_lu(ctx, p)
        && (converge(ctx, p, &[Fact::Has(WenChang)]) || converge(ctx, p, &[Fact::Has(WenQu)])))
}

/// Bright 太阳 and bright 太阴 both in the window. Brightness is natal only.
pub(super) fn ri_yue_bing_ming(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    let window = ctx.graph().sanfang(p);
    Ok(window.iter().any(|w| is_bright(w, TaiYang)) && window.iter().any(|w| is_bright(w, TaiYin)))
}

/// 太阳 on the night side and 太阴 on the day side of the ring.
pub(super) fn ri_yue_fan_bei(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(in_window_on(ctx, p, TaiYang, &[Branch::Xu, Branch::Hai, Branch::Zi])
        && in_window_on(ctx, p, TaiYin, &[Branch::Chen, Branch::Si, Branch::Wu]))
}

pub(super) fn ling_chang_tuo_wu(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, WuQu)
        && converge(
            ctx,
            p,
            &[Fact::Has(LingXing), Fact::Has(WenChang), Fact::Has(TuoLuo)],
        ))
}

pub(super) fn ju_huo_qing_yang(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, JuMen) && converge(ctx, p, &[Fact::Has(HuoXing), Fact::Has(QingYang)]))
}

/// A 禄 and 天马 together, or facing each other across the ring.
pub(super) fn lu_ma_jiao_chi(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    let lu = any_lu(ctx, p);
    let ma = ctx.has_star(p, TianMa);
    if lu && ma {
        return Ok(true);
    }
    if !lu && !ma {
        return Ok(false);
    }
    let opposite = ctx.require_opposite(p)?;
    Ok((lu && ctx.has_star(opposite, TianMa)) || (ma && any_lu(ctx, opposite)))
}

/// Empty 丑/未 palace facing 太阳 and 太阴 together.
pub(super) fn ri_yue_zhao_bi(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !p.is_on(&[Branch::Chou, Branch::Wei]) || !ctx.is_empty_palace(p) {
        return Ok(false);
    }
    let opposite = ctx.require_opposite(p)?;
    Ok(ctx.has_star(opposite, TaiYang) && ctx.has_star(opposite, TaiYin))
}

/// A 禄 broken by 地空 or 地劫 in the palace or its opposite.
pub(super) fn lu_feng_chong_po(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if !any_lu(ctx, p) {
        return Ok(false);
    }
    let void = |palace: &Palace| ctx.has_star(palace, DiKong) || ctx.has_star(palace, DiJie);
    if void(p) {
        return Ok(true);
    }
    let opposite = ctx.require_opposite(p)?;
    Ok(void(opposite))
}

/// Empty 未 palace with 太阳 in 卯 and 太阴 in 亥.
pub(super) fn ming_zhu_chu_hai(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    if p.branch != Branch::Wei || !ctx.is_empty_palace(p) {
        return Ok(false);
    }
    let graph = ctx.graph();
    Ok(ctx.has_star(graph.by_branch(Branch::Mao), TaiYang)
        && ctx.has_star(graph.by_branch(Branch::Hai), TaiYin))
}

pub(super) fn ming_wu_zheng_yao(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.is_empty_palace(p))
}

pub(super) fn ming_shen_tong_gong(_ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(p.is_body_palace && p.role() == Some(PalaceRole::Life))
}

pub(super) fn ma_luo_kong_wang(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, TianMa) && (ctx.has_star(p, DiKong) || ctx.has_star(p, DiJie)))
}

/// 禄存 and 化禄 together, met by 地空 or 地劫.
pub(super) fn liang_chong_hua_gai(ctx: &EvaluationContext<'_>, p: &Palace) -> Outcome {
    Ok(ctx.has_star(p, LuCun)
        && ctx.has_mutagen(p, Mutagen::Lu)
        && (ctx.has_star(p, DiKong) || ctx.has_star(p, DiJie)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{TemporalContext, TemporalContextBuilder};
    use crate::types::Star;

    fn ring() -> Vec<Palace> {
        (0..12).map(Palace::empty).collect()
    }

    #[test]
    fn test_ji_xiang_li_ming_guard() {
        let mut palaces = ring();
        // 午 is index 4
        palaces[4].major_stars.push(Star::new(ZiWei));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ji_xiang_li_ming(&ctx, &palaces[4]), Ok(true));

        palaces[4].minor_stars.push(Star::new(HuoXing));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ji_xiang_li_ming(&ctx, &palaces[4]), Ok(false));
    }

    #[test]
    fn test_transient_malefic_does_not_break_guard() {
        let mut palaces = ring();
        palaces[4].major_stars.push(Star::new(ZiWei));
        let mut overlay = TemporalContext::default();
        overlay.flow_stars.insert(4, vec![QingYang]);
        let ctx = EvaluationContext::with_overlay(&palaces, &overlay);
        assert!(ctx.has_star(&palaces[4], QingYang));
        assert_eq!(ji_xiang_li_ming(&ctx, &palaces[4]), Ok(true));
    }

    #[test]
    fn test_sha_po_lang_needs_member_in_palace() {
        let mut palaces = ring();
        palaces[0].major_stars.push(Star::new(QiSha));
        palaces[4].major_stars.push(Star::new(PoJun));
        palaces[8].major_stars.push(Star::new(TanLang));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(sha_po_lang(&ctx, &palaces[0]), Ok(true));
        assert_eq!(sha_po_lang(&ctx, &palaces[6]), Ok(false));
    }

    #[test]
    fn test_shuang_lu_needs_two_palaces() {
        let mut palaces = ring();
        palaces[0].minor_stars.push(Star::new(LuCun));
        palaces[0]
            .major_stars
            .push(Star::new(TianJi).with_mutagen(Mutagen::Lu));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(shuang_lu_chao_yuan(&ctx, &palaces[0]), Ok(false));

        palaces[0].major_stars[0].mutagen = None;
        palaces[4]
            .major_stars
            .push(Star::new(TianTong).with_mutagen(Mutagen::Lu));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(shuang_lu_chao_yuan(&ctx, &palaces[0]), Ok(true));
    }

    #[test]
    fn test_ri_yue_bing_ming_reads_brightness() {
        let mut palaces = ring();
        palaces[1]
            .major_stars
            .push(Star::new(TaiYang).with_brightness(Brightness::Temple));
        palaces[5]
            .major_stars
            .push(Star::new(TaiYin).with_brightness(Brightness::Prosperous));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ri_yue_bing_ming(&ctx, &palaces[1]), Ok(true));

        palaces[5].major_stars[0].brightness = Some(Brightness::Trapped);
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ri_yue_bing_ming(&ctx, &palaces[1]), Ok(false));
    }

    #[test]
    fn test_lu_ma_jiao_chi_across_ring() {
        let mut palaces = ring();
        palaces[2].minor_stars.push(Star::new(LuCun));
        palaces[8].minor_stars.push(Star::new(TianMa));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(lu_ma_jiao_chi(&ctx, &palaces[2]), Ok(true));
        assert_eq!(lu_ma_jiao_chi(&ctx, &palaces[8]), Ok(true));
        assert_eq!(lu_ma_jiao_chi(&ctx, &palaces[3]), Ok(false));
    }

    #[test]
    fn test_ming_zhu_chu_hai() {
        let mut palaces = ring();
        // 未 = 5, 卯 = 1, 亥 = 9
        palaces[1].major_stars.push(Star::new(TaiYang));
        palaces[9].major_stars.push(Star::new(TaiYin));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ming_zhu_chu_hai(&ctx, &palaces[5]), Ok(true));

        palaces[5].major_stars.push(Star::new(TianLiang));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ming_zhu_chu_hai(&ctx, &palaces[5]), Ok(false));
    }

    #[test]
    fn test_cai_yin_jia_yin_with_transient_lu() {
        let mut palaces = ring();
        palaces[3].major_stars.push(Star::new(TianXiang));
        palaces[2].major_stars.push(Star::new(TianLiang));
        palaces[4].major_stars.push(Star::new(WuQu));
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(cai_yin_jia_yin(&ctx, &palaces[3]), Ok(false));

        let horoscope = crate::context::Horoscope {
            decadal: Some(crate::context::ScopeOverlay {
                mutagen: [Some(WuQu), None, None, None],
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = TemporalContextBuilder::new(Some(&horoscope)).build(&[crate::Scope::Decadal]);
        let ctx = EvaluationContext::with_overlay(&palaces, &overlay);
        assert_eq!(cai_yin_jia_yin(&ctx, &palaces[3]), Ok(true));
    }

    #[test]
    fn test_ming_shen_tong_gong() {
        let mut palaces = ring();
        palaces[6].name = "命宫".to_string();
        palaces[6].is_body_palace = true;
        let ctx = EvaluationContext::natal(&palaces);
        assert_eq!(ming_shen_tong_gong(&ctx, &palaces[6]), Ok(true));
        assert_eq!(ming_shen_tong_gong(&ctx, &palaces[5]), Ok(false));
    }
}
