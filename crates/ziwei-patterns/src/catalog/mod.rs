//! The ordered catalog of classical chart patterns (格局).
//!
//! Most patterns are one of a handful of regular shapes and are written as
//! data ([`Rule`] variants). Irregular ones fall back to a plain function in
//! [`rules`]. Catalog order is stable and is the order results are reported in.

mod rules;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::context::EvaluationContext;
use crate::star::StarName;
use crate::types::{Branch, Indeterminate, Mutagen, Palace};

/// A rule function: decides one pattern for a target palace.
pub type Predicate = fn(&EvaluationContext<'_>, &Palace) -> Result<bool, Indeterminate>;

/// A single fact a palace can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact {
    /// The star is in the palace.
    Has(StarName),
    /// Some star in the palace carries the label.
    Transformed(Mutagen),
    /// 禄存 or 化禄.
    AnyLu,
}

impl Fact {
    pub fn holds<'p>(self, ctx: &EvaluationContext<'_>, palace: impl Into<Option<&'p Palace>>) -> bool {
        let palace = palace.into();
        match self {
            Fact::Has(star) => ctx.has_star(palace, star),
            Fact::Transformed(mutagen) => ctx.has_mutagen(palace, mutagen),
            Fact::AnyLu => {
                ctx.has_star(palace, StarName::LuCun) || ctx.has_mutagen(palace, Mutagen::Lu)
            }
        }
    }
}

/// Shape of a pattern's condition.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Every fact holds in the target palace.
    Together(&'static [Fact]),
    /// Every fact holds in the target palace, which sits on one of the branches.
    TogetherOn(&'static [Fact], &'static [Branch]),
    /// The two neighbours carry the pair, in either order.
    Flanked(Fact, Fact),
    /// Every fact holds somewhere in the 三方四正 window.
    Converge(&'static [Fact]),
    /// One fact in the target palace and the other in its opposite, either way round.
    Facing(Fact, Fact),
    /// One fact in the target palace and the other in its hidden-combination partner.
    Hidden(Fact, Fact),
    /// Anything irregular.
    Check(Predicate),
}

impl Rule {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>, palace: &Palace) -> Result<bool, Indeterminate> {
        match *self {
            Rule::Together(facts) => Ok(facts.iter().all(|f| f.holds(ctx, palace))),
            Rule::TogetherOn(facts, branches) => {
                Ok(palace.is_on(branches) && facts.iter().all(|f| f.holds(ctx, palace)))
            }
            Rule::Flanked(a, b) => {
                let (prev, next) = ctx.require_flank(palace)?;
                Ok(either_way(ctx, a, b, prev, next))
            }
            Rule::Converge(facts) => Ok(converge(ctx, palace, facts)),
            Rule::Facing(a, b) => {
                let opposite = ctx.require_opposite(palace)?;
                Ok(either_way(ctx, a, b, palace, opposite))
            }
            Rule::Hidden(a, b) => {
                let partner = ctx.require_hidden_combination(palace)?;
                Ok(either_way(ctx, a, b, palace, partner))
            }
            Rule::Check(predicate) => predicate(ctx, palace),
        }
    }
}

/// `a` in `x` and `b` in `y`, or the other way round.
fn either_way(ctx: &EvaluationContext<'_>, a: Fact, b: Fact, x: &Palace, y: &Palace) -> bool {
    (a.holds(ctx, x) && b.holds(ctx, y)) || (b.holds(ctx, x) && a.holds(ctx, y))
}

/// Every fact holds in some palace of the target's 三方四正 window.
pub(crate) fn converge(ctx: &EvaluationContext<'_>, palace: &Palace, facts: &[Fact]) -> bool {
    let window = ctx.graph().sanfang(palace);
    facts
        .iter()
        .all(|fact| window.iter().any(|p| fact.holds(ctx, *p)))
}

/// Coarse grouping of patterns by the shape of their condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternFamily {
    CoLocation,
    BranchPlacement,
    Flanking,
    Convergence,
    Opposition,
    HiddenCombination,
    Compound,
}

impl PatternFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternFamily::CoLocation => "co-location",
            PatternFamily::BranchPlacement => "branch-placement",
            PatternFamily::Flanking => "flanking",
            PatternFamily::Convergence => "convergence",
            PatternFamily::Opposition => "opposition",
            PatternFamily::HiddenCombination => "hidden-combination",
            PatternFamily::Compound => "compound",
        }
    }
}

impl fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PatternFamily {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A named pattern.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub name: &'static str,
    pub family: PatternFamily,
    pub rule: Rule,
}

impl Pattern {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>, palace: &Palace) -> Result<bool, Indeterminate> {
        self.rule.evaluate(ctx, palace)
    }
}

/// The full catalog in reporting order.
pub fn catalog() -> &'static [Pattern] {
    CATALOG
}

/// Look a pattern up by name.
pub fn find(name: &str) -> Option<&'static Pattern> {
    CATALOG.iter().find(|p| p.name == name)
}

const fn pattern(name: &'static str, family: PatternFamily, rule: Rule) -> Pattern {
    Pattern { name, family, rule }
}

use Branch::*;
use Fact::{AnyLu, Has, Transformed};
use PatternFamily::*;
use Rule::*;
use StarName::*;

static CATALOG: &[Pattern] = &[
    // 同宫
    pattern("紫府同宫", CoLocation, TogetherOn(&[Has(ZiWei), Has(TianFu)], &[Yin, Shen])),
    pattern("日月同宫", CoLocation, Together(&[Has(TaiYang), Has(TaiYin)])),
    pattern("火贪格", CoLocation, Together(&[Has(HuoXing), Has(TanLang)])),
    pattern("铃贪格", CoLocation, Together(&[Has(LingXing), Has(TanLang)])),
    pattern("左右同宫", CoLocation, Together(&[Has(ZuoFu), Has(YouBi)])),
    pattern("昌曲同宫", CoLocation, Together(&[Has(WenChang), Has(WenQu)])),
    pattern("文桂文华", CoLocation, TogetherOn(&[Has(WenChang), Has(WenQu)], &[Chou, Wei])),
    pattern("武贪同行", CoLocation, Together(&[Has(WuQu), Has(TanLang)])),
    pattern("巨日同宫", CoLocation, TogetherOn(&[Has(JuMen), Has(TaiYang)], &[Yin, Shen])),
    pattern("机巨同临", CoLocation, TogetherOn(&[Has(TianJi), Has(JuMen)], &[Mao, You])),
    pattern("善荫朝纲", CoLocation, TogetherOn(&[Has(TianJi), Has(TianLiang)], &[Chen, Xu])),
    pattern("极居卯酉", CoLocation, TogetherOn(&[Has(ZiWei), Has(TanLang)], &[Mao, You])),
    pattern("月生沧海", CoLocation, TogetherOn(&[Has(TaiYin), Has(TianTong)], &[Zi])),
    pattern("梁马飘荡", CoLocation, TogetherOn(&[Has(TianLiang), Has(TianMa)], &[Si, Hai])),
    pattern("刑囚夹印", CoLocation, Together(&[Has(LianZhen), Has(TianXiang), Has(QingYang)])),
    pattern("禄马佩印", CoLocation, Together(&[AnyLu, Has(TianMa), Has(TianXiang)])),
    pattern("禄合鸳鸯", CoLocation, Together(&[Has(LuCun), Transformed(Mutagen::Lu)])),
    pattern("文梁振纪", CoLocation, Check(rules::wen_liang_zhen_ji)),
    pattern("截路空亡", CoLocation, Together(&[Has(JieLu), Has(KongWang)])),
    // 坐宫地支
    pattern("极向离明", BranchPlacement, Check(rules::ji_xiang_li_ming)),
    pattern("七杀朝斗", BranchPlacement, TogetherOn(&[Has(QiSha)], &[Yin, Shen, Zi, Wu])),
    pattern("贪狼入庙", BranchPlacement, TogetherOn(&[Has(TanLang)], &[Zi, Wu])),
    pattern("日照雷门", BranchPlacement, TogetherOn(&[Has(TaiYang)], &[Mao])),
    pattern("金灿光辉", BranchPlacement, TogetherOn(&[Has(TaiYang)], &[Wu])),
    pattern("月朗天门", BranchPlacement, TogetherOn(&[Has(TaiYin)], &[Hai])),
    pattern("石中隐玉", BranchPlacement, Check(rules::shi_zhong_yin_yu)),
    pattern("寿星入庙", BranchPlacement, TogetherOn(&[Has(TianLiang)], &[Wu])),
    pattern("英星入庙", BranchPlacement, TogetherOn(&[Has(PoJun)], &[Zi, Wu])),
    pattern("雄宿朝垣", BranchPlacement, Check(rules::xiong_su_chao_yuan)),
    pattern("将星得地", BranchPlacement, TogetherOn(&[Has(WuQu)], &[Chen, Xu])),
    pattern("擎羊入庙", BranchPlacement, TogetherOn(&[Has(QingYang)], &[Chen, Xu, Chou, Wei])),
    pattern("马头带箭", BranchPlacement, TogetherOn(&[Has(QingYang)], &[Wu])),
    pattern("泛水桃花", BranchPlacement, TogetherOn(&[Has(TanLang), Has(QingYang)], &[Zi, Hai])),
    pattern("风流彩杖", BranchPlacement, TogetherOn(&[Has(TanLang), Has(TuoLuo)], &[Yin])),
    pattern("空劫同宫", BranchPlacement, TogetherOn(&[Has(DiKong), Has(DiJie)], &[Si, Hai])),
    // 夹宫
    pattern("左右夹命", Flanking, Flanked(Has(ZuoFu), Has(YouBi))),
    pattern("昌曲夹命", Flanking, Flanked(Has(WenChang), Has(WenQu))),
    pattern("魁钺夹命", Flanking, Flanked(Has(TianKui), Has(TianYue))),
    pattern("日月夹命", Flanking, Flanked(Has(TaiYang), Has(TaiYin))),
    pattern("紫府夹命", Flanking, Flanked(Has(ZiWei), Has(TianFu))),
    pattern("羊陀夹命", Flanking, Flanked(Has(QingYang), Has(TuoLuo))),
    pattern("火铃夹命", Flanking, Flanked(Has(HuoXing), Has(LingXing))),
    pattern("空劫夹命", Flanking, Flanked(Has(DiKong), Has(DiJie))),
    pattern("权禄夹命", Flanking, Flanked(Transformed(Mutagen::Quan), Transformed(Mutagen::Lu))),
    pattern("双禄夹命", Flanking, Flanked(Has(LuCun), Transformed(Mutagen::Lu))),
    pattern("财荫夹印", Flanking, Check(rules::cai_yin_jia_yin)),
    pattern("刑忌夹印", Flanking, Check(rules::xing_ji_jia_yin)),
    pattern("羊陀夹忌", Flanking, Check(rules::yang_tuo_jia_ji)),
    pattern("紫微辅弼", Flanking, Check(rules::zi_wei_fu_bi)),
    // 三方四正
    pattern("君臣庆会", Convergence, Check(rules::jun_chen_qing_hui)),
    pattern("辅弼拱主", Convergence, Check(rules::fu_bi_gong_zhu)),
    pattern("紫府朝垣", Convergence, Converge(&[Has(ZiWei), Has(TianFu)])),
    pattern("府相朝垣", Convergence, Converge(&[Has(TianFu), Has(TianXiang)])),
    pattern("杀破狼", Convergence, Check(rules::sha_po_lang)),
    pattern("机月同梁", Convergence, Converge(&[Has(TianJi), Has(TaiYin), Has(TianTong), Has(TianLiang)])),
    pattern("阳梁昌禄", Convergence, Converge(&[Has(TaiYang), Has(TianLiang), Has(WenChang), AnyLu])),
    pattern(
        "三奇嘉会",
        Convergence,
        Converge(&[
            Transformed(Mutagen::Lu),
            Transformed(Mutagen::Quan),
            Transformed(Mutagen::Ke),
        ]),
    ),
    pattern("权禄巡逢", Convergence, Converge(&[Transformed(Mutagen::Quan), Transformed(Mutagen::Lu)])),
    pattern("科名会禄", Convergence, Converge(&[Transformed(Mutagen::Ke), Transformed(Mutagen::Lu)])),
    pattern("双禄朝垣", Convergence, Check(rules::shuang_lu_chao_yuan)),
    pattern("禄文拱命", Convergence, Check(rules::lu_wen_gong_ming)),
    pattern("天乙拱命", Convergence, Converge(&[Has(TianKui), Has(TianYue)])),
    pattern("文星拱命", Convergence, Converge(&[Has(WenChang), Has(WenQu)])),
    pattern("三台八座", Convergence, Converge(&[Has(SanTai), Has(BaZuo)])),
    pattern("龙池凤阁", Convergence, Converge(&[Has(LongChi), Has(FengGe)])),
    pattern("日月并明", Convergence, Check(rules::ri_yue_bing_ming)),
    pattern("日月反背", Convergence, Check(rules::ri_yue_fan_bei)),
    pattern("铃昌陀武", Convergence, Check(rules::ling_chang_tuo_wu)),
    pattern("巨火擎羊", Convergence, Check(rules::ju_huo_qing_yang)),
    // 对宫
    pattern("禄马交驰", Opposition, Check(rules::lu_ma_jiao_chi)),
    pattern("坐贵向贵", Opposition, Facing(Has(TianKui), Has(TianYue))),
    pattern("日月照壁", Opposition, Check(rules::ri_yue_zhao_bi)),
    pattern("禄逢冲破", Opposition, Check(rules::lu_feng_chong_po)),
    // 暗合
    pattern("明禄暗禄", HiddenCombination, Hidden(Has(LuCun), Transformed(Mutagen::Lu))),
    // 复合
    pattern("明珠出海", Compound, Check(rules::ming_zhu_chu_hai)),
    pattern("命无正曜", Compound, Check(rules::ming_wu_zheng_yao)),
    pattern("命身同宫", Compound, Check(rules::ming_shen_tong_gong)),
    pattern("马落空亡", Compound, Check(rules::ma_luo_kong_wang)),
    pattern("两重华盖", Compound, Check(rules::liang_chong_hua_gai)),
];
