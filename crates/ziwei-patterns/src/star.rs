//! Closed star vocabulary and the label table used at the ingestion boundary.

use std::fmt;

use serde::{Serialize, Serializer};

/// Which of the three palace star lists a star is normally published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarKind {
    Major,
    Minor,
    Adjective,
}

/// Every star the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StarName {
    // Fourteen major stars.
    ZiWei,
    TianJi,
    TaiYang,
    WuQu,
    TianTong,
    LianZhen,
    TianFu,
    TaiYin,
    TanLang,
    JuMen,
    TianXiang,
    TianLiang,
    QiSha,
    PoJun,
    // Auxiliary and malefic stars.
    ZuoFu,
    YouBi,
    WenChang,
    WenQu,
    TianKui,
    TianYue,
    LuCun,
    TianMa,
    QingYang,
    TuoLuo,
    HuoXing,
    LingXing,
    DiKong,
    DiJie,
    // Adjective stars.
    TianXing,
    TianYao,
    HongLuan,
    TianXi,
    TianKu,
    TianXu,
    LongChi,
    FengGe,
    SanTai,
    BaZuo,
    EnGuang,
    TianGui,
    TaiFu,
    FengGao,
    TianGuan,
    TianFuBlessing,
    GuChen,
    GuaSu,
    TianWu,
    TianYueMoon,
    YinSha,
    JieShen,
    TianKong,
    FeiLian,
    PoSui,
    HuaGai,
    XianChi,
    TianDe,
    YueDe,
    TianCai,
    TianShou,
    TianChu,
    JieLu,
    KongWang,
    XunKong,
    TianShang,
    TianShi,
}

const VOCABULARY: &[(StarName, &str, StarKind)] = &[
    (StarName::ZiWei, "紫微", StarKind::Major),
    (StarName::TianJi, "天机", StarKind::Major),
    (StarName::TaiYang, "太阳", StarKind::Major),
    (StarName::WuQu, "武曲", StarKind::Major),
    (StarName::TianTong, "天同", StarKind::Major),
    (StarName::LianZhen, "廉贞", StarKind::Major),
    (StarName::TianFu, "天府", StarKind::Major),
    (StarName::TaiYin, "太阴", StarKind::Major),
    (StarName::TanLang, "贪狼", StarKind::Major),
    (StarName::JuMen, "巨门", StarKind::Major),
    (StarName::TianXiang, "天相", StarKind::Major),
    (StarName::TianLiang, "天梁", StarKind::Major),
    (StarName::QiSha, "七杀", StarKind::Major),
    (StarName::PoJun, "破军", StarKind::Major),
    (StarName::ZuoFu, "左辅", StarKind::Minor),
    (StarName::YouBi, "右弼", StarKind::Minor),
    (StarName::WenChang, "文昌", StarKind::Minor),
    (StarName::WenQu, "文曲", StarKind::Minor),
    (StarName::TianKui, "天魁", StarKind::Minor),
    (StarName::TianYue, "天钺", StarKind::Minor),
    (StarName::LuCun, "禄存", StarKind::Minor),
    (StarName::TianMa, "天马", StarKind::Minor),
    (StarName::QingYang, "擎羊", StarKind::Minor),
    (StarName::TuoLuo, "陀罗", StarKind::Minor),
    (StarName::HuoXing, "火星", StarKind::Minor),
    (StarName::LingXing, "铃星", StarKind::Minor),
    (StarName::DiKong, "地空", StarKind::Minor),
    (StarName::DiJie, "地劫", StarKind::Minor),
    (StarName::TianXing, "天刑", StarKind::Adjective),
    (StarName::TianYao, "天姚", StarKind::Adjective),
    (StarName::HongLuan, "红鸾", StarKind::Adjective),
    (StarName::TianXi, "天喜", StarKind::Adjective),
    (StarName::TianKu, "天哭", StarKind::Adjective),
    (StarName::TianXu, "天虚", StarKind::Adjective),
    (StarName::LongChi, "龙池", StarKind::Adjective),
    (StarName::FengGe, "凤阁", StarKind::Adjective),
    (StarName::SanTai, "三台", StarKind::Adjective),
    (StarName::BaZuo, "八座", StarKind::Adjective),
    (StarName::EnGuang, "恩光", StarKind::Adjective),
    (StarName::TianGui, "天贵", StarKind::Adjective),
    (StarName::TaiFu, "台辅", StarKind::Adjective),
    (StarName::FengGao, "封诰", StarKind::Adjective),
    (StarName::TianGuan, "天官", StarKind::Adjective),
    (StarName::TianFuBlessing, "天福", StarKind::Adjective),
    (StarName::GuChen, "孤辰", StarKind::Adjective),
    (StarName::GuaSu, "寡宿", StarKind::Adjective),
    (StarName::TianWu, "天巫", StarKind::Adjective),
    (StarName::TianYueMoon, "天月", StarKind::Adjective),
    (StarName::YinSha, "阴煞", StarKind::Adjective),
    (StarName::JieShen, "解神", StarKind::Adjective),
    (StarName::TianKong, "天空", StarKind::Adjective),
    (StarName::FeiLian, "蜚廉", StarKind::Adjective),
    (StarName::PoSui, "破碎", StarKind::Adjective),
    (StarName::HuaGai, "华盖", StarKind::Adjective),
    (StarName::XianChi, "咸池", StarKind::Adjective),
    (StarName::TianDe, "天德", StarKind::Adjective),
    (StarName::YueDe, "月德", StarKind::Adjective),
    (StarName::TianCai, "天才", StarKind::Adjective),
    (StarName::TianShou, "天寿", StarKind::Adjective),
    (StarName::TianChu, "天厨", StarKind::Adjective),
    (StarName::JieLu, "截路", StarKind::Adjective),
    (StarName::KongWang, "空亡", StarKind::Adjective),
    (StarName::XunKong, "旬空", StarKind::Adjective),
    (StarName::TianShang, "天伤", StarKind::Adjective),
    (StarName::TianShi, "天使", StarKind::Adjective),
];

/// The six classical malefic stars (六煞).
pub const MALEFICS: [StarName; 6] = [
    StarName::QingYang,
    StarName::TuoLuo,
    StarName::HuoXing,
    StarName::LingXing,
    StarName::DiKong,
    StarName::DiJie,
];

/// Prefixes the overlay computation puts in front of transient star names.
const TRANSIENT_PREFIXES: [char; 5] = ['运', '流', '月', '日', '时'];

/// Abbreviated transient bodies and the natal star they stand for.
const TRANSIENT_ABBREVIATIONS: &[(&str, StarName)] = &[
    ("魁", StarName::TianKui),
    ("钺", StarName::TianYue),
    ("昌", StarName::WenChang),
    ("曲", StarName::WenQu),
    ("禄", StarName::LuCun),
    ("羊", StarName::QingYang),
    ("陀", StarName::TuoLuo),
    ("马", StarName::TianMa),
    ("鸾", StarName::HongLuan),
    ("喜", StarName::TianXi),
];

impl StarName {
    /// Resolve a natal star label such as `"紫微"`.
    pub fn from_label(label: &str) -> Option<Self> {
        VOCABULARY
            .iter()
            .find(|(_, l, _)| *l == label)
            .map(|(name, _, _)| *name)
    }

    /// Resolve a transient star label such as `"运羊"` or `"流昌"`.
    ///
    /// Full names are accepted as-is, with or without a scope prefix.
    pub fn from_transient_label(label: &str) -> Option<Self> {
        if let Some(name) = Self::from_label(label) {
            return Some(name);
        }
        let body = label
            .strip_prefix(|c: char| TRANSIENT_PREFIXES.contains(&c))
            .unwrap_or(label);
        Self::from_label(body).or_else(|| {
            TRANSIENT_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == body)
                .map(|(_, name)| *name)
        })
    }

    /// The Chinese label.
    pub fn label(self) -> &'static str {
        self.entry().1
    }

    pub fn kind(self) -> StarKind {
        self.entry().2
    }

    pub fn is_major(self) -> bool {
        self.kind() == StarKind::Major
    }

    pub fn is_malefic(self) -> bool {
        MALEFICS.contains(&self)
    }

    fn entry(self) -> &'static (StarName, &'static str, StarKind) {
        // Every variant has exactly one row; the table is checked in tests.
        &VOCABULARY[VOCABULARY
            .iter()
            .position(|(name, _, _)| *name == self)
            .unwrap_or(0)]
    }
}

impl fmt::Display for StarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StarName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
