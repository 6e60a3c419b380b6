use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IsomirError;

/// 单端（5' 或 3'）相对 canonical 的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndChange {
    Unchanged,
    /// 多出 n 个碱基
    Added(u32),
    /// 缺少 n 个碱基
    Trimmed(u32),
}

impl EndChange {
    pub fn from_delta(delta: i32) -> Self {
        match delta.cmp(&0) {
            std::cmp::Ordering::Greater => EndChange::Added(delta as u32),
            std::cmp::Ordering::Less => EndChange::Trimmed(delta.unsigned_abs()),
            std::cmp::Ordering::Equal => EndChange::Unchanged,
        }
    }

    #[inline]
    pub fn is_changed(self) -> bool {
        !matches!(self, EndChange::Unchanged)
    }

    /// `5'+2` / `5'-2`；未变化时无片段
    fn fragment(self, end: &str) -> Option<String> {
        match self {
            EndChange::Unchanged => None,
            EndChange::Added(n) => Some(format!("{}+{}", end, n)),
            EndChange::Trimmed(n) => Some(format!("{}-{}", end, n)),
        }
    }
}

/// 内部替换数量的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnpClass {
    None,
    Single,
    Multiple(u32),
}

impl SnpClass {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => SnpClass::None,
            1 => SnpClass::Single,
            n => SnpClass::Multiple(n),
        }
    }

    pub fn count(self) -> u32 {
        match self {
            SnpClass::None => 0,
            SnpClass::Single => 1,
            SnpClass::Multiple(n) => n,
        }
    }

    fn fragment(self) -> Option<String> {
        match self {
            SnpClass::None => None,
            n => Some(format!("snp+{}", n.count())),
        }
    }
}

/// 12 种 isomiR 类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantType {
    #[serde(rename = "mirna_exact")]
    MirnaExact,
    #[serde(rename = "iso_5p_only")]
    Iso5pOnly,
    #[serde(rename = "iso_3p_only")]
    Iso3pOnly,
    #[serde(rename = "iso_snp_only")]
    IsoSnpOnly,
    #[serde(rename = "iso_multi_snp_only")]
    IsoMultiSnpOnly,
    #[serde(rename = "iso_5p-iso_3p")]
    Iso5pIso3p,
    #[serde(rename = "iso_5p-iso_snp")]
    Iso5pIsoSnp,
    #[serde(rename = "iso_5p-iso_multi_snp")]
    Iso5pIsoMultiSnp,
    #[serde(rename = "iso_snp-iso_3p")]
    IsoSnpIso3p,
    #[serde(rename = "iso_multi_snp-iso_3p")]
    IsoMultiSnpIso3p,
    #[serde(rename = "iso_5p-iso_snp-iso_3p")]
    Iso5pIsoSnpIso3p,
    #[serde(rename = "iso_5p-iso_multi_snp-iso_3p")]
    Iso5pIsoMultiSnpIso3p,
}

impl VariantType {
    pub const ALL: [VariantType; 12] = [
        VariantType::MirnaExact,
        VariantType::Iso5pOnly,
        VariantType::Iso3pOnly,
        VariantType::IsoSnpOnly,
        VariantType::IsoMultiSnpOnly,
        VariantType::Iso5pIso3p,
        VariantType::Iso5pIsoSnp,
        VariantType::Iso5pIsoMultiSnp,
        VariantType::IsoSnpIso3p,
        VariantType::IsoMultiSnpIso3p,
        VariantType::Iso5pIsoSnpIso3p,
        VariantType::Iso5pIsoMultiSnpIso3p,
    ];

    /// 由三个子类型组合得到标签，所有 2×3×2 组合都有对应
    pub fn derive(five: EndChange, snp: SnpClass, three: EndChange) -> Self {
        use SnpClass as S;
        match (five.is_changed(), snp, three.is_changed()) {
            (false, S::None, false) => VariantType::MirnaExact,
            (true, S::None, false) => VariantType::Iso5pOnly,
            (false, S::None, true) => VariantType::Iso3pOnly,
            (false, S::Single, false) => VariantType::IsoSnpOnly,
            (false, S::Multiple(_), false) => VariantType::IsoMultiSnpOnly,
            (true, S::None, true) => VariantType::Iso5pIso3p,
            (true, S::Single, false) => VariantType::Iso5pIsoSnp,
            (true, S::Multiple(_), false) => VariantType::Iso5pIsoMultiSnp,
            (false, S::Single, true) => VariantType::IsoSnpIso3p,
            (false, S::Multiple(_), true) => VariantType::IsoMultiSnpIso3p,
            (true, S::Single, true) => VariantType::Iso5pIsoSnpIso3p,
            (true, S::Multiple(_), true) => VariantType::Iso5pIsoMultiSnpIso3p,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariantType::MirnaExact => "mirna_exact",
            VariantType::Iso5pOnly => "iso_5p_only",
            VariantType::Iso3pOnly => "iso_3p_only",
            VariantType::IsoSnpOnly => "iso_snp_only",
            VariantType::IsoMultiSnpOnly => "iso_multi_snp_only",
            VariantType::Iso5pIso3p => "iso_5p-iso_3p",
            VariantType::Iso5pIsoSnp => "iso_5p-iso_snp",
            VariantType::Iso5pIsoMultiSnp => "iso_5p-iso_multi_snp",
            VariantType::IsoSnpIso3p => "iso_snp-iso_3p",
            VariantType::IsoMultiSnpIso3p => "iso_multi_snp-iso_3p",
            VariantType::Iso5pIsoSnpIso3p => "iso_5p-iso_snp-iso_3p",
            VariantType::Iso5pIsoMultiSnpIso3p => "iso_5p-iso_multi_snp-iso_3p",
        }
    }

    /// 下游汇总使用的粗分组
    pub fn group(self) -> VariantGroup {
        match self {
            VariantType::MirnaExact => VariantGroup::Canonical,
            VariantType::Iso5pOnly => VariantGroup::FivePrime,
            VariantType::Iso3pOnly => VariantGroup::ThreePrime,
            VariantType::Iso5pIsoSnpIso3p | VariantType::Iso5pIsoMultiSnpIso3p => VariantGroup::BothEnds,
            _ => VariantGroup::Others,
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantType {
    type Err = IsomirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariantType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| IsomirError::invalid(s, "unknown variant type"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantGroup {
    #[serde(rename = "Canonical")]
    Canonical,
    #[serde(rename = "5'isomiR")]
    FivePrime,
    #[serde(rename = "3'isomiR")]
    ThreePrime,
    #[serde(rename = "Both end isomiR")]
    BothEnds,
    #[serde(rename = "Others")]
    Others,
}

impl VariantGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            VariantGroup::Canonical => "Canonical",
            VariantGroup::FivePrime => "5'isomiR",
            VariantGroup::ThreePrime => "3'isomiR",
            VariantGroup::BothEnds => "Both end isomiR",
            VariantGroup::Others => "Others",
        }
    }
}

/// 由 5' / SNP / 3' 三个量得到 (类型, 显示名称)。
/// 片段顺序固定为 5' → SNP → 3'，以 `|` 连接。
pub fn get_type_name(name: &str, nt_diff_5p: i32, snp_count: u32, nt_diff_3p: i32) -> (VariantType, String) {
    let five = EndChange::from_delta(nt_diff_5p);
    let snp = SnpClass::from_count(snp_count);
    let three = EndChange::from_delta(nt_diff_3p);

    let vt = VariantType::derive(five, snp, three);
    if vt == VariantType::MirnaExact {
        return (vt, name.to_string());
    }

    let frags: Vec<String> = [five.fragment("5'"), snp.fragment(), three.fragment("3'")]
        .into_iter()
        .flatten()
        .collect();
    (vt, format!("{}({})", name, frags.join("|")))
}
