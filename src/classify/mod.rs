pub mod variant;

use std::fmt;

pub use variant::{get_type_name, EndChange, SnpClass, VariantGroup, VariantType};

use crate::util::dna;

/// 一个替换位点：canonical 上的 1-based 位置和 tag 上的碱基
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnpCall {
    pub position: usize,
    pub base: u8,
}

impl fmt::Display for SnpCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.position, self.base as char)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantClassification {
    pub nt_diff_5p: i32,
    pub nt_diff_3p: i32,
    pub snp_count: u32,
    pub snp_positions: Vec<SnpCall>,
    pub variant_type: VariantType,
    pub display_name: String,
    /// 显示名称加上具体碱基，如 `let-7a(5'+1:A|snp+1:12C)`
    pub detailed_name: String,
}

/// 沿对齐对角线逐位比较 canonical 与 tag。
///
/// 两个起点同时减去 `min(begin_mirna, begin_tag)` 后同步前进，任一序列耗尽即停止。
/// 起点已越过序列末尾时不做任何比较。
pub fn count_snps(canonical: &[u8], tag: &[u8], begin_mirna: usize, begin_tag: usize) -> Vec<SnpCall> {
    let shift = begin_mirna.min(begin_tag);
    let mut i = begin_mirna - shift;
    let mut j = begin_tag - shift;

    let mut snps = Vec::new();
    while i < canonical.len() && j < tag.len() {
        if !dna::same_base(canonical[i], tag[j]) {
            snps.push(SnpCall { position: i + 1, base: tag[j] });
        }
        i += 1;
        j += 1;
    }
    snps
}

/// 对单个 tag 做 isomiR 分类。
///
/// - `nt_diff_5p = begin_tag - begin_mirna`
/// - `nt_diff_3p = -size_diff - nt_diff_5p`，其中 `size_diff` 为 canonical 长度减 tag 长度
pub fn classify(
    name: &str,
    canonical: &[u8],
    tag: &[u8],
    begin_mirna: usize,
    begin_tag: usize,
    size_diff: i32,
) -> VariantClassification {
    let nt_diff_5p = begin_tag as i32 - begin_mirna as i32;
    let nt_diff_3p = -size_diff - nt_diff_5p;

    let snp_positions = count_snps(canonical, tag, begin_mirna, begin_tag);
    let snp_count = snp_positions.len() as u32;

    let (variant_type, display_name) = get_type_name(name, nt_diff_5p, snp_count, nt_diff_3p);
    let detailed_name = detailed_name(name, tag, nt_diff_5p, &snp_positions, nt_diff_3p);

    VariantClassification {
        nt_diff_5p,
        nt_diff_3p,
        snp_count,
        snp_positions,
        variant_type,
        display_name,
        detailed_name,
    }
}

fn detailed_name(name: &str, tag: &[u8], nt_diff_5p: i32, snps: &[SnpCall], nt_diff_3p: i32) -> String {
    let mut frags: Vec<String> = Vec::new();

    match EndChange::from_delta(nt_diff_5p) {
        EndChange::Added(n) => {
            let added = tag.get(..n as usize).unwrap_or(tag);
            frags.push(format!("5'+{}:{}", n, String::from_utf8_lossy(added)));
        }
        EndChange::Trimmed(n) => frags.push(format!("5'-{}", n)),
        EndChange::Unchanged => {}
    }

    if !snps.is_empty() {
        let desc: String = snps.iter().map(SnpCall::to_string).collect();
        frags.push(format!("snp+{}:{}", snps.len(), desc));
    }

    match EndChange::from_delta(nt_diff_3p) {
        EndChange::Added(n) => {
            let added = tag.get(tag.len().saturating_sub(n as usize)..).unwrap_or(tag);
            frags.push(format!("3'+{}:{}", n, String::from_utf8_lossy(added)));
        }
        EndChange::Trimmed(n) => frags.push(format!("3'-{}", n)),
        EndChange::Unchanged => {}
    }

    if frags.is_empty() {
        name.to_string()
    } else {
        format!("{}({})", name, frags.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LET7: &[u8] = b"UGAGGUAGUAGGUUGUAUAGUU";

    #[test]
    fn identical_tag_is_exact() {
        let c = classify("let-7a-5p", LET7, LET7, 0, 0, 0);
        assert_eq!(c.variant_type, VariantType::MirnaExact);
        assert_eq!(c.display_name, "let-7a-5p");
        assert_eq!(c.detailed_name, "let-7a-5p");
        assert_eq!((c.nt_diff_5p, c.snp_count, c.nt_diff_3p), (0, 0, 0));
    }

    #[test]
    fn one_base_added_at_5p() {
        let c = classify("let-7a-5p", LET7, b"AUGAGGUAGUAGGUUGUAUAGUU", 0, 1, -1);
        assert_eq!(c.nt_diff_5p, 1);
        assert_eq!(c.nt_diff_3p, 0);
        assert_eq!(c.snp_count, 0);
        assert_eq!(c.variant_type.as_str(), "iso_5p_only");
        assert_eq!(c.display_name, "let-7a-5p(5'+1)");
        assert_eq!(c.detailed_name, "let-7a-5p(5'+1:A)");
    }

    #[test]
    fn single_internal_substitution() {
        let tag = b"UGAGGUAGUAGCUUGUAUAGUU";
        let c = classify("let-7a-5p", LET7, tag, 0, 0, 0);
        assert_eq!(c.variant_type, VariantType::IsoSnpOnly);
        assert_eq!(c.snp_count, 1);
        assert_eq!(c.snp_positions, vec![SnpCall { position: 12, base: b'C' }]);
        assert_eq!(c.display_name, "let-7a-5p(snp+1)");
        assert_eq!(c.detailed_name, "let-7a-5p(snp+1:12C)");
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let tag = b"ugagguaguagguuguauaguu";
        assert!(count_snps(LET7, tag, 0, 0).is_empty());
    }

    #[test]
    fn trimmed_5p_and_extended_3p() {
        // tag 缺少 canonical 前两个碱基，3' 多出 UU
        let tag = b"AGGUAGUAGGUUGUAUAGUUUU";
        let c = classify("let-7a-5p", LET7, tag, 2, 0, 0);
        assert_eq!(c.nt_diff_5p, -2);
        assert_eq!(c.nt_diff_3p, 2);
        assert_eq!(c.snp_count, 0);
        assert_eq!(c.variant_type, VariantType::Iso5pIso3p);
        assert_eq!(c.display_name, "let-7a-5p(5'-2|3'+2)");
        assert_eq!(c.detailed_name, "let-7a-5p(5'-2|3'+2:UU)");
    }

    #[test]
    fn zero_length_overlap_counts_nothing() {
        let c = classify("m", b"ACGU", b"GG", 0, 5, 2);
        assert_eq!(c.snp_count, 0);
        assert!(c.snp_positions.is_empty());
        assert!(count_snps(b"ACGU", b"GG", 6, 9).is_empty());
    }

    #[test]
    fn tag_length_reconstructs_from_deltas() {
        let cases: [(&[u8], usize, usize); 4] = [
            (b"AUGAGGUAGUAGGUUGUAUAGUU", 0, 1),
            (b"AGGUAGUAGGUUGUAUAGUUUU", 2, 0),
            (b"GAGGUAGUAGGUUGUAUAG", 1, 0),
            (b"CCUGAGGUAGUAGGUUGUAUAGUUA", 0, 2),
        ];
        for (tag, bm, bt) in cases {
            let size_diff = LET7.len() as i32 - tag.len() as i32;
            let c = classify("m", LET7, tag, bm, bt, size_diff);
            assert_eq!(LET7.len() as i32 + c.nt_diff_5p + c.nt_diff_3p, tag.len() as i32);
        }
    }

    fn reversed_offsets(canonical: &[u8], tag: &[u8], bm: usize, bt: usize) -> (usize, usize) {
        let diag = (tag.len() as i64 - canonical.len() as i64) - (bt as i64 - bm as i64);
        if diag >= 0 {
            (0, diag as usize)
        } else {
            ((-diag) as usize, 0)
        }
    }

    #[test]
    fn snp_count_symmetric_under_reversal() {
        let cases: [(&[u8], &[u8], usize, usize); 3] = [
            (b"UGAGGUAG", b"AUGACGUAGCC", 0, 1),
            (LET7, b"AGGUCGUAGGUUGUAUAGAUUU", 2, 0),
            (b"ACGUACGU", b"ACCUACGA", 0, 0),
        ];
        for (canonical, tag, bm, bt) in cases {
            let fwd = count_snps(canonical, tag, bm, bt).len();
            let rc: Vec<u8> = canonical.iter().rev().copied().collect();
            let rt: Vec<u8> = tag.iter().rev().copied().collect();
            let (rbm, rbt) = reversed_offsets(canonical, tag, bm, bt);
            assert_eq!(count_snps(&rc, &rt, rbm, rbt).len(), fwd);
        }
    }

    #[test]
    fn rederiving_from_own_output_is_stable() {
        let tag = b"CUGAGGUAGUAGGUAGUAUAGU";
        let c = classify("let-7a-5p", LET7, tag, 0, 1, 0);
        let (t, n) = get_type_name("let-7a-5p", c.nt_diff_5p, c.snp_count, c.nt_diff_3p);
        assert_eq!(t, c.variant_type);
        assert_eq!(n, c.display_name);
    }
}
