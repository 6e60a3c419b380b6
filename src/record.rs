use serde::{Deserialize, Serialize};

use crate::classify::{self, VariantGroup, VariantType};

/// isomiR-SEA 输出中的一行（只取用到的列，其余列忽略）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub mirna_name: String,
    pub tag_sequence: String,
    pub begin_ungapped_mirna: usize,
    pub begin_ungapped_tag: usize,
    pub mirna_seq: String,
    /// canonical 长度减 tag 长度
    pub mir_tag_size_diff: i32,
    #[serde(rename = "#count_tags", alias = "count")]
    pub count: u64,
}

impl TagRecord {
    pub fn classify(self) -> ClassifiedTag {
        let c = classify::classify(
            &self.mirna_name,
            self.mirna_seq.as_bytes(),
            self.tag_sequence.as_bytes(),
            self.begin_ungapped_mirna,
            self.begin_ungapped_tag,
            self.mir_tag_size_diff,
        );
        ClassifiedTag {
            grouped_type: c.variant_type.group(),
            mirna_name: self.mirna_name,
            tag_sequence: self.tag_sequence,
            begin_ungapped_mirna: self.begin_ungapped_mirna,
            begin_ungapped_tag: self.begin_ungapped_tag,
            mirna_seq: self.mirna_seq,
            mir_tag_size_diff: self.mir_tag_size_diff,
            count: self.count,
            nt_diff_5p: c.nt_diff_5p,
            snp_count: c.snp_count,
            nt_diff_3p: c.nt_diff_3p,
            variant_type: c.variant_type,
            annotation: c.display_name,
            detailed_annotation: c.detailed_name,
        }
    }
}

/// 分类结果：原始列在前，派生列追加在后
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTag {
    pub mirna_name: String,
    pub tag_sequence: String,
    pub begin_ungapped_mirna: usize,
    pub begin_ungapped_tag: usize,
    pub mirna_seq: String,
    pub mir_tag_size_diff: i32,
    #[serde(rename = "#count_tags", alias = "count")]
    pub count: u64,
    #[serde(rename = "5p_nt_diff")]
    pub nt_diff_5p: i32,
    #[serde(rename = "snp_nt")]
    pub snp_count: u32,
    #[serde(rename = "3p_nt_diff")]
    pub nt_diff_3p: i32,
    #[serde(rename = "type")]
    pub variant_type: VariantType,
    pub grouped_type: VariantGroup,
    pub annotation: String,
    pub detailed_annotation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_appends_fields_and_passes_count_through() {
        let rec = TagRecord {
            mirna_name: "let-7a-5p".into(),
            tag_sequence: "UGAGGUAGUAGGUUGUAUAGUUU".into(),
            begin_ungapped_mirna: 0,
            begin_ungapped_tag: 0,
            mirna_seq: "UGAGGUAGUAGGUUGUAUAGUU".into(),
            mir_tag_size_diff: -1,
            count: 42,
        };
        let c = rec.clone().classify();
        assert_eq!(c.count, 42);
        assert_eq!(c.tag_sequence, rec.tag_sequence);
        assert_eq!((c.nt_diff_5p, c.snp_count, c.nt_diff_3p), (0, 0, 1));
        assert_eq!(c.variant_type, VariantType::Iso3pOnly);
        assert_eq!(c.grouped_type, VariantGroup::ThreePrime);
        assert_eq!(c.annotation, "let-7a-5p(3'+1)");
        assert_eq!(c.detailed_annotation, "let-7a-5p(3'+1:U)");
    }
}
