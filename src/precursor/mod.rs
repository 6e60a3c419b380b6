pub mod locus;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use locus::{MirnaLocus, Strand};

use crate::error::{IsomirError, Result};
use crate::util::dna;

const CSV_SUFFIX: &str = "_extended_precursor_seqs.csv";

/// 数据集范围内观察到的最大 5' / 3' 延伸，决定扩展前体窗口的宽度。
/// 截短（负值）不会扩大窗口，因此两个分量都从 0 开始。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetWindow {
    pub max_nt_diff_5p: u32,
    pub max_nt_diff_3p: u32,
}

impl DatasetWindow {
    pub fn new(max_nt_diff_5p: u32, max_nt_diff_3p: u32) -> Self {
        Self { max_nt_diff_5p, max_nt_diff_3p }
    }

    pub fn observe(&mut self, nt_diff_5p: i32, nt_diff_3p: i32) {
        if nt_diff_5p > 0 {
            self.max_nt_diff_5p = self.max_nt_diff_5p.max(nt_diff_5p as u32);
        }
        if nt_diff_3p > 0 {
            self.max_nt_diff_3p = self.max_nt_diff_3p.max(nt_diff_3p as u32);
        }
    }

    /// 结合律成立，可用于 rayon 的并行归约
    pub fn merge(self, other: Self) -> Self {
        Self {
            max_nt_diff_5p: self.max_nt_diff_5p.max(other.max_nt_diff_5p),
            max_nt_diff_3p: self.max_nt_diff_3p.max(other.max_nt_diff_3p),
        }
    }

    pub fn from_deltas<I: IntoIterator<Item = (i32, i32)>>(deltas: I) -> Self {
        let mut w = Self::default();
        for (d5, d3) in deltas {
            w.observe(d5, d3);
        }
        w
    }

    /// 窗口两端总共多出的碱基数
    pub fn flank_len(self) -> usize {
        (self.max_nt_diff_5p + self.max_nt_diff_3p) as usize
    }

    pub fn csv_file_name(self) -> String {
        format!("{}_{}{}", self.max_nt_diff_5p, self.max_nt_diff_3p, CSV_SUFFIX)
    }

    /// 从 `{max5}_{max3}_extended_precursor_seqs.csv` 解析窗口
    pub fn from_csv_file_name(file_name: &str) -> Result<Self> {
        let bad = || IsomirError::invalid(file_name, "expected '<max5>_<max3>_extended_precursor_seqs.csv'");
        let stem = file_name.strip_suffix(CSV_SUFFIX).ok_or_else(bad)?;
        let (d5, d3) = stem.split_once('_').ok_or_else(bad)?;
        let d5: u32 = d5.parse().map_err(|_| bad())?;
        let d3: u32 = d3.parse().map_err(|_| bad())?;
        Ok(Self::new(d5, d3))
    }
}

/// 单个 miRNA 的扩展前体序列：canonical 区段小写，两侧延伸大写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedPrecursor {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl ExtendedPrecursor {
    /// `raw` 为已按链方向取出的窗口序列（DNA 或 RNA 均可）
    pub fn from_window_sequence(name: &str, raw: &[u8], window: DatasetWindow) -> Result<Self> {
        if raw.len() <= window.flank_len() {
            return Err(IsomirError::invalid(
                name,
                format!(
                    "window sequence of length {} leaves no canonical span for flanks {}+{}",
                    raw.len(),
                    window.max_nt_diff_5p,
                    window.max_nt_diff_3p
                ),
            ));
        }
        let mut sequence = dna::to_rna(raw);
        let start = window.max_nt_diff_5p as usize;
        let end = sequence.len() - window.max_nt_diff_3p as usize;
        dna::lowercase_span(&mut sequence, start, end);
        Ok(Self { name: name.to_string(), sequence })
    }

    /// 直接使用外部提供的序列（例如 CSV 中已标记大小写的序列）
    pub fn from_marked_sequence(name: &str, sequence: &[u8]) -> Self {
        Self { name: name.to_string(), sequence: sequence.to_vec() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.sequence)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PrecursorMeta {
    pub genome_file: Option<String>,
    pub annotation_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 数据集的全部扩展前体，构建后只读，在所有 tag 之间共享。
#[derive(Debug, Serialize, Deserialize)]
pub struct PrecursorSet {
    pub window: DatasetWindow,
    pub precursors: BTreeMap<String, ExtendedPrecursor>,
    #[serde(default)]
    pub meta: PrecursorMeta,
}

impl PrecursorSet {
    pub fn new(window: DatasetWindow) -> Self {
        Self { window, precursors: BTreeMap::new(), meta: PrecursorMeta::default() }
    }

    /// 同名 miRNA 出现多次时保留第一条
    pub fn insert(&mut self, precursor: ExtendedPrecursor) -> bool {
        if self.precursors.contains_key(&precursor.name) {
            debug!(mirna = %precursor.name, "duplicate precursor ignored");
            return false;
        }
        self.precursors.insert(precursor.name.clone(), precursor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ExtendedPrecursor> {
        self.precursors.get(name)
    }

    pub fn len(&self) -> usize {
        self.precursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precursors.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.precursors.values().map(ExtendedPrecursor::len).max().unwrap_or(0)
    }

    pub fn set_meta(&mut self, meta: PrecursorMeta) {
        self.meta = meta;
    }

    /// 按注释位点从基因组中取出每个 miRNA 的扩展窗口。
    /// 位点本身出错（染色体缺失、越界）即中止，并报告 miRNA 名称。
    pub fn build(window: DatasetWindow, loci: &[MirnaLocus], genome: &HashMap<String, Vec<u8>>) -> Result<Self> {
        let mut set = Self::new(window);
        for locus in loci {
            let raw = locus.extract(window, genome)?;
            let pre = ExtendedPrecursor::from_window_sequence(&locus.name, &raw, window)?;
            if !set.insert(pre) {
                warn!(mirna = %locus.name, chrom = %locus.chrom, start = locus.start, "miRNA annotated more than once; keeping first locus");
            }
        }
        Ok(set)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let f = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let set: Self = bincode::deserialize_from(std::io::BufReader::new(f))?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_ignores_trimming() {
        let w = DatasetWindow::from_deltas([(1, -3), (-2, 2), (0, 0), (3, 1)]);
        assert_eq!(w, DatasetWindow::new(3, 2));
        assert_eq!(DatasetWindow::from_deltas([(-1, -1)]), DatasetWindow::default());
    }

    #[test]
    fn window_merge_is_order_independent() {
        let a = DatasetWindow::new(2, 5);
        let b = DatasetWindow::new(4, 1);
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b), DatasetWindow::new(4, 5));
    }

    #[test]
    fn window_file_name_round_trip() {
        let w = DatasetWindow::new(3, 8);
        assert_eq!(w.csv_file_name(), "3_8_extended_precursor_seqs.csv");
        assert_eq!(DatasetWindow::from_csv_file_name(&w.csv_file_name()).unwrap(), w);
        assert!(DatasetWindow::from_csv_file_name("precursors.csv").is_err());
        assert!(DatasetWindow::from_csv_file_name("x_8_extended_precursor_seqs.csv").is_err());
    }

    #[test]
    fn canonical_span_is_lowercased() {
        let w = DatasetWindow::new(2, 3);
        let p = ExtendedPrecursor::from_window_sequence("m", b"ccTGAGGTAaag", w).unwrap();
        assert_eq!(p.sequence, b"CCugagguaAAG");
        assert_eq!(p.len(), 12);
    }

    #[test]
    fn short_window_sequence_is_rejected() {
        let w = DatasetWindow::new(2, 3);
        assert!(ExtendedPrecursor::from_window_sequence("m", b"ACGUA", w).is_err());
    }

    #[test]
    fn duplicate_names_keep_first() {
        let mut set = PrecursorSet::new(DatasetWindow::default());
        assert!(set.insert(ExtendedPrecursor::from_marked_sequence("m", b"acgu")));
        assert!(!set.insert(ExtendedPrecursor::from_marked_sequence("m", b"gggg")));
        assert_eq!(set.get("m").unwrap().sequence, b"acgu");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.pre");
        let path = path.to_str().unwrap();

        let mut set = PrecursorSet::new(DatasetWindow::new(1, 2));
        set.insert(ExtendedPrecursor::from_marked_sequence("mir-1", b"AuggAA"));
        set.set_meta(PrecursorMeta { genome_file: Some("g.fa".into()), ..Default::default() });
        set.save_to_file(path).unwrap();

        let loaded = PrecursorSet::load_from_file(path).unwrap();
        assert_eq!(loaded.window, set.window);
        assert_eq!(loaded.get("mir-1"), set.get("mir-1"));
        assert_eq!(loaded.meta.genome_file.as_deref(), Some("g.fa"));
    }
}
