pub mod extension;
pub mod summary;

use std::fmt;

pub use extension::{extension_positions, End, ExtensionPosition};
pub use summary::{ExtensionTally, TemplatedProfile};

use crate::error::{IsomirError, Result};
use crate::precursor::{DatasetWindow, ExtendedPrecursor};
use crate::util::dna::{self, BLANK};

/// 某一窗口位置上 tag 碱基与基因组模板的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Templated {
    Templated,
    Nontemplated,
    /// 该位置 tag 没有覆盖
    NotApplicable,
}

impl Templated {
    pub fn symbol(self) -> char {
        match self {
            Templated::Templated => '+',
            Templated::Nontemplated => '-',
            Templated::NotApplicable => ' ',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentRow {
    /// 1-based 窗口位置
    pub position: usize,
    /// 小写的 tag 碱基；`None` 表示空白
    pub nucleotide: Option<u8>,
    pub templated: Templated,
}

impl AlignmentRow {
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.nucleotide.is_none()
    }
}

impl fmt::Display for AlignmentRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nucleotide {
            Some(nt) => write!(f, "({}, {})", nt as char, self.templated.symbol()),
            None => f.write_str("(' ', ' ')"),
        }
    }
}

/// tag 两端相对 canonical 的整体走向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndStatus {
    Extended,
    Truncated,
    /// 两端都不变，或一端延伸一端截短
    Unlabeled,
}

impl EndStatus {
    pub fn from_deltas(nt_diff_5p: i32, nt_diff_3p: i32) -> Self {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match (nt_diff_5p.cmp(&0), nt_diff_3p.cmp(&0)) {
            (Less, Equal) | (Equal, Less) | (Less, Less) => EndStatus::Truncated,
            (Greater, Equal) | (Equal, Greater) | (Greater, Greater) => EndStatus::Extended,
            (Less, Greater) | (Greater, Less) | (Equal, Equal) => EndStatus::Unlabeled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndStatus::Extended => "extended",
            EndStatus::Truncated => "truncated",
            EndStatus::Unlabeled => "",
        }
    }
}

/// 把 tag 放进扩展前体窗口：前面补 `max_nt_diff_5p - nt_diff_5p` 个空白，
/// 后面补空白直到与前体等长。放不下时报错，绝不截断。
pub fn align_to_precursor(
    mirna: &str,
    max_nt_diff_5p: u32,
    nt_diff_5p: i32,
    precursor: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>> {
    let start = max_nt_diff_5p as i64 - nt_diff_5p as i64;
    if start < 0 || start as usize + tag.len() > precursor.len() {
        return Err(IsomirError::WindowOverflow {
            mirna: mirna.to_string(),
            tag: String::from_utf8_lossy(tag).into_owned(),
            start,
            tag_len: tag.len(),
            window_len: precursor.len(),
        });
    }
    let start = start as usize;

    let mut padded = Vec::with_capacity(precursor.len());
    padded.resize(start, BLANK);
    padded.extend_from_slice(tag);
    padded.resize(precursor.len(), BLANK);
    Ok(padded)
}

/// 逐位置比较前体与补齐后的 tag
pub fn match_positions(precursor: &[u8], padded: &[u8]) -> Result<Vec<AlignmentRow>> {
    if precursor.len() != padded.len() {
        return Err(IsomirError::invalid(
            String::from_utf8_lossy(padded).trim(),
            format!("padded tag length {} differs from precursor length {}", padded.len(), precursor.len()),
        ));
    }

    let rows = precursor
        .iter()
        .zip(padded)
        .enumerate()
        .map(|(i, (&pre, &iso))| {
            let position = i + 1;
            if iso == BLANK {
                AlignmentRow { position, nucleotide: None, templated: Templated::NotApplicable }
            } else {
                let templated = if dna::same_base(pre, iso) {
                    Templated::Templated
                } else {
                    Templated::Nontemplated
                };
                AlignmentRow { position, nucleotide: Some(iso.to_ascii_lowercase()), templated }
            }
        })
        .collect();
    Ok(rows)
}

/// 单个 tag 在窗口中的完整比对结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAlignment {
    pub padded: Vec<u8>,
    pub rows: Vec<AlignmentRow>,
    pub status: EndStatus,
}

pub fn align_tag(
    precursor: &ExtendedPrecursor,
    window: DatasetWindow,
    tag: &[u8],
    nt_diff_5p: i32,
    nt_diff_3p: i32,
) -> Result<TagAlignment> {
    let padded = align_to_precursor(&precursor.name, window.max_nt_diff_5p, nt_diff_5p, &precursor.sequence, tag)?;
    let rows = match_positions(&precursor.sequence, &padded)?;
    Ok(TagAlignment { padded, rows, status: EndStatus::from_deltas(nt_diff_5p, nt_diff_3p) })
}
