use std::fmt;

use crate::precursor::DatasetWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum End {
    Five,
    Three,
}

/// canonical 边界之外的延伸位置，如 `5'+1`（紧邻 canonical 起点）或 `3'+2`。
/// 标签相对前体而言，对同一 miRNA 的所有 tag 都相同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionPosition {
    pub end: End,
    /// 距 canonical 边界的碱基数，从 1 开始
    pub offset: u32,
    /// 1-based 窗口位置
    pub position: usize,
}

impl fmt::Display for ExtensionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            End::Five => write!(f, "5'+{}", self.offset),
            End::Three => write!(f, "3'+{}", self.offset),
        }
    }
}

/// 5' 延伸位置（`5'+1 .. 5'+max5`）后接 3' 延伸位置（`3'+1 .. 3'+max3`）
pub fn extension_positions(window: DatasetWindow, precursor_len: usize) -> Vec<ExtensionPosition> {
    let max5 = window.max_nt_diff_5p;
    let max3 = window.max_nt_diff_3p;
    let mut out = Vec::with_capacity((max5 + max3) as usize);

    for offset in 1..=max5 {
        out.push(ExtensionPosition { end: End::Five, offset, position: (max5 - offset + 1) as usize });
    }
    let three_start = precursor_len.saturating_sub(max3 as usize);
    for offset in 1..=max3 {
        out.push(ExtensionPosition { end: End::Three, offset, position: three_start + offset as usize });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_count_outward_from_canonical() {
        let pos = extension_positions(DatasetWindow::new(3, 2), 27);
        let labels: Vec<String> = pos.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["5'+1", "5'+2", "5'+3", "3'+1", "3'+2"]);
        let idx: Vec<usize> = pos.iter().map(|p| p.position).collect();
        assert_eq!(idx, [3, 2, 1, 26, 27]);
    }

    #[test]
    fn empty_window_has_no_extension_positions() {
        assert!(extension_positions(DatasetWindow::default(), 22).is_empty());
    }
}
