use std::collections::BTreeMap;

use serde::Serialize;

use super::extension::{extension_positions, End, ExtensionPosition};
use super::{AlignmentRow, EndStatus, Templated};
use crate::precursor::DatasetWindow;

const NUCLEOTIDES: [u8; 4] = [b'a', b'u', b'c', b'g'];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NucleotideSummaryRecord {
    pub position: String,
    pub nucleotide: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplatedSummaryRecord {
    pub position: String,
    pub templated: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplatedProfileRecord {
    #[serde(rename = "type")]
    pub status: String,
    pub position: String,
    pub templated: String,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Calls {
    nt: [u64; 4],
    templated: u64,
    nontemplated: u64,
}

impl Calls {
    fn add(&mut self, row: &AlignmentRow) {
        if let Some(i) = NUCLEOTIDES.iter().position(|&n| Some(n) == row.nucleotide) {
            self.nt[i] += 1;
        }
        match row.templated {
            Templated::Templated => self.templated += 1,
            Templated::Nontemplated => self.nontemplated += 1,
            Templated::NotApplicable => {}
        }
    }

    fn merge(&mut self, other: &Calls) {
        for (a, b) in self.nt.iter_mut().zip(other.nt) {
            *a += b;
        }
        self.templated += other.templated;
        self.nontemplated += other.nontemplated;
    }
}

fn label(end: End, offset: u32) -> String {
    ExtensionPosition { end, offset, position: 0 }.to_string()
}

/// 延伸位置上的碱基频率与模板/非模板计数。空白位置不计入。
#[derive(Debug, Clone)]
pub struct ExtensionTally {
    window: DatasetWindow,
    counts: BTreeMap<(End, u32), Calls>,
}

impl ExtensionTally {
    /// 所有延伸位置预先置零，保证输出行齐全
    pub fn new(window: DatasetWindow) -> Self {
        let mut counts = BTreeMap::new();
        for offset in 1..=window.max_nt_diff_5p {
            counts.insert((End::Five, offset), Calls::default());
        }
        for offset in 1..=window.max_nt_diff_3p {
            counts.insert((End::Three, offset), Calls::default());
        }
        Self { window, counts }
    }

    pub fn add(&mut self, rows: &[AlignmentRow]) {
        for ext in extension_positions(self.window, rows.len()) {
            let Some(row) = ext.position.checked_sub(1).and_then(|i| rows.get(i)) else {
                continue;
            };
            if row.is_blank() {
                continue;
            }
            self.counts.entry((ext.end, ext.offset)).or_default().add(row);
        }
    }

    pub fn merge(&mut self, other: &ExtensionTally) {
        for (key, calls) in &other.counts {
            self.counts.entry(*key).or_default().merge(calls);
        }
    }

    pub fn nucleotide_records(&self) -> Vec<NucleotideSummaryRecord> {
        let mut out = Vec::with_capacity(self.counts.len() * NUCLEOTIDES.len());
        for (&(end, offset), calls) in &self.counts {
            for (i, &nt) in NUCLEOTIDES.iter().enumerate() {
                out.push(NucleotideSummaryRecord {
                    position: label(end, offset),
                    nucleotide: (nt as char).to_string(),
                    value: calls.nt[i],
                });
            }
        }
        out
    }

    pub fn templated_records(&self) -> Vec<TemplatedSummaryRecord> {
        let mut out = Vec::with_capacity(self.counts.len() * 2);
        for (&(end, offset), calls) in &self.counts {
            out.push(TemplatedSummaryRecord {
                position: label(end, offset),
                templated: "Templated".to_string(),
                value: calls.templated,
            });
            out.push(TemplatedSummaryRecord {
                position: label(end, offset),
                templated: "Nontemplated".to_string(),
                value: calls.nontemplated,
            });
        }
        out
    }
}

/// 全部窗口位置上的模板/非模板计数，按 extended / truncated 分组。
///
/// 未标记的 tag（两端不变或方向相反）不计入；truncated tag 跳过 5' 延伸位置。
/// 5' 延伸位置标记为 `5'+k`，其余位置标记为相对 canonical 起点的序号。
#[derive(Debug, Clone)]
pub struct TemplatedProfile {
    max_nt_diff_5p: u32,
    counts: BTreeMap<(EndStatus, usize), Calls>,
}

impl TemplatedProfile {
    /// `width` 为最长前体的长度；所有位置预先置零，各重复的输出行一致
    pub fn new(window: DatasetWindow, width: usize) -> Self {
        let max5 = window.max_nt_diff_5p as usize;
        let mut counts = BTreeMap::new();
        for position in 1..=width {
            counts.insert((EndStatus::Extended, position), Calls::default());
            if position > max5 {
                counts.insert((EndStatus::Truncated, position), Calls::default());
            }
        }
        Self { max_nt_diff_5p: window.max_nt_diff_5p, counts }
    }

    pub fn add(&mut self, status: EndStatus, rows: &[AlignmentRow]) {
        if status == EndStatus::Unlabeled {
            return;
        }
        let max5 = self.max_nt_diff_5p as usize;
        for row in rows {
            if status == EndStatus::Truncated && row.position <= max5 {
                continue;
            }
            let calls = self.counts.entry((status, row.position)).or_default();
            calls.add(row);
        }
    }

    pub fn merge(&mut self, other: &TemplatedProfile) {
        for (key, calls) in &other.counts {
            self.counts.entry(*key).or_default().merge(calls);
        }
    }

    fn position_label(&self, position: usize) -> String {
        let max5 = self.max_nt_diff_5p as usize;
        if position <= max5 {
            format!("5'+{}", max5 - position + 1)
        } else {
            (position - max5).to_string()
        }
    }

    pub fn records(&self) -> Vec<TemplatedProfileRecord> {
        let mut out = Vec::with_capacity(self.counts.len() * 2);
        for (&(status, position), calls) in &self.counts {
            let position = self.position_label(position);
            for (kind, value) in [("Templated", calls.templated), ("Nontemplated", calls.nontemplated)] {
                out.push(TemplatedProfileRecord {
                    status: status.as_str().to_string(),
                    position: position.clone(),
                    templated: kind.to_string(),
                    value,
                });
            }
        }
        out
    }
}
