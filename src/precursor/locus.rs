use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DatasetWindow;
use crate::error::{IsomirError, Result};
use crate::util::dna;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl FromStr for Strand {
    type Err = IsomirError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(IsomirError::invalid(other, "strand must be '+' or '-'")),
        }
    }
}

/// 成熟 miRNA 的基因组位点，坐标沿用 GFF3 约定（1-based，闭区间）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirnaLocus {
    pub name: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl MirnaLocus {
    /// 扩展窗口的 0-based 半开区间 [begin, end)。
    /// 负链上 5' 端位于基因组坐标较大的一侧，因此两侧延伸长度互换。
    pub fn extended_range(&self, window: DatasetWindow) -> Result<(u64, u64)> {
        if self.start == 0 || self.end < self.start {
            return Err(IsomirError::invalid(
                &self.name,
                format!("bad coordinates {}..{}", self.start, self.end),
            ));
        }
        let (upstream, downstream) = match self.strand {
            Strand::Forward => (window.max_nt_diff_5p as u64, window.max_nt_diff_3p as u64),
            Strand::Reverse => (window.max_nt_diff_3p as u64, window.max_nt_diff_5p as u64),
        };
        let begin = (self.start - 1).checked_sub(upstream).ok_or_else(|| {
            IsomirError::invalid(
                &self.name,
                format!("extended window runs past the start of {} ({} bases upstream of {})", self.chrom, upstream, self.start),
            )
        })?;
        Ok((begin, self.end + downstream))
    }

    /// 从基因组中取出扩展窗口，负链取反向互补，最终为大写 RNA
    pub fn extract(&self, window: DatasetWindow, genome: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        let (begin, end) = self.extended_range(window)?;
        let chrom = genome.get(&self.chrom).ok_or_else(|| {
            IsomirError::invalid(&self.name, format!("chromosome '{}' not found in genome", self.chrom))
        })?;
        if end as usize > chrom.len() {
            return Err(IsomirError::invalid(
                &self.name,
                format!("extended window {}..{} runs past the end of {} (length {})", begin, end, self.chrom, chrom.len()),
            ));
        }
        let slice = &chrom[begin as usize..end as usize];
        let oriented = match self.strand {
            Strand::Forward => slice.to_vec(),
            Strand::Reverse => dna::revcomp(slice),
        };
        Ok(dna::to_rna(&oriented))
    }
}
