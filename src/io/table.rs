use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::align::{EndStatus, TagAlignment};
use crate::error::{IsomirError, Result};
use crate::precursor::{DatasetWindow, ExtendedPrecursor, PrecursorSet};
use crate::record::ClassifiedTag;

pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_classified(path: &Path) -> Result<Vec<ClassifiedTag>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for result in rdr.deserialize::<ClassifiedTag>() {
        out.push(result.map_err(|e| IsomirError::Parse {
            path: path.to_path_buf(),
            line: e.position().map(csv::Position::line).unwrap_or(0),
            reason: e.to_string(),
        })?);
    }
    Ok(out)
}

#[derive(Debug, Serialize, Deserialize)]
struct PrecursorRow {
    mir_name: String,
    extended_precursor_seq: String,
}

/// 写出 `{max5}_{max3}_extended_precursor_seqs.csv`，返回文件路径
pub fn write_precursor_csv(dir: &Path, set: &PrecursorSet) -> Result<PathBuf> {
    let path = dir.join(set.window.csv_file_name());
    let rows: Vec<PrecursorRow> = set
        .precursors
        .values()
        .map(|p| PrecursorRow { mir_name: p.name.clone(), extended_precursor_seq: p.as_str().into_owned() })
        .collect();
    write_records(&path, &rows)?;
    Ok(path)
}

/// 读取外部提供的前体表；窗口大小由文件名给出
pub fn read_precursor_csv(path: &Path) -> Result<PrecursorSet> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IsomirError::invalid(path.display().to_string(), "not a file path"))?;
    let window = DatasetWindow::from_csv_file_name(file_name)?;

    let mut set = PrecursorSet::new(window);
    let mut rdr = csv::Reader::from_path(path)?;
    for result in rdr.deserialize::<PrecursorRow>() {
        let row = result?;
        set.insert(ExtendedPrecursor::from_marked_sequence(&row.mir_name, row.extended_precursor_seq.as_bytes()));
    }
    Ok(set)
}

/// 逐 miRNA 写出前体行及其所有 tag 的逐位置比对行
pub struct AlignmentWriter<W: Write> {
    wtr: csv::Writer<W>,
    width: usize,
}

impl AlignmentWriter<std::fs::File> {
    pub fn create(path: &Path, width: usize) -> Result<Self> {
        Self::new(std::fs::File::create(path)?, width)
    }
}

impl<W: Write> AlignmentWriter<W> {
    /// `width` 为最长前体的长度，决定位置列的数量
    pub fn new(inner: W, width: usize) -> Result<Self> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        let mut header: Vec<String> = ["name", "pre_seq", "is_pre", "extended_or_truncated"]
            .iter()
            .map(ToString::to_string)
            .collect();
        header.extend((1..=width).map(|i| i.to_string()));
        wtr.write_record(&header)?;
        Ok(Self { wtr, width })
    }

    pub fn write_precursor(&mut self, precursor: &ExtendedPrecursor) -> Result<()> {
        let seq = precursor.as_str();
        let mut row: Vec<String> = vec![precursor.name.clone(), seq.to_string(), "True".into(), String::new()];
        row.extend(seq.chars().map(String::from));
        self.pad(&mut row);
        self.wtr.write_record(&row)?;
        Ok(())
    }

    pub fn write_tag(&mut self, mirna: &str, aln: &TagAlignment) -> Result<()> {
        let status: EndStatus = aln.status;
        let mut row: Vec<String> = vec![
            mirna.to_string(),
            String::from_utf8_lossy(&aln.padded).into_owned(),
            "False".into(),
            status.as_str().into(),
        ];
        row.extend(aln.rows.iter().map(ToString::to_string));
        self.pad(&mut row);
        self.wtr.write_record(&row)?;
        Ok(())
    }

    /// 较短的前体在行尾补空列，使每行列数一致
    fn pad(&self, row: &mut Vec<String>) {
        let total = 4 + self.width;
        if row.len() < total {
            row.resize(total, String::new());
        }
    }

    pub fn finish(mut self) -> Result<W> {
        self.wtr.flush()?;
        self.wtr.into_inner().map_err(|e| IsomirError::Io(e.into_error()))
    }
}
