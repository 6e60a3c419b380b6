use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{IsomirError, Result};
use crate::record::TagRecord;
use crate::util::dna;

/// `>hsa-let-7a-5p MIMAT0000062 Homo sapiens ...` → `hsa-let-7a-5p`
pub fn clean_mirna_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('>')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

fn lossy_record(raw: &csv::ByteRecord) -> csv::StringRecord {
    raw.iter().map(String::from_utf8_lossy).collect()
}

/// 读取 isomiR-SEA 的制表符分隔输出。
///
/// 缺列或偏移量不是非负整数时整个文件报错；含 N 的 tag 在这里被丢弃。
/// 字段按字节读取，非 UTF-8 内容（如 latin-1 描述）以替换字符解码，不会使整个文件失败。
pub fn read_tag_records<R: Read>(reader: R, path: &Path) -> Result<Vec<TagRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let parse_err = |line: u64, e: csv::Error| IsomirError::Parse {
        path: path.to_path_buf(),
        line,
        reason: e.to_string(),
    };

    let headers = lossy_record(rdr.byte_headers().map_err(|e| parse_err(1, e))?);
    let mut raw = csv::ByteRecord::new();
    let mut records = Vec::new();
    let mut ambiguous = 0usize;
    loop {
        match rdr.read_byte_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                let line = e.position().map(csv::Position::line).unwrap_or(0);
                return Err(parse_err(line, e));
            }
        }
        let line = raw.position().map(csv::Position::line).unwrap_or(0);
        let mut rec: TagRecord = lossy_record(&raw)
            .deserialize(Some(&headers))
            .map_err(|e| parse_err(line, e))?;
        if dna::has_ambiguous(rec.tag_sequence.as_bytes()) {
            ambiguous += 1;
            continue;
        }
        rec.mirna_name = clean_mirna_name(&rec.mirna_name);
        records.push(rec);
    }

    debug!(path = %path.display(), kept = records.len(), ambiguous, "read isomiR-SEA table");
    Ok(records)
}

pub fn load_tag_records(path: &Path) -> Result<Vec<TagRecord>> {
    let fh = std::fs::File::open(path)?;
    read_tag_records(std::io::BufReader::new(fh), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "mirna_name\ttag_sequence\tbegin_ungapped_mirna\tbegin_ungapped_tag\tmirna_seq\tmir_tag_size_diff\t#count_tags\textra\n";

    #[test]
    fn names_are_reduced_to_first_token() {
        assert_eq!(clean_mirna_name(">hsa-let-7a-5p MIMAT0000062 Homo sapiens"), "hsa-let-7a-5p");
        assert_eq!(clean_mirna_name("sja-bantam"), "sja-bantam");
    }

    #[test]
    fn reads_rows_and_drops_ambiguous_tags() {
        let data = format!(
            "{HEADER}\
>let-7a MIMAT1\tAUGAGGUAGUAGGUUGUAUAGUU\t0\t1\tUGAGGUAGUAGGUUGUAUAGUU\t-1\t12\tx\n\
>let-7a MIMAT1\tUGAGGUAGNAGGUUGUAUAGUU\t0\t0\tUGAGGUAGUAGGUUGUAUAGUU\t0\t3\tx\n"
        );
        let recs = read_tag_records(Cursor::new(data), Path::new("rep1.txt")).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].mirna_name, "let-7a");
        assert_eq!(recs[0].begin_ungapped_tag, 1);
        assert_eq!(recs[0].mir_tag_size_diff, -1);
        assert_eq!(recs[0].count, 12);
    }

    #[test]
    fn non_integer_offset_is_fatal() {
        let data = format!("{HEADER}let-7a\tACGU\tzero\t0\tACGU\t0\t1\tx\n");
        let err = read_tag_records(Cursor::new(data), Path::new("rep1.txt")).unwrap_err();
        assert!(matches!(err, IsomirError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn latin1_descriptions_are_decoded_lossily() {
        let mut data = HEADER.as_bytes().to_vec();
        data.extend_from_slice(b">mir-1 caf\xe9 desc\tACGU\t0\t0\tACGU\t0\t11\tx\n");
        let recs = read_tag_records(Cursor::new(data), Path::new("rep1.txt")).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].mirna_name, "mir-1");
        assert_eq!(recs[0].count, 11);
    }

    #[test]
    fn missing_column_is_fatal() {
        let data = "mirna_name\ttag_sequence\nlet-7a\tACGU\n";
        assert!(read_tag_records(Cursor::new(data), Path::new("rep1.txt")).is_err());
    }
}
