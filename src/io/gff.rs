use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{IsomirError, Result};
use crate::precursor::{MirnaLocus, Strand};

/// 成熟 miRNA 在 miRBase GFF3 中的 feature 类型
pub const MATURE_FEATURE: &str = "miRNA";

/// 第 9 列按 `;` 拆分，每段再按第一个 `=` 拆成键值对，与字段顺序无关
pub fn parse_attributes(field: &str) -> HashMap<&str, &str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|kv| !kv.is_empty())
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

/// 读取所有成熟 miRNA 位点；注释行与其他 feature 类型被跳过
pub fn read_mirna_loci<R: BufRead>(reader: R, path: &Path) -> Result<Vec<MirnaLocus>> {
    let mut loci = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx as u64 + 1;
        let parse_err = |reason: String| IsomirError::Parse { path: path.to_path_buf(), line: line_no, reason };

        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let cols: Vec<&str> = trimmed.split('\t').collect();
        if cols.len() < 9 {
            return Err(parse_err(format!("expected 9 tab-separated columns, found {}", cols.len())));
        }
        if cols[2] != MATURE_FEATURE {
            continue;
        }

        let start: u64 = cols[3]
            .parse()
            .map_err(|_| parse_err(format!("start '{}' is not an integer", cols[3])))?;
        let end: u64 = cols[4]
            .parse()
            .map_err(|_| parse_err(format!("end '{}' is not an integer", cols[4])))?;
        let strand: Strand = cols[6].parse().map_err(|e: IsomirError| parse_err(e.to_string()))?;

        let attrs = parse_attributes(cols[8]);
        let name = attrs
            .get("Name")
            .ok_or_else(|| parse_err("missing 'Name' attribute".to_string()))?;

        loci.push(MirnaLocus {
            name: (*name).to_string(),
            chrom: cols[0].to_string(),
            start,
            end,
            strand,
        });
    }
    Ok(loci)
}

pub fn load_mirna_loci(path: &Path) -> Result<Vec<MirnaLocus>> {
    let fh = std::fs::File::open(path)?;
    read_mirna_loci(std::io::BufReader::new(fh), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GFF: &str = "##gff-version 3\n\
# date 2018-10-29\n\
chr1\t.\tmiRNA_primary_transcript\t100\t180\t.\t+\t.\tID=MI0000001;Alias=MI0000001;Name=hsa-let-7a-1\n\
chr1\t.\tmiRNA\t106\t127\t.\t+\t.\tID=MIMAT0000062;Alias=MIMAT0000062;Name=hsa-let-7a-5p;Derives_from=MI0000001\n\
chr2\t.\tmiRNA\t50\t71\t.\t-\t.\tName=hsa-miR-21-5p;ID=MIMAT0000076\n";

    #[test]
    fn attributes_are_order_independent() {
        let a = parse_attributes("ID=X1;Name=mir-1;Derives_from=P1");
        let b = parse_attributes("Derives_from=P1; Name=mir-1 ;ID=X1;");
        assert_eq!(a, b);
        assert_eq!(a["Name"], "mir-1");
        assert!(parse_attributes("novalue;;").is_empty());
    }

    #[test]
    fn reads_only_mature_features() {
        let loci = read_mirna_loci(Cursor::new(GFF), Path::new("test.gff3")).unwrap();
        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].name, "hsa-let-7a-5p");
        assert_eq!((loci[0].start, loci[0].end, loci[0].strand), (106, 127, Strand::Forward));
        assert_eq!(loci[1].name, "hsa-miR-21-5p");
        assert_eq!(loci[1].chrom, "chr2");
        assert_eq!(loci[1].strand, Strand::Reverse);
    }

    #[test]
    fn malformed_lines_report_position() {
        let bad = "chr1\t.\tmiRNA\tabc\t127\t.\t+\t.\tName=x\n";
        let err = read_mirna_loci(Cursor::new(bad), Path::new("a.gff3")).unwrap_err();
        assert!(err.to_string().starts_with("a.gff3:1:"));

        let no_name = "chr1\t.\tmiRNA\t1\t22\t.\t+\t.\tID=x\n";
        assert!(read_mirna_loci(Cursor::new(no_name), Path::new("a.gff3")).is_err());

        let short = "chr1\tmiRNA\t1\n";
        assert!(read_mirna_loci(Cursor::new(short), Path::new("a.gff3")).is_err());
    }
}
