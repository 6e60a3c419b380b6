/// 窗口中未被 tag 覆盖的位置用空格表示
pub const BLANK: u8 = b' ';

/// 大小写不敏感的碱基比较，字符按字面比较，不做字母表校验
#[inline]
pub fn same_base(a: u8, b: u8) -> bool {
    a.eq_ignore_ascii_case(&b)
}

/// 转为大写 RNA：T/t → U，其余字符原样大写
pub fn to_rna(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        out.push(if up == b'T' { b'U' } else { up });
    }
    out
}

/// 含有 N（模糊碱基）的 tag 在进入分类之前被过滤
#[inline]
pub fn has_ambiguous(seq: &[u8]) -> bool {
    seq.iter().any(|&b| b == b'N' || b == b'n')
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

/// 将 [start, end) 区间小写，其余保持原样；越界部分忽略
pub fn lowercase_span(seq: &mut [u8], start: usize, end: usize) {
    let end = end.min(seq.len());
    if start >= end {
        return;
    }
    seq[start..end].make_ascii_lowercase();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rna_conversion_uppercases_and_swaps_t() {
        assert_eq!(to_rna(b"acgtN"), b"ACGUN");
        assert_eq!(to_rna(b"UUU"), b"UUU");
    }

    #[test]
    fn revcomp_handles_rna_input() {
        assert_eq!(revcomp(b"ACGU"), b"ACGT");
        assert_eq!(revcomp(b"aacg"), b"CGTT");
    }

    #[test]
    fn ambiguous_detection() {
        assert!(has_ambiguous(b"ACNU"));
        assert!(has_ambiguous(b"acnu"));
        assert!(!has_ambiguous(b"ACGU"));
    }

    #[test]
    fn lowercase_span_clamps() {
        let mut s = b"AAAAAA".to_vec();
        lowercase_span(&mut s, 2, 4);
        assert_eq!(s, b"AAaaAA");
        lowercase_span(&mut s, 5, 99);
        assert_eq!(s, b"AAaaAa");
        lowercase_span(&mut s, 4, 1);
        assert_eq!(s, b"AAaaAa");
    }
}
