use criterion::{black_box, criterion_group, criterion_main, Criterion};

use isomir_rust::align::{align_tag, align_to_precursor, match_positions, ExtensionTally, TemplatedProfile};
use isomir_rust::classify;
use isomir_rust::precursor::{DatasetWindow, ExtendedPrecursor};

fn make_sequence(len: usize, seed: u32) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'U'];
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = seed;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(bases[(x >> 16) as usize % 4]);
    }
    seq
}

/// 对随机 tag 做 5' 延伸一个碱基、3' 截短两个碱基并引入一个替换
fn make_isomir(canonical: &[u8]) -> Vec<u8> {
    let mut tag = Vec::with_capacity(canonical.len());
    tag.push(b'A');
    tag.extend_from_slice(&canonical[..canonical.len() - 2]);
    tag[10] = if tag[10] == b'C' { b'G' } else { b'C' };
    tag
}

fn bench_classify(c: &mut Criterion) {
    let canonical = make_sequence(22, 42);
    let tag = make_isomir(&canonical);
    let size_diff = canonical.len() as i32 - tag.len() as i32;

    c.bench_function("classify_22nt", |b| {
        b.iter(|| {
            black_box(classify::classify(
                black_box("mir-bench"),
                black_box(&canonical),
                black_box(&tag),
                0,
                1,
                size_diff,
            ));
        })
    });
}

fn bench_place_and_match(c: &mut Criterion) {
    let window = DatasetWindow::new(6, 8);
    let raw = make_sequence(22 + window.flank_len(), 7);
    let pre = ExtendedPrecursor::from_window_sequence("mir-bench", &raw, window).unwrap();
    let tag = raw[5..27].to_vec();

    c.bench_function("align_to_precursor_36nt", |b| {
        b.iter(|| {
            black_box(align_to_precursor("mir-bench", 6, 1, black_box(&pre.sequence), black_box(&tag)).unwrap());
        })
    });

    let padded = align_to_precursor("mir-bench", 6, 1, &pre.sequence, &tag).unwrap();
    c.bench_function("match_positions_36nt", |b| {
        b.iter(|| {
            black_box(match_positions(black_box(&pre.sequence), black_box(&padded)).unwrap());
        })
    });
}

fn bench_tallies(c: &mut Criterion) {
    let window = DatasetWindow::new(4, 6);
    let raw = make_sequence(22 + window.flank_len(), 11);
    let pre = ExtendedPrecursor::from_window_sequence("mir-bench", &raw, window).unwrap();
    let alignments: Vec<_> = (0..1_000)
        .map(|i| {
            let nt5 = (i % 9) as i32 - 4;
            let nt3 = (i % 11) as i32 - 4;
            let start = (4 - nt5) as usize;
            let end = (26 + nt3) as usize;
            align_tag(&pre, window, &raw[start..end], nt5, nt3).unwrap()
        })
        .collect();

    c.bench_function("extension_tally_1k_tags", |b| {
        b.iter(|| {
            let mut tally = ExtensionTally::new(window);
            let mut profile = TemplatedProfile::new(window, pre.len());
            for aln in &alignments {
                tally.add(&aln.rows);
                profile.add(aln.status, &aln.rows);
            }
            black_box((tally.nucleotide_records(), profile.records()));
        })
    });
}

criterion_group!(benches, bench_classify, bench_place_and_match, bench_tallies);
criterion_main!(benches);
