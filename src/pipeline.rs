//! 命令行三个阶段：classify → precursor → align。
//!
//! 输入目录均为 `<root>/<group>/<replicate>.<ext>` 两层结构；
//! 并行粒度是 replicate 文件，输出按排序后的顺序写出。

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::align::{align_tag, ExtensionTally, TemplatedProfile};
use crate::io::{fasta, gff, isomir_sea, table};
use crate::precursor::{DatasetWindow, PrecursorMeta, PrecursorSet};
use crate::record::{ClassifiedTag, TagRecord};

pub const DEFAULT_MIN_COUNT: u64 = 10;
pub const PRECURSOR_SET_FILE: &str = "extended_precursors.pre";

pub const ALIGNMENT_DIR: &str = "alignment";
pub const NT_SUMMARY_DIR: &str = "nt_summary";
pub const TEMPLATED_SUMMARY_DIR: &str = "templated_summary";
pub const TEMPLATED_PROFILE_DIR: &str = "templated_profile";

#[derive(Debug, Clone)]
pub struct ClassifyOpt {
    /// tag 在整个数据集中的总 reads 数低于此值即被过滤
    pub min_count: u64,
    pub threads: usize,
}

impl Default for ClassifyOpt {
    fn default() -> Self {
        Self { min_count: DEFAULT_MIN_COUNT, threads: 1 }
    }
}

#[derive(Debug, Clone)]
pub struct PrecursorOpt {
    pub genome: PathBuf,
    pub annotation: PathBuf,
    pub threads: usize,
    /// 写入 `.pre` 元数据的命令行
    pub build_args: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AlignOpt {
    pub threads: usize,
}

impl Default for AlignOpt {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

/// 一个样本组中的一个重复文件
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Replicate {
    pub group: String,
    pub name: String,
    pub path: PathBuf,
}

impl Replicate {
    /// `<root>/<group>/<name>.<ext>`
    pub fn output_path(&self, root: &Path, ext: &str) -> PathBuf {
        root.join(&self.group).join(format!("{}.{}", self.name, ext))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// 列出 `<root>/<group>/<file>`，按 (group, name) 排序。
/// replicate 名取文件名第一个 `.` 之前的部分；同组内重名会写到同一输出文件，直接报错。
pub fn list_replicates(root: &Path) -> Result<Vec<Replicate>> {
    let mut reps = Vec::new();
    let groups = std::fs::read_dir(root).with_context(|| format!("cannot read directory '{}'", root.display()))?;
    for group in groups {
        let group = group?;
        let group_name = group.file_name().to_string_lossy().into_owned();
        if !group.file_type()?.is_dir() || is_hidden(&group_name) {
            continue;
        }
        for file in std::fs::read_dir(group.path())? {
            let file = file?;
            let file_name = file.file_name().to_string_lossy().into_owned();
            if !file.file_type()?.is_file() || is_hidden(&file_name) {
                continue;
            }
            let name = file_name.split('.').next().unwrap_or(&file_name).to_string();
            reps.push(Replicate { group: group_name.clone(), name, path: file.path() });
        }
    }
    reps.sort();
    if let Some(pair) = reps.windows(2).find(|w| w[0].group == w[1].group && w[0].name == w[1].name) {
        bail!(
            "replicate name '{}' in group '{}' is shared by '{}' and '{}'",
            pair[0].name,
            pair[0].group,
            pair[0].path.display(),
            pair[1].path.display()
        );
    }
    Ok(reps)
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("cannot build thread pool")
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create directory '{}'", dir.display()))?;
    }
    Ok(())
}

/// 第一遍：按 tag 序列累加整个数据集（所有组、所有重复）的 reads 数
pub fn tag_totals<'a, I>(tags: I) -> HashMap<&'a str, u64>
where
    I: IntoIterator<Item = &'a ClassifiedTag>,
{
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for tag in tags {
        *totals.entry(tag.tag_sequence.as_str()).or_insert(0) += tag.count;
    }
    totals
}

/// 第二遍：保留数据集总数 ≥ `min_count` 的 tag
pub fn filter_by_total<'a>(
    tags: &'a [ClassifiedTag],
    totals: &HashMap<&str, u64>,
    min_count: u64,
) -> Vec<&'a ClassifiedTag> {
    tags.iter()
        .filter(|t| totals.get(t.tag_sequence.as_str()).copied().unwrap_or(0) >= min_count)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub replicates: usize,
    pub tags_read: usize,
    pub tags_kept: usize,
}

pub fn run_classify(input: &Path, output: &Path, opt: &ClassifyOpt) -> Result<ClassifyReport> {
    let reps = list_replicates(input)?;
    if reps.is_empty() {
        bail!("no replicate files found under '{}'", input.display());
    }
    info!(input = %input.display(), replicates = reps.len(), min_count = opt.min_count, "classifying tags");

    let pool = build_pool(opt.threads)?;
    let classified: Vec<(Replicate, Vec<ClassifiedTag>)> = pool.install(|| {
        reps.into_par_iter()
            .map(|rep| {
                let records = isomir_sea::load_tag_records(&rep.path)
                    .with_context(|| format!("cannot read isomiR-SEA table '{}'", rep.path.display()))?;
                let tags: Vec<ClassifiedTag> = records.into_iter().map(TagRecord::classify).collect();
                debug!(group = %rep.group, replicate = %rep.name, tags = tags.len(), "classified");
                Ok((rep, tags))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let totals = tag_totals(classified.iter().flat_map(|(_, tags)| tags.iter()));

    let kept: Vec<usize> = pool.install(|| {
        classified
            .par_iter()
            .map(|(rep, tags)| {
                let kept = filter_by_total(tags, &totals, opt.min_count);
                let path = rep.output_path(output, "csv");
                create_parent(&path)?;
                table::write_records(&path, &kept)
                    .with_context(|| format!("cannot write classified table '{}'", path.display()))?;
                Ok(kept.len())
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let report = ClassifyReport {
        replicates: classified.len(),
        tags_read: classified.iter().map(|(_, t)| t.len()).sum(),
        tags_kept: kept.iter().sum(),
    };
    info!(
        replicates = report.replicates,
        tags_read = report.tags_read,
        tags_kept = report.tags_kept,
        distinct_tags = totals.len(),
        "classification finished"
    );
    Ok(report)
}

/// 扫描所有分类结果，得到数据集窗口
pub fn dataset_window(classified: &Path, threads: usize) -> Result<DatasetWindow> {
    let reps = list_replicates(classified)?;
    if reps.is_empty() {
        bail!("no classified tables found under '{}'", classified.display());
    }
    let pool = build_pool(threads)?;
    let windows = pool.install(|| {
        reps.par_iter()
            .map(|rep| {
                let tags = table::read_classified(&rep.path)
                    .with_context(|| format!("cannot read classified table '{}'", rep.path.display()))?;
                Ok(DatasetWindow::from_deltas(tags.iter().map(|t| (t.nt_diff_5p, t.nt_diff_3p))))
            })
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(windows.into_iter().fold(DatasetWindow::default(), DatasetWindow::merge))
}

#[derive(Debug, Clone)]
pub struct PrecursorReport {
    pub window: DatasetWindow,
    pub precursors: usize,
    pub set_path: PathBuf,
    pub csv_path: PathBuf,
}

pub fn run_precursor(classified: &Path, output: &Path, opt: &PrecursorOpt) -> Result<PrecursorReport> {
    let window = dataset_window(classified, opt.threads)?;
    info!(max_nt_diff_5p = window.max_nt_diff_5p, max_nt_diff_3p = window.max_nt_diff_3p, "dataset window");

    let loci = gff::load_mirna_loci(&opt.annotation)
        .with_context(|| format!("cannot read annotation '{}'", opt.annotation.display()))?;
    let genome = fasta::load_genome(&opt.genome)
        .with_context(|| format!("cannot read genome FASTA '{}'", opt.genome.display()))?;
    info!(loci = loci.len(), chromosomes = genome.len(), "loaded annotation and genome");

    let mut set = PrecursorSet::build(window, &loci, &genome).context("cannot build extended precursors")?;
    set.set_meta(PrecursorMeta {
        genome_file: Some(opt.genome.display().to_string()),
        annotation_file: Some(opt.annotation.display().to_string()),
        build_args: opt.build_args.clone(),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });

    std::fs::create_dir_all(output).with_context(|| format!("cannot create directory '{}'", output.display()))?;
    let set_path = output.join(PRECURSOR_SET_FILE);
    set.save_to_file(&set_path.to_string_lossy())
        .with_context(|| format!("cannot write precursor set '{}'", set_path.display()))?;
    let csv_path = table::write_precursor_csv(output, &set)
        .with_context(|| format!("cannot write precursor table under '{}'", output.display()))?;
    info!(precursors = set.len(), set = %set_path.display(), csv = %csv_path.display(), "precursors saved");

    Ok(PrecursorReport { window, precursors: set.len(), set_path, csv_path })
}

/// `.pre` 读二进制集合，其余按 CSV 读取（窗口由文件名给出）
pub fn load_precursors(path: &Path) -> Result<PrecursorSet> {
    let set = if path.extension().is_some_and(|e| e == "pre") {
        PrecursorSet::load_from_file(&path.to_string_lossy())
    } else {
        table::read_precursor_csv(path)
    };
    set.with_context(|| format!("cannot load precursors from '{}'", path.display()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignReport {
    pub replicates: usize,
    pub tags_aligned: usize,
    pub tags_without_precursor: usize,
}

impl AlignReport {
    fn merge(self, other: Self) -> Self {
        Self {
            replicates: self.replicates + other.replicates,
            tags_aligned: self.tags_aligned + other.tags_aligned,
            tags_without_precursor: self.tags_without_precursor + other.tags_without_precursor,
        }
    }
}

fn align_replicate(rep: &Replicate, set: &PrecursorSet, output: &Path) -> Result<AlignReport> {
    let tags = table::read_classified(&rep.path)
        .with_context(|| format!("cannot read classified table '{}'", rep.path.display()))?;

    let mut by_mirna: BTreeMap<&str, Vec<&ClassifiedTag>> = BTreeMap::new();
    for tag in &tags {
        by_mirna.entry(tag.mirna_name.as_str()).or_default().push(tag);
    }

    // 整张比对表先写入内存，任一 tag 出错时不留下半截文件
    let window = set.window;
    let mut writer = table::AlignmentWriter::new(Vec::new(), set.max_len())?;
    let mut tally = ExtensionTally::new(window);
    let mut profile = TemplatedProfile::new(window, set.max_len());
    let mut report = AlignReport { replicates: 1, ..Default::default() };

    for (mirna, group) in by_mirna {
        let Some(pre) = set.get(mirna) else {
            warn!(replicate = %rep.name, mirna, tags = group.len(), "no extended precursor; tags skipped");
            report.tags_without_precursor += group.len();
            continue;
        };
        writer.write_precursor(pre)?;
        for tag in group {
            let aln = align_tag(pre, window, tag.tag_sequence.as_bytes(), tag.nt_diff_5p, tag.nt_diff_3p)
                .with_context(|| {
                    format!("cannot align tag '{}' of '{}' in '{}'", tag.tag_sequence, mirna, rep.path.display())
                })?;
            tally.add(&aln.rows);
            profile.add(aln.status, &aln.rows);
            writer.write_tag(mirna, &aln)?;
            report.tags_aligned += 1;
        }
    }
    let matrix = writer.finish()?;

    let aln_path = rep.output_path(&output.join(ALIGNMENT_DIR), "csv");
    create_parent(&aln_path)?;
    std::fs::write(&aln_path, matrix)
        .with_context(|| format!("cannot write alignment table '{}'", aln_path.display()))?;

    let nt_path = rep.output_path(&output.join(NT_SUMMARY_DIR), "csv");
    create_parent(&nt_path)?;
    table::write_records(&nt_path, &tally.nucleotide_records())?;

    let tpl_path = rep.output_path(&output.join(TEMPLATED_SUMMARY_DIR), "csv");
    create_parent(&tpl_path)?;
    table::write_records(&tpl_path, &tally.templated_records())?;

    let profile_path = rep.output_path(&output.join(TEMPLATED_PROFILE_DIR), "csv");
    create_parent(&profile_path)?;
    table::write_records(&profile_path, &profile.records())?;

    debug!(group = %rep.group, replicate = %rep.name, aligned = report.tags_aligned, "replicate aligned");
    Ok(report)
}

pub fn run_align(classified: &Path, precursors: &Path, output: &Path, opt: &AlignOpt) -> Result<AlignReport> {
    let set = load_precursors(precursors)?;
    if set.is_empty() {
        bail!("precursor set '{}' is empty", precursors.display());
    }
    let reps = list_replicates(classified)?;
    if reps.is_empty() {
        bail!("no classified tables found under '{}'", classified.display());
    }
    info!(
        precursors = set.len(),
        max_nt_diff_5p = set.window.max_nt_diff_5p,
        max_nt_diff_3p = set.window.max_nt_diff_3p,
        replicates = reps.len(),
        "aligning tags to extended precursors"
    );

    let pool = build_pool(opt.threads)?;
    let reports = pool.install(|| {
        reps.par_iter()
            .map(|rep| align_replicate(rep, &set, output))
            .collect::<Result<Vec<_>>>()
    })?;
    let report = reports.into_iter().fold(AlignReport::default(), AlignReport::merge);
    if report.tags_without_precursor > 0 {
        warn!(tags = report.tags_without_precursor, "tags without an extended precursor were skipped");
    }
    info!(replicates = report.replicates, tags = report.tags_aligned, output = %output.display(), "alignment finished");
    Ok(report)
}
