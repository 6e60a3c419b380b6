use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use isomir_rust::pipeline::{self, AlignOpt, ClassifyOpt, PrecursorOpt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "isomir-rust",
    author,
    version,
    about = "isomiR classification and extended-precursor alignment",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify isomiR-SEA tags laid out as <input>/<group>/<replicate>.txt
    Classify {
        /// Directory of isomiR-SEA raw outputs
        input: PathBuf,
        /// Output directory for classified CSV tables
        #[arg(short, long, default_value = "classified")]
        output: PathBuf,
        /// Minimum total read count of a tag across the whole dataset
        #[arg(long = "min-count", default_value_t = pipeline::DEFAULT_MIN_COUNT)]
        min_count: u64,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Build extended precursors from a GFF3 annotation and a genome FASTA
    Precursor {
        /// Directory of classified CSV tables
        classified: PathBuf,
        /// Genome FASTA
        #[arg(short = 'g', long = "genome")]
        genome: PathBuf,
        /// miRBase GFF3 annotation
        #[arg(short = 'a', long = "annotation")]
        annotation: PathBuf,
        /// Output directory for the precursor set (.pre) and CSV table
        #[arg(short, long, default_value = "precursors")]
        output: PathBuf,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Align classified tags to extended precursors and summarise extension positions
    Align {
        /// Directory of classified CSV tables
        classified: PathBuf,
        /// Precursor set (.pre) or <max5>_<max3>_extended_precursor_seqs.csv
        #[arg(short = 'p', long = "precursors")]
        precursors: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "aligned")]
        output: PathBuf,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Classify { input, output, min_count, threads } => {
            let opt = ClassifyOpt { min_count, threads };
            pipeline::run_classify(&input, &output, &opt)?;
        }
        Commands::Precursor { classified, genome, annotation, output, threads } => {
            let opt = PrecursorOpt {
                genome,
                annotation,
                threads,
                build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
            };
            pipeline::run_precursor(&classified, &output, &opt)?;
        }
        Commands::Align { classified, precursors, output, threads } => {
            let opt = AlignOpt { threads };
            pipeline::run_align(&classified, &precursors, &output, &opt)?;
        }
    }
    Ok(())
}
