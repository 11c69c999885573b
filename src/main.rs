//! ngsbed: genomic interval (BED) operations and read coverage
//!
//! Usage: ngsbed <COMMAND> [OPTIONS]

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;

use ngs_bed::bed;
use ngs_bed::chromosome::ChromosomeOrder;
use ngs_bed::commands::{
    AnnotateCommand, CoverageCommand, CoverageMode, DepthCommand, FilterPairsCommand, InfoCommand,
    MergeCommand, Resize, ResizeCommand, SetOpCommand, SetOperation, SortCommand,
};
use ngs_bed::config::{CoverageOptions, ReadFilter};
use ngs_bed::error::Result;
use ngs_bed::genome::Genome;

#[derive(Parser)]
#[command(name = "ngsbed")]
#[command(version)]
#[command(about = "Genomic interval (BED) operations and read coverage", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Rewrite chromosome names of BED input to the `chr` form (1 -> chr1, M/MT -> chrMT)
    #[arg(long, global = true)]
    normalize_chromosomes: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Read selection shared by the coverage commands.
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Minimum mapping quality of counted reads
    #[arg(long, default_value_t = 1)]
    min_mapq: u8,

    /// Count reads of pairs that are not properly paired
    #[arg(long)]
    anomalous: bool,

    /// Count unpaired reads and reads with unmapped mate
    #[arg(long)]
    singletons: bool,

    /// Count duplicate reads
    #[arg(long)]
    duplicates: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> ReadFilter {
        ReadFilter::new()
            .with_min_mapq(self.min_mapq)
            .with_anomalous(self.anomalous)
            .with_singletons(self.singletons)
            .with_duplicates(self.duplicates)
    }
}

#[derive(Args, Debug, Clone)]
struct IoArgs {
    /// Input BED file (use - for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct SetOpArgs {
    /// Input BED file A (use - for stdin)
    #[arg(short = 'a', long = "file-a")]
    file_a: Option<PathBuf>,

    /// BED file B (merged before use)
    #[arg(short = 'b', long = "file-b")]
    file_b: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sort and merge the result
    #[arg(short, long)]
    merge: bool,
}

#[derive(Args, Debug, Clone)]
struct CoverageArgs {
    /// Target regions (BED); genome-wide without
    #[arg(short = 'r', long)]
    targets: Option<PathBuf>,

    /// Alignments (SAM, or BAM/CRAM with the `bam` feature; - for stdin)
    #[arg(short = 'b', long)]
    reads: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a BED file by chromosome and position
    Sort {
        #[command(flatten)]
        io: IoArgs,

        /// Genome file whose chromosome order is used
        #[arg(short = 'g', long, conflicts_with = "karyotype")]
        genome: Option<PathBuf>,

        /// Order chromosomes 1..22, X, Y, MT, then others
        #[arg(short, long)]
        karyotype: bool,

        /// Remove duplicate regions
        #[arg(short, long)]
        unique: bool,

        /// Break ties by the name column
        #[arg(long)]
        with_name: bool,
    },

    /// Merge overlapping regions
    Merge {
        #[command(flatten)]
        io: IoArgs,

        /// Do not merge regions that only touch
        #[arg(long)]
        no_back_to_back: bool,

        /// Keep names of merged regions as a comma-separated list
        #[arg(long)]
        names: bool,

        /// With --names, list each name once
        #[arg(long, requires = "names")]
        unique_names: bool,
    },

    /// Parts of A that lie inside B
    Intersect {
        #[command(flatten)]
        args: SetOpArgs,
    },

    /// Parts of A not covered by B
    Subtract {
        #[command(flatten)]
        args: SetOpArgs,
    },

    /// Regions of A overlapping B
    Overlapping {
        #[command(flatten)]
        args: SetOpArgs,
    },

    /// Extend regions on both sides
    Extend {
        #[command(flatten)]
        io: IoArgs,

        /// Number of bases to add per side
        #[arg(short = 'n', long)]
        bases: u64,

        /// Genome file used to clip regions at chromosome ends
        #[arg(short = 'g', long)]
        genome: Option<PathBuf>,
    },

    /// Shrink regions on both sides, removing regions that vanish
    Shrink {
        #[command(flatten)]
        io: IoArgs,

        /// Number of bases to remove per side
        #[arg(short = 'n', long)]
        bases: u64,
    },

    /// Split long regions into chunks of about equal size
    Chunk {
        #[command(flatten)]
        io: IoArgs,

        /// Target chunk size
        #[arg(short = 's', long)]
        size: u64,
    },

    /// Annotate regions with the overlapping regions of a second BED file
    Annotate {
        #[command(flatten)]
        io: IoArgs,

        /// BED file providing the annotations
        #[arg(short = 'b', long)]
        source: PathBuf,

        /// Column of the source file to copy (4 is the name column)
        #[arg(long, default_value_t = 4)]
        col: usize,

        /// Remove existing annotations of the input first
        #[arg(long)]
        clear: bool,

        /// Report each annotation value once
        #[arg(long)]
        no_duplicates: bool,

        /// Report the covered fraction of each region
        #[arg(long)]
        overlap: bool,
    },

    /// Print region count, base count and sortedness of a BED file
    Info {
        /// Input BED file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Average read depth per target region
    Coverage {
        #[command(flatten)]
        args: CoverageArgs,

        /// Decimal places of the average
        #[arg(long, default_value_t = 2)]
        decimals: usize,
    },

    /// Regions with read depth below a cutoff
    LowCoverage {
        #[command(flatten)]
        args: CoverageArgs,

        /// Depth cutoff
        #[arg(short, long, default_value_t = 20)]
        cutoff: u32,

        /// Chromosome sizes, needed without targets
        #[arg(short = 'g', long)]
        genome: Option<PathBuf>,
    },

    /// Regions with read depth at or above a cutoff
    HighCoverage {
        #[command(flatten)]
        args: CoverageArgs,

        /// Depth cutoff
        #[arg(short, long, default_value_t = 20)]
        cutoff: u32,
    },

    /// Read depth as bedgraph
    Depth {
        /// Alignments (SAM, or BAM/CRAM with the `bam` feature; - for stdin)
        #[arg(short = 'b', long)]
        reads: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Keep read pairs where both mates pass the read filter
    FilterPairs {
        /// Alignments (SAM, or BAM/CRAM with the `bam` feature; - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout; required for BAM)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let threads = cli.threads.unwrap_or(1).max(1);
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            log::warn!("Failed to initialize thread pool: {}", e);
        }
    }

    let normalize = cli.normalize_chromosomes;
    let result = match cli.command {
        Commands::Sort {
            io,
            genome,
            karyotype,
            unique,
            with_name,
        } => run_sort(io, genome, karyotype, unique, with_name, normalize),

        Commands::Merge {
            io,
            no_back_to_back,
            names,
            unique_names,
        } => {
            let cmd = MergeCommand::new()
                .with_back_to_back(!no_back_to_back)
                .with_names(names, unique_names)
                .with_normalized_chromosomes(normalize);
            with_output(io.output, |out| cmd.run(io.input.as_deref(), out))
        }

        Commands::Intersect { args } => run_set_op(SetOperation::Intersect, args, normalize),
        Commands::Subtract { args } => run_set_op(SetOperation::Subtract, args, normalize),
        Commands::Overlapping { args } => run_set_op(SetOperation::Overlapping, args, normalize),

        Commands::Extend { io, bases, genome } => load_genome(genome).and_then(|genome| {
            let cmd = ResizeCommand::new(Resize::Extend(bases)).with_genome(genome);
            run_resize(cmd.with_normalized_chromosomes(normalize), io)
        }),
        Commands::Shrink { io, bases } => run_resize(
            ResizeCommand::new(Resize::Shrink(bases)).with_normalized_chromosomes(normalize),
            io,
        ),
        Commands::Chunk { io, size } => run_resize(
            ResizeCommand::new(Resize::Chunk(size)).with_normalized_chromosomes(normalize),
            io,
        ),

        Commands::Annotate {
            io,
            source,
            col,
            clear,
            no_duplicates,
            overlap,
        } => {
            let cmd = AnnotateCommand::new()
                .with_column(col)
                .with_clear(clear)
                .with_no_duplicates(no_duplicates)
                .with_overlap(overlap)
                .with_normalized_chromosomes(normalize);
            with_output(io.output, |out| cmd.run(io.input.as_deref(), &source, out))
        }

        Commands::Info { input } => InfoCommand::new()
            .with_normalized_chromosomes(normalize)
            .run(input.as_deref(), std::io::stdout().lock()),

        Commands::Coverage { args, decimals } => {
            let options = CoverageOptions {
                filter: args.filter.to_filter(),
                decimals,
                ..CoverageOptions::default()
            };
            run_coverage(CoverageMode::Average, options, args, None, threads)
        }
        Commands::LowCoverage {
            args,
            cutoff,
            genome,
        } => {
            let options = CoverageOptions {
                filter: args.filter.to_filter(),
                cutoff,
                ..CoverageOptions::default()
            };
            load_genome(genome)
                .and_then(|genome| run_coverage(CoverageMode::Low, options, args, genome, threads))
        }
        Commands::HighCoverage { args, cutoff } => {
            let options = CoverageOptions {
                filter: args.filter.to_filter(),
                cutoff,
                ..CoverageOptions::default()
            };
            run_coverage(CoverageMode::High, options, args, None, threads)
        }

        Commands::Depth {
            reads,
            output,
            filter,
        } => {
            let options = CoverageOptions {
                filter: filter.to_filter(),
                ..CoverageOptions::default()
            };
            let cmd = DepthCommand::new(options).with_threads(threads);
            with_output(output, |out| cmd.run(reads.as_deref(), out))
        }

        Commands::FilterPairs {
            input,
            output,
            filter,
        } => FilterPairsCommand::new(filter.to_filter())
            .with_threads(threads)
            .run(input.as_deref(), output.as_deref(), std::io::stdout().lock()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Run `f` with the output file, or stdout when no path (or `-`) is given.
fn with_output<F>(output: Option<PathBuf>, f: F) -> Result<()>
where
    F: FnOnce(Box<dyn std::io::Write>) -> Result<()>,
{
    let writer = bed::open_output(output.as_deref())?;
    f(writer)
}

fn load_genome(path: Option<PathBuf>) -> Result<Option<Genome>> {
    match path {
        Some(p) => Ok(Some(Genome::from_file(p)?)),
        None => Ok(None),
    }
}

fn run_sort(
    io: IoArgs,
    genome: Option<PathBuf>,
    karyotype: bool,
    unique: bool,
    with_name: bool,
    normalize: bool,
) -> Result<()> {
    let order = match load_genome(genome)? {
        Some(genome) => ChromosomeOrder::from_genome(&genome),
        None if karyotype => ChromosomeOrder::Karyotype,
        None => ChromosomeOrder::Lexicographic,
    };
    let cmd = SortCommand::new()
        .with_order(order)
        .with_unique(unique)
        .with_name(with_name)
        .with_normalized_chromosomes(normalize);
    with_output(io.output, |out| cmd.run(io.input.as_deref(), out))
}

fn run_set_op(operation: SetOperation, args: SetOpArgs, normalize: bool) -> Result<()> {
    let cmd = SetOpCommand::new(operation)
        .with_merge_output(args.merge)
        .with_normalized_chromosomes(normalize);
    with_output(args.output, |out| {
        cmd.run(args.file_a.as_deref(), &args.file_b, out)
    })
}

fn run_resize(cmd: ResizeCommand, io: IoArgs) -> Result<()> {
    with_output(io.output, |out| cmd.run(io.input.as_deref(), out))
}

fn run_coverage(
    mode: CoverageMode,
    options: CoverageOptions,
    args: CoverageArgs,
    genome: Option<Genome>,
    threads: usize,
) -> Result<()> {
    let cmd = CoverageCommand::new(options).with_threads(threads);
    with_output(args.output, |out| {
        cmd.run(
            mode,
            args.targets.as_deref(),
            args.reads.as_deref(),
            genome.as_ref(),
            out,
        )
    })
}
