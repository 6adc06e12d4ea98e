use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;

use xsort_rs::extsort::{
    DEFAULT_BUFFER_SIZE, SortConfig, check_sorted_file, parse_buffer_size, sort_file,
};

#[derive(Parser)]
#[command(
    name = "fxsort",
    about = "Sort files of fixed-width keyed records (100-byte records, 10-byte keys)"
)]
struct Cli {
    /// Input file of records
    input: PathBuf,

    /// Write result to FILE
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Check for sorted input; do not sort
    #[arg(short = 'c', long = "check")]
    check: bool,

    /// Number of worker threads (default: all cores)
    #[arg(long = "parallel", value_name = "N")]
    parallel: Option<usize>,

    /// Use SIZE for main memory buffer (e.g. 500M, 1G)
    #[arg(short = 'S', long = "buffer-size", value_name = "SIZE")]
    buffer_size: Option<String>,

    /// Use DIR for temporaries, not $TMPDIR or /tmp
    #[arg(short = 'T', long = "temporary-directory", value_name = "DIR")]
    temp_dir: Option<PathBuf>,

    /// Number of partitions for the external phase
    #[arg(short = 'P', long = "partitions", value_name = "N")]
    partitions: Option<usize>,

    /// Print phase progress to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    xsort_rs::reset_sigpipe();
    let cli = Cli::parse();

    let buffer_size = match cli.buffer_size.as_deref().map(parse_buffer_size) {
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("fxsort: {}", e);
            process::exit(2);
        }
        None => DEFAULT_BUFFER_SIZE,
    };

    if cli.check {
        match check_sorted_file(&cli.input) {
            Ok(true) => return,
            Ok(false) => process::exit(1),
            Err(e) => {
                eprintln!("fxsort: {}", e);
                process::exit(2);
            }
        }
    }

    let Some(output) = cli.output else {
        eprintln!("fxsort: an output file is required (use -o FILE)");
        process::exit(2);
    };

    let config = SortConfig {
        parallel: cli.parallel,
        buffer_size,
        temp_dir: cli.temp_dir,
        num_partitions: cli.partitions,
        verbose: cli.verbose,
    };

    if let Err(e) = run(&cli.input, &output, &config) {
        eprintln!("fxsort: {:#}", e);
        process::exit(1);
    }
}

fn run(input: &Path, output: &Path, config: &SortConfig) -> anyhow::Result<()> {
    sort_file(input, output, config)
        .with_context(|| format!("failed to sort {}", input.display()))?;
    Ok(())
}
