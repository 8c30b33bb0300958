use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qname_exclude::{
    count_records, BoundaryPolicy, FilterConfig, FilterSummary, IdentifierOrder, OutputTarget,
    QnameFilter,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "qname-exclude",
    about = "Filter a QNAME-sorted SAM/BAM file, excluding reads listed in a text file"
)]
struct Cli {
    /// QNAME-sorted SAM/BAM/CRAM file to be filtered.
    #[arg(short = 'i', long = "bam-in")]
    bam_in: PathBuf,
    /// Text file (.txt or .txt.gz) with one QNAME to exclude per line.
    #[arg(short = 'q', long = "qnames")]
    qnames: PathBuf,
    /// Output file (.sam or .bam); SAM is written to stdout when omitted.
    #[arg(short = 'o', long = "bam-out")]
    bam_out: Option<PathBuf>,
    /// Ordering the input was sorted with.
    #[arg(long, value_enum, default_value_t = OrderArg::CaseInsensitive)]
    order: OrderArg,
    /// Reproduce the historical early stop at the largest excluded QNAME.
    #[arg(long)]
    legacy_boundary: bool,
    /// htslib compression threads for reading and writing.
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    CaseInsensitive,
    Bytewise,
}

impl From<OrderArg> for IdentifierOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::CaseInsensitive => IdentifierOrder::CaseInsensitive,
            OrderArg::Bytewise => IdentifierOrder::Bytewise,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let policy = if cli.legacy_boundary {
        BoundaryPolicy::Legacy
    } else {
        BoundaryPolicy::Exact
    };
    let config = FilterConfig::new(&cli.bam_in, &cli.qnames)
        .with_output(cli.bam_out.clone())
        .with_order(cli.order.into())
        .with_policy(policy)
        .with_threads(cli.threads);

    // Banners go to stderr so console output stays valid SAM.
    eprintln!("Started: Processing **{}**", file_name(&cli.bam_in));
    eprintln!(" - Excluding reads in **{}**", file_name(&cli.qnames));
    eprintln!(" - Will generate **{}**", output_name(cli.bam_out.as_deref()));

    let summary = QnameFilter::new(config).run().with_context(|| {
        format!(
            "failed to filter {} against {}",
            cli.bam_in.display(),
            cli.qnames.display()
        )
    })?;

    report(&cli, &summary)
}

fn report(cli: &Cli, summary: &FilterSummary) -> Result<()> {
    eprintln!("Completed: Processing **{}**", file_name(&cli.bam_in));
    match &summary.target {
        OutputTarget::File { path, .. } => {
            let count = count_records(path, cli.threads)
                .with_context(|| format!("failed to count records in {}", path.display()))?;
            eprintln!(" - Generated **{}**", file_name(path));
            eprintln!(" - Number of records in outfile: {count}");
        }
        OutputTarget::Console => {
            eprintln!(" - Number of records written: {}", summary.records_written);
        }
    }
    eprintln!(
        " - Excluded {} records using {} unique QNAMEs ({} listed)",
        summary.stats.excluded, summary.unique_identifiers, summary.raw_identifiers
    );
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn output_name(path: Option<&Path>) -> String {
    path.map(file_name).unwrap_or_else(|| "<stdout>".to_string())
}
