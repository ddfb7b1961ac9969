use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mstar::aligner::alignment::Alignment;
use mstar::aligner::scoring::{CostMatrix, Pam250, UnitCost};
use mstar::aligner::MstarAligner;
use mstar::alphabet::Alphabet;

/// Substitution cost matrices selectable from the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MatrixType {
    /// PAM250-derived protein costs
    Pam250,

    /// Free match, unit mismatch
    Unit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlphabetType {
    /// The twenty standard amino acids
    Protein,

    /// The four nucleotides
    Dna,
}

/// The various output formats supported by mstar
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputType {
    /// Aligned rows followed by the total cost
    Pretty,

    /// Tabular MSA in FASTA file format
    Fasta,

    /// Rows and cost as a JSON object
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliSubcommand,
}

#[derive(Subcommand, Debug)]
enum CliSubcommand {
    /// Compute an exact multiple sequence alignment
    Align(AlignArgs),
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// Sequences to align in FASTA format. Transparently decompresses .gz files.
    sequences: PathBuf,

    /// Substitution cost matrix
    #[arg(value_enum, short = 'm', long, default_value = "pam250")]
    matrix: MatrixType,

    /// Alphabet the input sequences are validated against
    #[arg(value_enum, short = 'a', long, default_value = "protein")]
    alphabet: AlphabetType,

    /// Penalty charged per column for each symbol aligned against a gap
    #[arg(short = 'g', long, default_value_t = 4)]
    gap_penalty: u32,

    /// Align with uniform-cost search instead of the pairwise heuristic.
    /// Much slower; intended for verification runs.
    #[arg(long)]
    brute: bool,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file type
    #[arg(value_enum, short = 'O', long, default_value = "pretty")]
    output_type: OutputType,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let default_filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    match args.command {
        CliSubcommand::Align(v) => align_subcommand(&v),
    }
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let (names, sequences) = read_sequences(&args.sequences)
        .with_context(|| format!("could not read sequences from {:?}", args.sequences))?;

    if sequences.is_empty() {
        bail!("no sequences found in {:?}", args.sequences);
    }

    info!(num_sequences = sequences.len(), "aligning");

    let alphabet = match args.alphabet {
        AlphabetType::Protein => Alphabet::protein(),
        AlphabetType::Dna => Alphabet::dna(),
    };

    let alignment = match args.matrix {
        MatrixType::Pam250 => run_alignment(Pam250, args, &alphabet, &sequences)?,
        MatrixType::Unit => run_alignment(UnitCost, args, &alphabet, &sequences)?,
    };

    info!(cost = alignment.cost(), columns = alignment.len(), "alignment complete");

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map(BufWriter::new)?),
        None => Box::new(io::stdout().lock()),
    };

    match args.output_type {
        OutputType::Pretty => writeln!(writer, "{alignment}")?,
        OutputType::Fasta => {
            for (name, row) in names.iter().zip(alignment.rows()) {
                writeln!(writer, ">{name}")?;
                writeln!(writer, "{row}")?;
            }
        }
        OutputType::Json => {
            serde_json::to_writer_pretty(&mut writer, &alignment)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}

fn run_alignment<C>(
    costs: C,
    args: &AlignArgs,
    alphabet: &Alphabet,
    sequences: &[Vec<u8>],
) -> Result<Alignment>
where
    C: CostMatrix,
{
    let aligner = MstarAligner::new(costs, args.gap_penalty, alphabet, sequences)?;

    if args.brute {
        info!("using uniform-cost search");
        Ok(aligner.align_brute())
    } else {
        Ok(aligner.align())
    }
}

/// Read all FASTA records from `path`, decompressing gzip if the filename
/// says so.
fn read_sequences(path: &Path) -> Result<(Vec<String>, Vec<Vec<u8>>)> {
    let is_gzipped = path
        .file_name()
        .map(|v| v.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false);

    let inner: Box<dyn io::BufRead> = if is_gzipped {
        Box::new(File::open(path).map(MultiGzDecoder::new).map(BufReader::new)?)
    } else {
        Box::new(File::open(path).map(BufReader::new)?)
    };

    let mut reader = fasta::io::Reader::new(inner);

    let mut names = Vec::new();
    let mut sequences = Vec::new();
    for result in reader.records() {
        let record = result?;
        names.push(String::from_utf8_lossy(record.name().as_ref()).into_owned());
        sequences.push(record.sequence().as_ref().to_vec());
    }

    Ok((names, sequences))
}
