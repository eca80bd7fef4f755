//! QRNG command-line interface
//!
//! Requests random bits from IBM Quantum hardware, falling back to a local
//! simulator, and prints basic statistics.

use anyhow::{Context, Result};
use clap::Parser;
use qrng_core::bits;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod config;
mod generator;
mod report;

use config::RngConfig;
use generator::QuantumRng;
use report::{Report, ReportFormat};

/// Quantum random number generator
#[derive(Parser, Debug)]
#[command(name = "qrng")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of bits (8-256); prompted for when omitted
    #[arg(short, long, allow_negative_numbers = true, value_parser = parse_bits)]
    bits: Option<usize>,

    /// IBM Quantum instance name or CRN
    #[arg(short, long)]
    instance: Option<String>,

    /// Backend to try first
    #[arg(long)]
    backend: Option<String>,

    /// IBM channel (ibm_cloud, ibm_quantum)
    #[arg(long)]
    channel: Option<String>,

    /// Skip IBM Quantum and use the local simulator
    #[arg(short, long)]
    local: bool,

    /// Seed for the local simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Job timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags win over file and environment
    fn apply(&self, config: &mut RngConfig) {
        if let Some(n) = self.bits {
            config.bits = Some(n);
        }
        if let Some(ref instance) = self.instance {
            config.instance = Some(instance.clone());
        }
        if let Some(ref backend) = self.backend {
            config.preferred_backend = backend.clone();
        }
        if let Some(ref channel) = self.channel {
            config.channel = Some(channel.clone());
        }
        if self.local {
            config.local_only = true;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}

fn parse_bits(value: &str) -> Result<usize, String> {
    bits::parse_request(value).ok_or_else(|| format!("'{}' is not an integer", value))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Ask for a width; unparsable input gives the default
fn prompt_bits<R: BufRead, W: Write>(mut input: R, output: &mut W) -> io::Result<usize> {
    write!(output, "Enter number of bits ({}-{}): ", bits::MIN, bits::MAX)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    match bits::parse_request(&line) {
        Some(n) => Ok(n),
        None => {
            writeln!(output, "Invalid input: Using default {} bits", bits::DEFAULT)?;
            Ok(bits::DEFAULT)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = RngConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    let config = config.validate()?;
    log::debug!("Configuration: {:?}", config);

    let format = if cli.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    };

    let n = match config.bits {
        Some(n) => n,
        None if cli.json => prompt_bits(io::stdin().lock(), &mut io::stderr())?,
        None => {
            println!("=== Quantum Random Number Generator ===");
            prompt_bits(io::stdin().lock(), &mut io::stdout())?
        }
    };

    let rng = QuantumRng::new(config).with_progress(format == ReportFormat::Text);
    let generation = rng.generate(n).context("Random bit generation failed")?;

    println!("{}", Report::new(&generation).render(format));
    Ok(())
}
