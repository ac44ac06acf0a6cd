//! Contract Lock command-line tool
//!
//! Usage: contract-lock <consistency|compat|schemas|show> [options]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use contract_lock::parser::parse_contract_file;
use contract_lock::{CompatibilityConfig, LoaderConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::output::{format_contract, format_report, OutputFormat};
use cli::verify::{run_compatibility, run_consistency, run_schemas, RunReport};

#[derive(Parser)]
#[command(name = "contract-lock")]
#[command(about = "Contract consistency and compatibility checker", long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Directory discovery options shared by the directory subcommands
#[derive(Args)]
struct DiscoveryArgs {
    /// Directory holding contract documents or schemas (not walked recursively)
    dir: PathBuf,

    /// Extension of contract documents
    #[arg(long, default_value = "md")]
    extension: String,

    /// Index file to skip
    #[arg(long, default_value = "README.md")]
    index_file: String,

    /// Output format
    #[arg(long, default_value = "human")]
    format: OutputFormat,
}

impl DiscoveryArgs {
    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            document_extension: self.extension.clone(),
            index_file: self.index_file.clone(),
            ..LoaderConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check every contract in a directory for internal consistency
    Consistency {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Only check contracts whose path contains this module name
        #[arg(long)]
        module: Option<String>,
    },

    /// Check producer contracts against consumer contracts
    Compat {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Module name (path substring) of the producing contracts
        #[arg(long)]
        producer: String,

        /// Module name (path substring) of the consuming contracts
        #[arg(long)]
        consumer: String,

        /// Token standing for a method's return value in postconditions
        #[arg(long, default_value = "result")]
        placeholder: String,
    },

    /// Validate JSON schemas and compare them pairwise
    Schemas {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Module name (path substring) of the producing schemas
        #[arg(long, requires = "consumer")]
        producer: Option<String>,

        /// Module name (path substring) of the consuming schemas
        #[arg(long, requires = "producer")]
        consumer: Option<String>,
    },

    /// Parse one contract document and print its model
    Show {
        /// Contract document
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Consistency { discovery, module } => {
            let report = run_consistency(&discovery.dir, &discovery.loader_config(), module.as_deref())
                .with_context(|| format!("consistency check of {}", discovery.dir.display()))?;
            Ok(emit(&report, discovery.format))
        }
        Commands::Compat { discovery, producer, consumer, placeholder } => {
            let compat = CompatibilityConfig { result_placeholder: placeholder };
            let report = run_compatibility(&discovery.dir, &discovery.loader_config(), &compat, &producer, &consumer)
                .with_context(|| format!("compatibility check of {}", discovery.dir.display()))?;
            Ok(emit(&report, discovery.format))
        }
        Commands::Schemas { discovery, producer, consumer } => {
            let report = run_schemas(&discovery.dir, &discovery.loader_config(), producer.as_deref(), consumer.as_deref())
                .with_context(|| format!("schema check of {}", discovery.dir.display()))?;
            Ok(emit(&report, discovery.format))
        }
        Commands::Show { file, format } => {
            let contract = parse_contract_file(&file).with_context(|| format!("parsing {}", file.display()))?;
            print!("{}", format_contract(&contract, format));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print a report; the exit code is 1 when the run found anything
fn emit(report: &RunReport, format: OutputFormat) -> ExitCode {
    print!("{}", format_report(report, format));
    if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
