use anyhow::{Context, Result, bail};
use cardimport_core::{Statement, StatementFile};
use cardimport_ingest::{ImporterKind, extract, find_importer};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;

mod config;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDIMPORT_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "cardimport", version = VERSION, about = "Card statement importers")]
struct Cli {
    /// Accounts file (TOML); defaults to every importer with default options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print which importer claims each file
    Identify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract transactions and balance assertions
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the known importer kinds
    Importers,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Extracted {
    file: String,
    #[serde(flatten)]
    statement: Statement,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = cli
        .config
        .as_deref()
        .map(config::load_config)
        .transpose()?;
    let importers = config::build_importers(cfg.as_ref())?;

    match cli.command {
        Command::Identify { files } => {
            for path in &files {
                let file = StatementFile::open(path)?;
                let name = find_importer(&importers, &file).map_or("-", |imp| imp.name());
                println!("{}\t{}", path.display(), name);
            }
        }

        Command::Extract { files, format } => {
            let mut out = Vec::new();
            for path in &files {
                let file = StatementFile::open(path)?;
                let Some(importer) = find_importer(&importers, &file) else {
                    bail!("no importer recognizes {}", path.display());
                };
                let statement = extract(importer, &file)
                    .with_context(|| format!("extracting {}", path.display()))?;
                out.push(Extracted {
                    file: path.display().to_string(),
                    statement,
                });
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&out)?),
                OutputFormat::Text => out.iter().for_each(print_text),
            }
        }

        Command::Importers => {
            for kind in ImporterKind::ALL {
                println!("{kind}");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_text(e: &Extracted) {
    println!("# {} ({})", e.file, e.statement.importer);
    for t in &e.statement.transactions {
        let foreign = match (&t.foreign_amount, &t.foreign_currency) {
            (Some(amount), Some(currency)) => format!("  [{amount} {currency}]"),
            _ => String::new(),
        };
        println!(
            "{}  {:>12} {}  {}{}",
            t.date, t.amount, t.currency, t.payee, foreign
        );
    }
    if let Some(b) = &e.statement.balance {
        println!("{}  balance {} {}", b.date, b.amount, b.currency);
    }
    println!();
}
