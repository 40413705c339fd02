//! mailmark CLI: deterministic batch email labeling.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use mailmark::batch::{self, BatchOptions};
use mailmark::classify::ClassifierConfig;
use mailmark::trace::{FileSink, TraceSink};

#[derive(Parser)]
#[command(name = "mailmark", version, about = "Deterministic batch email labeling")]
struct Cli {
    /// Append-only diagnostic trace file.
    #[arg(long, global = true, default_value = "trace.txt")]
    trace_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label a batch of emails and write a sibling .labeled.json file.
    Label {
        /// Input JSON file with unlabeled emails.
        input: PathBuf,

        /// Category list JSON file.
        #[arg(long, default_value = "categories.json")]
        categories: PathBuf,

        /// Historical samples JSON file for learned overrides.
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Disable learned sender/domain overrides.
        #[arg(long)]
        no_learned: bool,
    },

    /// Validate the category and input files without labeling.
    Check {
        /// Input JSON file to validate.
        input: PathBuf,

        /// Category list JSON file.
        #[arg(long, default_value = "categories.json")]
        categories: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let sink = FileSink::new(&cli.trace_file);

    match cli.command {
        Commands::Label {
            input,
            categories,
            samples,
            no_learned,
        } => {
            let config = ClassifierConfig {
                learned_overrides: !no_learned,
                ..Default::default()
            };
            let options = BatchOptions {
                input,
                categories,
                samples,
            };
            if let Err(err) = batch::run(&options, &config, &sink) {
                sink.record(&format!("error: {err}"));
                eprintln!("See {} for details.", cli.trace_file.display());
                return Err(err.into());
            }
        }

        Commands::Check { input, categories } => match batch::check(&categories, &input) {
            Ok((cat_count, email_count)) => {
                println!("OK: {cat_count} categories, {email_count} emails");
            }
            Err(err) => {
                sink.record(&format!("error: {err}"));
                return Err(err.into());
            }
        },
    }

    Ok(())
}
