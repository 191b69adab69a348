//! vecport CLI
//!
//! Convert pre-trained word-vector models between on-disk formats.
//!
//! # Usage
//!
//! ```bash
//! # Re-serialize a mmap snapshot as plain-text word vectors
//! vecport convert --input tmp.model --output bio-word-vectors.vec
//!
//! # Load the first 10 rows of a word2vec binary distribution
//! vecport convert --input vectors.bin --output vectors.vec --limit 10
//!
//! # Inspect a model file
//! vecport stats --file vectors.vec
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vecport::convert::{convert, ConvertOptions};
use vecport::formats::{self, Format};

#[derive(Parser)]
#[command(name = "vecport")]
#[command(about = "Word-vector model format converter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a model file into another format
    Convert {
        /// Source model file
        #[arg(short, long)]
        input: PathBuf,

        /// Destination model file
        #[arg(short, long)]
        output: PathBuf,

        /// Source format (detected from extension or magic bytes if omitted)
        #[arg(long)]
        from: Option<Format>,

        /// Destination format (inferred from the output extension if omitted)
        #[arg(long)]
        to: Option<Format>,

        /// Read at most N vectors from the source
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Display statistics about a model file
    Stats {
        /// Path to a .wvs, .bin, .vec, or .txt model file
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            from,
            to,
            limit,
        } => {
            let report = convert(&input, &output, &ConvertOptions { from, to, limit })?;
            tracing::info!(
                "Converted {} -> {}: {} vectors of dimension {}",
                report.from,
                report.to,
                report.vocab,
                report.dims
            );
        }

        Commands::Stats { file } => {
            let format = formats::detect(&file)?;
            let info = formats::describe(&file, format)?;
            println!("Model File: {:?}", file);
            println!("  Format: {}", format);
            println!("  Vectors: {}", info.vocab);
            println!("  Dimensions: {}", info.dims);
            println!(
                "  File Size: {:.2} MB",
                info.file_bytes as f64 / (1024.0 * 1024.0)
            );
        }
    }

    Ok(())
}
