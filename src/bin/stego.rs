//! # Stego Binary Entry Point
//!
//! Thin wrapper that parses the command line and dispatches to [`lsb_vault::commands`].
//!
//! ## Usage
//!
//! ```bash
//! stego initialize cover.png
//! echo "secret" | stego write cover.png
//! stego cat cover.png
//! stego --lsb 4 info cover.png --json
//! ```

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use lsb_vault::commands;
use lsb_vault::common::config::{load_config, StegoConfig};
use lsb_vault::common::logging::init_logger;
use lsb_vault::stego::{OpenOptions, Strategy};

/// Image based steganography tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Payload bits per channel sample (1-8), overrides the configuration file
    #[arg(long, global = true)]
    lsb: Option<u8>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new image container
    Initialize {
        /// Image file to convert to a container
        file_path: PathBuf,
        /// Force re-initialize existing containers
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the contents of a container
    Validate {
        /// Image file to validate
        file_path: PathBuf,
        /// Only validate the contents of the header
        #[arg(long)]
        header_only: bool,
    },
    /// Dump the contents of an image container
    Cat {
        /// Image file container to read
        file_path: PathBuf,
        /// Output file to write contents to, default stdout
        #[arg(short, long, default_value = "-")]
        out_file: String,
    },
    /// Write data into an existing container
    Write {
        /// Image file container to write to
        file_path: PathBuf,
        /// Data to write into the container, default reads from stdin
        #[arg(long, default_value = "-")]
        data: String,
    },
    /// Format the pixel channel LSBs, deleting all written data
    Format {
        /// Image file container to format
        file_path: PathBuf,
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Show container information
    Info {
        /// Image file container to inspect
        file_path: PathBuf,
        /// Print the information as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
#[group(multiple = false)]
struct StrategyArgs {
    /// Format the data with random bytes (default)
    #[arg(long)]
    random: bool,
    /// Format the data with all 0s
    #[arg(long)]
    zeros: bool,
    /// Format the data with all 1s
    #[arg(long)]
    ones: bool,
}

impl StrategyArgs {
    fn strategy(&self) -> Strategy {
        if self.zeros {
            Strategy::Zeros
        } else if self.ones {
            Strategy::Ones
        } else {
            Strategy::Random
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config: StegoConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => StegoConfig::default(),
    };

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.level_filter()?
    };
    init_logger(level);

    let options = OpenOptions::with_lsb(args.lsb.unwrap_or(config.lsb));

    match args.command {
        Command::Initialize { file_path, force } => {
            commands::initialize(&file_path, &options, force)?;
        }
        Command::Validate {
            file_path,
            header_only,
        } => {
            let validation = commands::validate(&file_path, &options, header_only)?;
            println!("{}: {}", file_path.display(), validation);
        }
        Command::Cat {
            file_path,
            out_file,
        } => commands::cat(&file_path, &options, &out_file)?,
        Command::Write { file_path, data } => commands::write(&file_path, &options, &data)?,
        Command::Format {
            file_path,
            strategy,
        } => commands::format(&file_path, &options, strategy.strategy())?,
        Command::Info { file_path, json } => {
            commands::info(&file_path, &options, json)?;
        }
    }

    Ok(())
}
