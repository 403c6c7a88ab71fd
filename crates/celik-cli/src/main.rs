use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatters;
mod worker;

use formatters::FormatMode;

#[derive(Parser)]
#[command(name = "celik")]
#[command(about = "Reader for Serbian identity, medical insurance and vehicle registration cards")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the PC/SC readers attached to this machine
    Readers,
    /// Print the ATR of the inserted card and its candidate families
    Atr {
        /// Index of the reader, as listed by `readers`
        #[arg(short, long, default_value_t = 0)]
        reader: usize,
    },
    /// Read the inserted card once
    Read {
        /// Index of the reader, as listed by `readers`
        #[arg(short, long, default_value_t = 0)]
        reader: usize,
        /// Output format mode
        #[arg(short, long, value_enum, default_value_t = FormatMode::Human)]
        format: FormatMode,
    },
    /// Keep polling a reader and print every card inserted into it
    Watch {
        /// Index of the reader, as listed by `readers`
        #[arg(short, long, default_value_t = 0)]
        reader: usize,
        /// Delay between two polls of the reader
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
        /// Stop after the first card has been read
        #[arg(long)]
        once: bool,
    },
}

fn main() -> ExitCode {
    // RUST_LOG=debug shows every APDU status word, RUST_LOG=trace every chunk
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Readers => commands::cmd_readers(),
        Command::Atr { reader } => commands::cmd_atr(reader),
        Command::Read { reader, format } => commands::cmd_read(reader, format),
        Command::Watch {
            reader,
            interval_ms,
            once,
        } => commands::cmd_watch(reader, interval_ms, once),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
