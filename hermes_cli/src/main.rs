use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[cfg(not(feature = "dhat-heap"))]
use mimalloc::MiMalloc;

use crate::solve::SolveArgs;

mod parsers;
mod solve;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[cfg(not(feature = "dhat-heap"))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs one recreate pass over a JSON problem
    Solve {
        #[command(flatten)]
        args: SolveArgs,
    },
    /// Prints the JSON schema of the problem input
    Schema {
        /// Output file, printed to stdout when absent
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Describe the solution output instead
        #[arg(long)]
        solution: bool,
    },
}

fn main() -> Result<(), anyhow::Error> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve { args } => solve::run(args)?,
        Commands::Schema { out, solution } => {
            let schema = if solution {
                hermes_multitrip::json::schema::generate_solution_json_schema()?
            } else {
                hermes_multitrip::json::schema::generate_json_schema()?
            };

            match out {
                Some(out) => {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }

                    std::fs::write(out, schema)?;
                }
                None => println!("{schema}"),
            }
        }
    }

    Ok(())
}
