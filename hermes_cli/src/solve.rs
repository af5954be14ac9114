use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
    sync::{Arc, atomic::Ordering},
    thread,
};

use anyhow::Context;
use clap::Args;
use comfy_table::Table;
use hermes_multitrip::{
    json::types::{JsonActivity, JsonMultiTripProblem, JsonSolution},
    solver::{
        recreate::{
            insertion_strategy::InsertionStrategy,
            recreate_params::Threads,
        },
        solution::working_solution::WorkingSolution,
    },
};
use tracing::{info, warn};

use crate::parsers;

#[derive(Args)]
pub struct SolveArgs {
    /// The problem to solve
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Where to write the solution, printed to stdout when absent
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Seed of the random job ordering, overrides the problem params
    #[arg(long)]
    seed: Option<u64>,

    /// Threads evaluating routes, 0 picks the available parallelism
    #[arg(short, long)]
    threads: Option<usize>,

    /// Stops the pass once elapsed (e.g., "30s", "5m", "PT1M")
    #[arg(long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,
}

pub fn run(args: SolveArgs) -> anyhow::Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let content: JsonMultiTripProblem = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    let mut params = content.params.clone().unwrap_or_default();
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if let Some(threads) = args.threads {
        params.insertion_threads = match threads {
            0 => Threads::Auto,
            1 => Threads::Single,
            threads => Threads::Multi(threads),
        };
    }

    let problem = Arc::new(content.build_problem()?);
    info!(
        destinations = problem.destinations().len(),
        vehicles = problem.vehicles().len(),
        unload_sites = problem.unload_sites().len(),
        sort_strategy = %params.sort_strategy,
        "problem loaded"
    );

    let strategy = InsertionStrategy::new(&problem, params)?;

    if let Some(timeout) = args.timeout {
        let stop = strategy.stop_handle();
        let timeout = timeout.unsigned_abs();
        thread::spawn(move || {
            thread::sleep(timeout);
            if !stop.swap(true, Ordering::Relaxed) {
                warn!("timeout reached, stopping");
            }
        });
    }

    let mut solution = WorkingSolution::new(Arc::clone(&problem));
    strategy.recreate(&mut solution)?;

    let output = JsonSolution::from(&solution);
    println!("{}", summary_table(&output));

    match args.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &output)?;
            info!("solution written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    Ok(())
}

fn summary_table(solution: &JsonSolution) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Vehicle", "Destinations", "Trips", "Costs", "End"]);

    for route in &solution.routes {
        let destinations = route
            .activities
            .iter()
            .filter(|activity| matches!(activity, JsonActivity::Destination { .. }))
            .count();

        table.add_row(vec![
            route.vehicle_id.clone(),
            destinations.to_string(),
            route.trip_count.to_string(),
            format!("{:.2}", route.transport_costs),
            route.end_time.to_string(),
        ]);
    }

    table.add_row(vec![
        "Total".to_owned(),
        format!("{} unassigned", solution.unassigned.len()),
        solution.trip_count.to_string(),
        format!("{:.2}", solution.transport_costs),
        String::new(),
    ]);

    table
}
