use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use carton_packer_core::{
    Carton, Item, ItemList, PackedCarton, Packer, PackerConfig, PackerError,
};
use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "carton-packer",
    about = "Pack a job of items into shipping cartons",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack the job into the best carton selection found
    Pack(PackArgs),
    /// Enumerate every complete carton combination (slow on big catalogues)
    Permutations(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input job file (JSON: items with quantities + carton catalogue)
    input: PathBuf,
    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
    /// Return a partial result instead of failing on unpackable items
    #[arg(long, default_value_t = false)]
    no_throw: bool,
    /// Pack items strictly in the order given
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Wall-clock budget in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,
    /// Skip weight balancing above this many cartons
    #[arg(long, default_value_t = 12)]
    max_balance: usize,
}

/// One line of the job's item manifest.
#[derive(Debug, Deserialize)]
struct JobItem {
    #[serde(flatten)]
    item: Item,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct JobFile {
    items: Vec<JobItem>,
    cartons: Vec<Carton>,
}

#[derive(Serialize)]
struct PlacementOut {
    description: String,
    x: u32,
    y: u32,
    z: u32,
    width: u32,
    length: u32,
    depth: u32,
}

#[derive(Serialize)]
struct CartonOut {
    reference: String,
    weight: u64,
    volume_utilisation: f64,
    items: Vec<PlacementOut>,
}

#[derive(Serialize)]
struct PackOut {
    cartons: Vec<CartonOut>,
    unpacked_items: Vec<String>,
    volume_utilisation: f64,
    weight_variance: f64,
}

#[derive(Serialize)]
struct PermutationsOut {
    solutions: Vec<Vec<CartonOut>>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Permutations(args) => run_permutations(args),
    }
}

fn run_pack(args: &PackArgs) -> anyhow::Result<()> {
    let mut packer = build_packer(args)?;

    let mut packed = match packer.pack() {
        Ok(packed) => packed,
        Err(err @ PackerError::NoCartonsAvailable { .. }) => {
            anyhow::bail!("{err} (re-run with --no-throw for a partial result)");
        }
        Err(err) => return Err(anyhow::anyhow!("{err}")),
    };

    let unpacked: Vec<String> = {
        let mut leftovers = packer.unpacked_items().clone();
        leftovers.iter().map(|i| i.description.clone()).collect()
    };
    if !unpacked.is_empty() {
        warn!(count = unpacked.len(), "some items could not be packed");
    }

    let result = PackOut {
        volume_utilisation: packed.volume_utilisation(),
        weight_variance: packed.weight_variance(),
        cartons: packed.iter().map(carton_out).collect(),
        unpacked_items: unpacked,
    };
    info!(
        cartons = result.cartons.len(),
        utilisation = result.volume_utilisation,
        "packing finished"
    );

    write_output(args, &serialize(&result, args.pretty)?)
}

fn run_permutations(args: &PackArgs) -> anyhow::Result<()> {
    let mut packer = build_packer(args)?;

    let solutions = packer
        .pack_all_permutations()
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    info!(count = solutions.len(), "permutation search finished");

    let result = PermutationsOut {
        solutions: solutions
            .into_iter()
            .map(|mut solution| solution.iter().map(carton_out).collect())
            .collect(),
    };

    write_output(args, &serialize(&result, args.pretty)?)
}

fn build_packer(args: &PackArgs) -> anyhow::Result<Packer> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("read job file {}", args.input.display()))?;
    let job: JobFile = serde_json::from_str(&raw)
        .with_context(|| format!("parse job file {}", args.input.display()))?;

    if job.cartons.is_empty() {
        warn!("job file lists no cartons");
    }

    let config = PackerConfig::builder()
        .throw_on_unpackable_item(!args.no_throw)
        .strict_item_ordering(args.strict)
        .max_cartons_to_balance_weight(args.max_balance)
        .timeout(args.timeout_secs.map(Duration::from_secs_f64))
        .build();

    let mut packer = Packer::with_config(config);
    let mut items = ItemList::new();
    for job_item in job.items {
        items.insert(job_item.item, job_item.quantity);
    }
    packer.set_items(items);
    for carton in job.cartons {
        packer.add_carton(carton);
    }

    Ok(packer)
}

fn carton_out(packed: &PackedCarton) -> CartonOut {
    CartonOut {
        reference: packed.carton.reference.clone(),
        weight: packed.weight(),
        volume_utilisation: packed.volume_utilisation(),
        items: packed
            .items
            .iter()
            .map(|item| PlacementOut {
                description: item.item.description.clone(),
                x: item.x,
                y: item.y,
                z: item.z,
                width: item.width,
                length: item.length,
                depth: item.depth,
            })
            .collect(),
    }
}

fn serialize<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn write_output(args: &PackArgs, json: &str) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote result");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
