//! Probabilistic Convergence Runner
//!
//! Builds a honeycomb network, seeds every node with a random distribution
//! and drives rounds until the population is unanimous or the round budget
//! runs out.
//!
//! ```text
//! unipolar-sim [nodes] [rounds]
//! ```
//!
//! Environment: `UNIPOLAR_DECISIONS`, `UNIPOLAR_THRESHOLD`, `UNIPOLAR_POWER`,
//! `UNIPOLAR_SEED`, and `UNIPOLAR_JSON=1` to print the final state as JSON.

use std::env;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unipolar_consensus::{random_rows, ConvergenceConfig, Observation, RoundDriver, RoundReport};
use unipolar_topology::{HexCoord, Honeycomb};

const DEFAULT_NODES: usize = 30;
const DEFAULT_ROUNDS: usize = 500;
const DEFAULT_SEED: u64 = 42;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "unipolar_sim=info,unipolar_consensus=info";

/// Runner options from the command line and environment.
#[derive(Debug, Clone, PartialEq)]
struct SimConfig {
    nodes: usize,
    rounds: usize,
    seed: u64,
    json: bool,
    convergence: ConvergenceConfig,
}

impl SimConfig {
    fn from_args(args: &[String]) -> Result<Self, Box<dyn std::error::Error>> {
        let nodes = args
            .get(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NODES);
        if nodes == 0 {
            return Err("node count must be at least 1".into());
        }

        let rounds = args
            .get(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ROUNDS);

        let seed = match env::var("UNIPOLAR_SEED") {
            Ok(raw) => raw.trim().parse()?,
            Err(_) => DEFAULT_SEED,
        };

        let json = env::var("UNIPOLAR_JSON")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            nodes,
            rounds,
            seed,
            json,
            convergence: ConvergenceConfig::from_env()?,
        })
    }
}

/// Final state dump for `UNIPOLAR_JSON=1`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalState<'a> {
    seed: u64,
    rounds: u64,
    config: &'a ConvergenceConfig,
    coords: &'a [HexCoord],
    observation: &'a Observation,
}

fn summary_line(report: &RoundReport) -> String {
    let obs = &report.observation;
    format!(
        "round {:>5}  subgroups {:>4}  largest {:>4}  converged {:>4}  sharpened {:>4}  confidence {:.4}",
        obs.round,
        obs.subgroup_count,
        obs.largest_subgroup(),
        report.converged,
        report.sharpened,
        obs.mean_confidence(),
    )
}

fn outcome_line(last: Option<&RoundReport>, rounds: u64) -> String {
    let Some(report) = last else {
        return "No rounds run.".to_string();
    };
    let obs = &report.observation;
    match obs.nodes.first() {
        Some(first) if obs.is_unanimous() => format!(
            "Unanimous on decision {} after {} rounds (mean confidence {:.4})",
            first.dominant,
            rounds,
            obs.mean_confidence()
        ),
        Some(_) => format!(
            "No unanimity after {} rounds: {} subgroups remain",
            rounds, obs.subgroup_count
        ),
        None => format!("Empty network after {} rounds.", rounds),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let sim = SimConfig::from_args(&args)?;

    println!("Probabilistic Convergence");
    println!("=========================");
    println!();
    println!(
        "Nodes: {}  Decisions: {}  Threshold: {}  Power: {}  Seed: {}",
        sim.nodes,
        sim.convergence.decision_count,
        sim.convergence.convergence_threshold,
        sim.convergence.sharpen_power,
        sim.seed
    );
    println!();

    let comb = Honeycomb::spiral(sim.nodes);
    tracing::info!(
        nodes = sim.nodes,
        edges = comb.topology().edge_count(),
        "honeycomb built"
    );

    let mut rng = StdRng::seed_from_u64(sim.seed);
    let rows = random_rows(&mut rng, sim.nodes, sim.convergence.decision_count);
    let mut driver = RoundDriver::from_rows(comb.topology().clone(), rows, sim.convergence)?;

    let last = driver.run_until(sim.rounds, |report| {
        println!("{}", summary_line(report));
        report.observation.is_unanimous()
    })?;

    println!();
    println!("{}", outcome_line(last.as_ref(), driver.round()));

    if sim.json {
        let observation = match last {
            Some(report) => report.observation,
            None => driver.observe()?,
        };
        let state = FinalState {
            seed: sim.seed,
            rounds: driver.round(),
            config: driver.config(),
            coords: comb.coords(),
            observation: &observation,
        };
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}
