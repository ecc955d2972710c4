//! Synchronous round driver.
//!
//! One round, start to finish:
//!
//! ```text
//! snapshot current buffer -> dominant labels -> subgroups
//!   -> convergence classes -> next distributions -> swap buffers
//! ```
//!
//! A round is atomic: it either swaps in a complete next buffer or leaves
//! the current buffer untouched and aborts the run. There is no built-in
//! stopping rule; callers decide when the population has converged.

use tracing::{debug, error, info};
use unipolar_topology::Topology;

use crate::classify::classify;
use crate::config::ConvergenceConfig;
use crate::distribution::{dominant, DistributionStore};
use crate::error::{Error, Result};
use crate::observe::Observation;
use crate::snapshot::RoundSnapshot;
use crate::subgroup::detect;
use crate::update::{update_all, NodeOutcome, Sharpener};

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Between rounds
    Idle,
    /// A round is computing
    Running,
    /// A round failed; no further rounds run
    Aborted,
}

/// Result of one completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// Labels, subgroups and new confidences
    pub observation: Observation,
    /// Nodes whose neighbors all agreed with them
    pub converged: usize,
    /// Converged nodes that were also sharpened
    pub sharpened: usize,
}

impl RoundReport {
    /// Round number this report describes.
    pub fn round(&self) -> u64 {
        self.observation.round
    }

    /// Nodes that took the subgroup-weighted branch.
    pub fn divergent(&self) -> usize {
        self.observation.nodes.len() - self.converged
    }
}

/// Owns the topology and distributions of a run and advances it one round
/// at a time.
#[derive(Debug)]
pub struct RoundDriver {
    topology: Topology,
    store: DistributionStore,
    config: ConvergenceConfig,
    sharpener: Sharpener,
    round: u64,
    state: DriverState,
    unanimous: bool,
}

impl RoundDriver {
    /// Start a run. The store must have one row per node and
    /// `config.decision_count` decisions per row.
    pub fn new(
        topology: Topology,
        store: DistributionStore,
        config: ConvergenceConfig,
    ) -> Result<Self> {
        config.validate()?;

        if store.decision_count() != config.decision_count {
            return Err(Error::InvalidDistribution {
                row: 0,
                reason: format!(
                    "rows have {} decisions, configuration expects {}",
                    store.decision_count(),
                    config.decision_count
                ),
            });
        }
        if store.node_count() != topology.node_count() {
            return Err(Error::InvalidDistribution {
                row: store.node_count().min(topology.node_count()),
                reason: format!(
                    "expected {} rows for {} nodes, got {}",
                    topology.node_count(),
                    topology.node_count(),
                    store.node_count()
                ),
            });
        }

        Ok(Self {
            topology,
            store,
            sharpener: Sharpener::from_config(&config),
            config,
            round: 0,
            state: DriverState::Idle,
            unanimous: false,
        })
    }

    /// Validate and normalize raw rows, then start a run.
    pub fn from_rows(
        topology: Topology,
        rows: Vec<Vec<f64>>,
        config: ConvergenceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let store = DistributionStore::from_rows(rows, config.decision_count)?;
        Self::new(topology, store, config)
    }

    /// Number of completed rounds.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The graph this run uses.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The run configuration.
    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Distributions as of the last completed round.
    pub fn distributions(&self) -> &DistributionStore {
        &self.store
    }

    /// Labels and subgroups of the current distributions, without running
    /// a round.
    pub fn observe(&self) -> Result<Observation> {
        let labels: Vec<usize> = self.store.rows().map(dominant).collect();
        let subgroups = detect(&self.topology, &labels)?;
        Ok(Observation::capture(self.round, &labels, &subgroups, &self.store))
    }

    /// Run one round.
    ///
    /// On failure the current distributions are left as they were, the
    /// driver moves to [`DriverState::Aborted`], and every later call
    /// returns [`Error::Aborted`].
    pub fn step(&mut self) -> Result<RoundReport> {
        match self.state {
            DriverState::Idle => {}
            // Running here means an earlier round never finished
            DriverState::Running | DriverState::Aborted => {
                return Err(Error::Aborted { round: self.round });
            }
        }

        self.state = DriverState::Running;
        match self.execute() {
            Ok(report) => {
                self.round += 1;
                self.state = DriverState::Idle;
                Ok(report)
            }
            Err(e) => {
                error!(round = self.round, error = %e, "round failed, aborting run");
                self.state = DriverState::Aborted;
                Err(e)
            }
        }
    }

    /// Run `rounds` rounds, returning the last report.
    pub fn run(&mut self, rounds: usize) -> Result<Option<RoundReport>> {
        self.run_until(rounds, |_| false)
    }

    /// Run until `done` accepts a report or `max_rounds` have run.
    pub fn run_until<F>(&mut self, max_rounds: usize, mut done: F) -> Result<Option<RoundReport>>
    where
        F: FnMut(&RoundReport) -> bool,
    {
        let mut last = None;
        for _ in 0..max_rounds {
            let report = self.step()?;
            let stop = done(&report);
            last = Some(report);
            if stop {
                break;
            }
        }
        Ok(last)
    }

    fn execute(&mut self) -> Result<RoundReport> {
        let round = self.round;
        let decisions = self.store.decision_count();

        let (current, next) = self.store.buffers();
        let snapshot = RoundSnapshot::new(round, current, decisions);
        let subgroups = detect(&self.topology, snapshot.labels())?;
        let convergence = classify(&self.topology, snapshot.labels());
        let outcomes = update_all(
            &self.topology,
            &snapshot,
            &subgroups,
            &convergence,
            &self.sharpener,
            next,
        )?;
        let labels = snapshot.into_labels();

        self.store.swap();

        let converged = convergence.iter().filter(|c| c.is_converged()).count();
        let sharpened = outcomes
            .iter()
            .filter(|o| **o == NodeOutcome::Sharpened)
            .count();
        let observation = Observation::capture(round, &labels, &subgroups, &self.store);

        debug!(
            round,
            subgroups = subgroups.len(),
            converged,
            sharpened,
            mean_confidence = observation.mean_confidence(),
            "round complete"
        );

        let unanimous = observation.is_unanimous();
        if unanimous && !self.unanimous {
            info!(round, decision = labels.first().copied(), "population unanimous");
        }
        self.unanimous = unanimous;

        Ok(RoundReport {
            observation,
            converged,
            sharpened,
        })
    }
}
