//! Next-round distributions: averaging plus unipolarity sharpening.
//!
//! # Converged nodes
//!
//! A node whose neighbors all share its dominant decision takes the
//! equal-weight mean of its own and its neighbors' distributions. If the
//! clique (node plus neighbors) already agrees closely, the mean is then
//! sharpened with a linear rank multiplier:
//!
//! ```text
//! diff_max  = max pairwise L1 distance inside the clique
//! ratio     = diff_max / threshold                 (only if diff_max < threshold)
//! small_end = (1/D) * ratio^power
//! large_end = (2/D) - small_end
//! m(rank)   = small_end + rank/(D-1) * (large_end - small_end)
//! ```
//!
//! Ranks run from the smallest probability (0) to the largest (D-1), so the
//! multiplier averages 1/D and moves mass toward the dominant decision. The
//! closer the clique agrees, the smaller `small_end` and the steeper the
//! multiplier.
//!
//! # Divergent nodes
//!
//! A node with at least one dissenting neighbor takes a mean weighted by
//! subgroup size, so large established subgroups pull harder on boundary
//! nodes than isolated dissenters do. Divergent nodes are never sharpened.
//!
//! Every read comes from the [`RoundSnapshot`]; every write goes to the
//! node's own slot in the next buffer.

use rayon::prelude::*;
use unipolar_topology::{NodeIndex, Topology};

use crate::classify::Convergence;
use crate::config::ConvergenceConfig;
use crate::distribution::{l1_distance, normalize_in_place};
use crate::error::{Error, Result};
use crate::snapshot::RoundSnapshot;
use crate::subgroup::Subgroups;

/// Which branch produced a node's next distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOutcome {
    /// Converged, clique agreed closely: averaged then sharpened
    Sharpened,
    /// Converged, clique too spread out: averaged only
    Averaged,
    /// Divergent: subgroup-size weighted average
    Weighted,
}

/// Rank-multiplier construction for converged cliques.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpener {
    threshold: f64,
    power: f64,
}

impl Sharpener {
    /// Sharpener with an explicit threshold and power.
    pub fn new(threshold: f64, power: f64) -> Self {
        Self { threshold, power }
    }

    /// Sharpener from a run configuration.
    pub fn from_config(config: &ConvergenceConfig) -> Self {
        Self::new(config.convergence_threshold, config.sharpen_power)
    }

    /// Small and large multiplier ends, or `None` when `diff_max` is at or
    /// above the threshold.
    pub fn ends(&self, diff_max: f64, decisions: usize) -> Option<(f64, f64)> {
        if !(diff_max < self.threshold) {
            return None;
        }
        let ratio = diff_max / self.threshold;
        let d = decisions as f64;
        let small = (1.0 / d) * ratio.powf(self.power);
        Some((small, 2.0 / d - small))
    }

    /// Per-decision multipliers for `row`, indexed by decision.
    ///
    /// Entries are ranked ascending by probability. Equal probabilities rank
    /// higher decision indices first, so the lowest-index maximum (the
    /// dominant decision) always gets `large_end`. Returns `None` when no
    /// sharpening applies: `diff_max` is not below the threshold, or there
    /// is only one decision.
    pub fn multipliers(&self, row: &[f64], diff_max: f64) -> Option<Vec<f64>> {
        let decisions = row.len();
        if decisions < 2 {
            return None;
        }
        let (small, large) = self.ends(diff_max, decisions)?;

        let mut order: Vec<usize> = (0..decisions).collect();
        order.sort_by(|&a, &b| row[a].total_cmp(&row[b]).then(b.cmp(&a)));

        let span = (decisions - 1) as f64;
        let mut multipliers = vec![0.0; decisions];
        for (rank, &decision) in order.iter().enumerate() {
            multipliers[decision] = small + rank as f64 / span * (large - small);
        }
        Some(multipliers)
    }
}

/// Largest pairwise L1 distance among `node` and its neighbors.
///
/// A node without neighbors has no pairs and agrees with itself: 0.
pub fn clique_diff_max(topology: &Topology, snapshot: &RoundSnapshot<'_>, node: NodeIndex) -> f64 {
    let clique: Vec<&[f64]> = std::iter::once(node)
        .chain(topology.neighbors(node).iter().copied())
        .map(|n| snapshot.row(n))
        .collect();

    let mut diff_max = 0.0f64;
    for (i, a) in clique.iter().enumerate() {
        for b in &clique[i + 1..] {
            diff_max = diff_max.max(l1_distance(a, b));
        }
    }
    diff_max
}

/// Write the weighted sum of `rows` into `out` and normalize it.
///
/// Returns `None` when the sum has nothing to normalize by.
pub fn weighted_mean<'r, I>(out: &mut [f64], rows: I) -> Option<()>
where
    I: IntoIterator<Item = (f64, &'r [f64])>,
{
    out.fill(0.0);
    for (weight, row) in rows {
        for (acc, value) in out.iter_mut().zip(row) {
            *acc += weight * value;
        }
    }
    normalize_in_place(out).map(|_| ())
}

/// Compute `node`'s next distribution into `out`.
pub fn update_node(
    topology: &Topology,
    snapshot: &RoundSnapshot<'_>,
    subgroups: &Subgroups,
    convergence: Convergence,
    sharpener: &Sharpener,
    node: NodeIndex,
    out: &mut [f64],
) -> Result<NodeOutcome> {
    let degenerate = || Error::DegenerateSum {
        node,
        round: snapshot.round(),
    };
    let clique = std::iter::once(node).chain(topology.neighbors(node).iter().copied());

    match convergence {
        Convergence::Converged => {
            weighted_mean(out, clique.map(|n| (1.0, snapshot.row(n)))).ok_or_else(degenerate)?;

            let diff_max = clique_diff_max(topology, snapshot, node);
            match sharpener.multipliers(out, diff_max) {
                Some(multipliers) => {
                    for (value, m) in out.iter_mut().zip(&multipliers) {
                        *value *= m;
                    }
                    normalize_in_place(out).ok_or_else(degenerate)?;
                    Ok(NodeOutcome::Sharpened)
                }
                None => Ok(NodeOutcome::Averaged),
            }
        }
        Convergence::Divergent => {
            let weighted = clique.map(|n| (subgroups.size_of(n) as f64, snapshot.row(n)));
            weighted_mean(out, weighted).ok_or_else(degenerate)?;
            Ok(NodeOutcome::Weighted)
        }
    }
}

/// Compute every node's next distribution into `next`, in parallel.
///
/// `next` is row-major with the snapshot's width; each node owns its row.
pub fn update_all(
    topology: &Topology,
    snapshot: &RoundSnapshot<'_>,
    subgroups: &Subgroups,
    convergence: &[Convergence],
    sharpener: &Sharpener,
    next: &mut [f64],
) -> Result<Vec<NodeOutcome>> {
    next.par_chunks_mut(snapshot.decision_count())
        .enumerate()
        .map(|(node, out)| {
            update_node(
                topology,
                snapshot,
                subgroups,
                convergence[node],
                sharpener,
                node,
                out,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::distribution::dominant;
    use crate::subgroup::detect;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn assert_row_eq(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < EPS, "entry {}: {} != {}", i, a, e);
        }
    }

    fn default_sharpener() -> Sharpener {
        Sharpener::from_config(&ConvergenceConfig::new(2))
    }

    /// Run the updater for one node against freshly derived labels.
    fn next_row(
        topology: &Topology,
        values: &[f64],
        decisions: usize,
        node: usize,
    ) -> (Vec<f64>, NodeOutcome) {
        let snapshot = RoundSnapshot::new(0, values, decisions);
        let subgroups = detect(topology, snapshot.labels()).unwrap();
        let classes = classify(topology, snapshot.labels());
        let mut out = vec![0.0; decisions];
        let outcome = update_node(
            topology,
            &snapshot,
            &subgroups,
            classes[node],
            &default_sharpener(),
            node,
            &mut out,
        )
        .unwrap();
        (out, outcome)
    }

    #[test]
    fn ends_average_to_uniform() {
        let s = default_sharpener();
        let (small, large) = s.ends(0.15, 4).unwrap();
        assert!(((small + large) / 2.0 - 0.25).abs() < EPS);
        assert!(small < large);
        assert!(s.ends(0.3, 4).is_none());
        assert!(s.ends(0.5, 4).is_none());
    }

    #[test]
    fn perfect_agreement_zeroes_the_smallest_rank() {
        let s = default_sharpener();
        let m = s.multipliers(&[0.4, 0.3, 0.2, 0.1], 0.0).unwrap();
        // small_end = 0, large_end = 2/4
        assert_row_eq(&m, &[0.5, 1.0 / 3.0, 1.0 / 6.0, 0.0]);
    }

    #[test]
    fn multipliers_increase_with_rank() {
        let s = default_sharpener();
        let row = [0.1, 0.5, 0.15, 0.25];
        let m = s.multipliers(&row, 0.1).unwrap();
        assert!(m[0] < m[2] && m[2] < m[3] && m[3] < m[1]);
    }

    #[test]
    fn ties_give_dominant_the_top_rank() {
        let s = default_sharpener();
        let m = s.multipliers(&[0.5, 0.5], 0.0).unwrap();
        assert_row_eq(&m, &[1.0, 0.0]);

        let m = s.multipliers(&[0.2, 0.4, 0.4], 0.1).unwrap();
        assert!(m[1] > m[2]);
        assert!(m[2] > m[0]);
    }

    #[test]
    fn single_decision_is_never_sharpened() {
        assert!(default_sharpener().multipliers(&[1.0], 0.0).is_none());
    }

    #[test]
    fn weighted_mean_of_host_and_neighbor() {
        let host = [0.6, 0.3, 0.1];
        let neighbor = [0.2, 0.2, 0.6];
        let mut out = [0.0; 3];
        weighted_mean(&mut out, [(3.0, &host[..]), (1.0, &neighbor[..])]).unwrap();
        let expected: Vec<f64> = host
            .iter()
            .zip(&neighbor)
            .map(|(h, n)| (3.0 * h + n) / 4.0)
            .collect();
        assert_row_eq(&out, &expected);
    }

    #[test]
    fn weighted_mean_rejects_zero_weight() {
        let mut out = [0.0; 2];
        assert!(weighted_mean(&mut out, [(0.0, &[0.5, 0.5][..])]).is_none());
    }

    #[test]
    fn isolated_node_keeps_distribution_before_sharpening() {
        let topology = Topology::isolated(1);
        let values = [0.7, 0.2, 0.1];
        let snapshot = RoundSnapshot::new(0, &values, 3);
        assert_eq!(clique_diff_max(&topology, &snapshot, 0), 0.0);

        let mut out = [0.0; 3];
        weighted_mean(&mut out, [(1.0, snapshot.row(0))]).unwrap();
        assert_row_eq(&out, &values);

        // No pairs means perfect agreement, so the node sharpens
        let (next, outcome) = next_row(&topology, &values, 3, 0);
        assert_eq!(outcome, NodeOutcome::Sharpened);
        assert!(next[0] > 0.7);
    }

    #[test]
    fn spread_clique_only_averages() {
        // Path 0 - 1 - 2: node 1 sees [0.9, 0.1] and [0.5, 0.5], L1 = 0.8
        let topology = Topology::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let values = [0.9, 0.1, 0.5, 0.5, 0.5, 0.5];
        let (next, outcome) = next_row(&topology, &values, 2, 1);
        assert_eq!(outcome, NodeOutcome::Averaged);
        assert_row_eq(&next, &[1.9 / 3.0, 1.1 / 3.0]);
    }

    #[test]
    fn divergent_node_weights_by_subgroup_size() {
        // 0 - 1 - 2 - 3, nodes 0..=2 prefer decision 0 and node 3 prefers 1
        let topology = Topology::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let values = [0.8, 0.2, 0.7, 0.3, 0.6, 0.4, 0.1, 0.9];

        // Node 3: own subgroup of 1, neighbor 2 in a subgroup of 3
        let (next, outcome) = next_row(&topology, &values, 2, 3);
        assert_eq!(outcome, NodeOutcome::Weighted);
        assert_row_eq(&next, &[(0.1 + 3.0 * 0.6) / 4.0, (0.9 + 3.0 * 0.4) / 4.0]);

        // Node 2: itself and node 1 weigh 3 each, node 3 weighs 1
        let (next, _) = next_row(&topology, &values, 2, 2);
        assert_row_eq(
            &next,
            &[(3.0 * 0.6 + 3.0 * 0.7 + 0.1) / 7.0, (3.0 * 0.4 + 3.0 * 0.3 + 0.9) / 7.0],
        );
    }

    #[test]
    fn update_all_fills_every_row() {
        let topology = Topology::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let values = [0.9, 0.1, 0.5, 0.5, 0.5, 0.5];
        let snapshot = RoundSnapshot::new(0, &values, 2);
        let subgroups = detect(&topology, snapshot.labels()).unwrap();
        let classes = classify(&topology, snapshot.labels());
        let mut next = vec![0.0; values.len()];

        let outcomes = update_all(
            &topology,
            &snapshot,
            &subgroups,
            &classes,
            &default_sharpener(),
            &mut next,
        )
        .unwrap();

        assert_eq!(
            outcomes,
            vec![NodeOutcome::Averaged, NodeOutcome::Averaged, NodeOutcome::Sharpened]
        );
        assert_row_eq(&next[0..2], &[0.7, 0.3]);
        // Node 2's clique is two identical [0.5, 0.5] rows: ratio 0, the
        // tie resolves to decision 0 and decision 1 is multiplied by 0
        assert_row_eq(&next[4..6], &[1.0, 0.0]);
    }

    fn positive_row(decisions: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(0.01f64..1.0, decisions).prop_map(|mut row| {
            normalize_in_place(&mut row);
            row
        })
    }

    proptest! {
        #[test]
        fn sharpening_strictly_raises_the_dominant_probability(
            row in (2usize..12).prop_flat_map(positive_row),
            diff_max in 0.0f64..0.2999,
            power in 0.05f64..3.0,
        ) {
            let s = Sharpener::new(0.3, power);
            let top = dominant(&row);
            let m = s.multipliers(&row, diff_max).unwrap();

            let mut sharpened: Vec<f64> = row.iter().zip(&m).map(|(v, m)| v * m).collect();
            normalize_in_place(&mut sharpened).unwrap();

            prop_assert!(sharpened[top] > row[top]);
            prop_assert!((sharpened.iter().sum::<f64>() - 1.0).abs() < EPS);
            prop_assert_eq!(dominant(&sharpened), top);
        }

        #[test]
        fn no_multiplier_at_or_above_threshold(
            row in positive_row(5),
            diff_max in 0.3f64..2.0,
        ) {
            prop_assert!(default_sharpener().multipliers(&row, diff_max).is_none());
        }
    }
}
