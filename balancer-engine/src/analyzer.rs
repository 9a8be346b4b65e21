use balancer_core::{BalancerError, Result};

use crate::probe::ClusterSnapshot;

/// Outcome of one imbalance analysis pass.
///
/// `balanced` uses the loose `diff <= node_count` threshold rather than
/// exact equality, so the loop stops once the distribution is within one
/// queue's worth of imbalance per node instead of shuffling single queues
/// back and forth forever. This predicate alone decides loop termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImbalanceVerdict {
    pub max_node: String,
    pub max_count: usize,
    pub min_node: String,
    pub min_count: usize,
    pub diff: usize,
    pub node_count: usize,
    pub balanced: bool,
}

/// Ranks nodes by leadership count and produces the convergence verdict.
///
/// Ties are broken by discovery order (the sort is stable); which node
/// wins a tie is not significant to correctness.
pub fn analyze(snapshot: &ClusterSnapshot) -> Result<ImbalanceVerdict> {
    let mut ranked: Vec<(&str, usize)> = snapshot
        .counts
        .iter()
        .map(|(node, count)| (node.as_str(), *count))
        .collect();

    if ranked.is_empty() {
        return Err(BalancerError::Probe(
            "cannot analyze an empty snapshot".to_string(),
        ));
    }

    ranked.sort_by_key(|&(_, count)| count);

    let (min_node, min_count) = ranked[0];
    let (max_node, max_count) = ranked[ranked.len() - 1];
    let diff = max_count - min_count;
    let node_count = ranked.len();

    Ok(ImbalanceVerdict {
        max_node: max_node.to_string(),
        max_count,
        min_node: min_node.to_string(),
        min_count,
        diff,
        node_count,
        balanced: diff <= node_count,
    })
}
