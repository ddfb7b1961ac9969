use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::aligner::alignment::Alignment;
use crate::aligner::heuristic::AstarHeuristic;
use crate::aligner::queue::OpenQueue;
use crate::aligner::scoring::CostMatrix;
use crate::aligner::MstarAligner;
use crate::lattice::LatticeNode;

/// Expansion counters for a single search run.
#[derive(Copy, Clone, Debug, Default)]
pub struct AstarStats {
    /// Entries pushed onto the open queue, stale duplicates included.
    pub num_queued: usize,

    /// Entries popped from the open queue.
    pub num_popped: usize,

    /// Nodes whose children were generated (i.e., moved to the closed set).
    pub num_expanded: usize,
}

/// Best-first search over the full lattice, keyed by `g + h`.
///
/// With a consistent heuristic the first pop of the target is optimal and a
/// node never re-enters the open set after closing; stale queue entries are
/// skipped on pop (lazy deletion). The lattice is finite and the target is
/// reachable from everywhere, so queue exhaustion before reaching the target
/// means the neighbor generation or the heuristic is broken: that is a bug,
/// and the search panics rather than reporting a user-facing error.
pub(crate) fn astar_align<C, H>(instance: &MstarAligner<C>, heuristic: &H) -> (Alignment, AstarStats)
where
    C: CostMatrix,
    H: AstarHeuristic,
{
    let source = instance.source_node();
    let target = instance.target_node();
    let bounds = instance.bounds();

    let mut open = OpenQueue::new();
    let mut distance: FxHashMap<LatticeNode, u32> = FxHashMap::default();
    let mut parents: FxHashMap<LatticeNode, LatticeNode> = FxHashMap::default();
    let mut closed: FxHashSet<LatticeNode> = FxHashSet::default();
    let mut stats = AstarStats::default();

    distance.insert(source.clone(), 0);
    open.push(heuristic.h(&source), source);
    stats.num_queued += 1;

    while let Some((key, current)) = open.pop() {
        stats.num_popped += 1;

        if current == target {
            trace!(cost = distance[&current], "target reached");
            let alignment = traceback(instance, &parents, distance[&current]);
            return (alignment, stats);
        }

        if !closed.insert(current.clone()) {
            // Stale duplicate of an already finalized node.
            continue;
        }

        stats.num_expanded += 1;
        trace!(?current, key, "expanding");

        let g = distance[&current];
        for child in current.children(bounds) {
            if closed.contains(&child) {
                continue;
            }

            let tentative = g + instance.column_weight(&current, &child);
            let improved = match distance.get(&child) {
                Some(&known) => tentative < known,
                None => true,
            };

            if improved {
                distance.insert(child.clone(), tentative);
                parents.insert(child.clone(), current.clone());
                open.push(tentative + heuristic.h(&child), child);
                stats.num_queued += 1;
            }
        }
    }

    panic!("open queue exhausted before reaching the alignment target");
}

/// Walk the parent chain from the target back to the source and emit one
/// alignment column per edge.
fn traceback<C>(
    instance: &MstarAligner<C>,
    parents: &FxHashMap<LatticeNode, LatticeNode>,
    cost: u32,
) -> Alignment
where
    C: CostMatrix,
{
    let mut path = Vec::new();
    let mut node = instance.target_node();
    loop {
        path.push(node.clone());
        match parents.get(&node) {
            Some(parent) => node = parent.clone(),
            None => break,
        }
    }

    assert!(
        node == instance.source_node(),
        "parent chain from the target does not reach the source"
    );
    path.reverse();

    let mut rows = vec![Vec::new(); instance.sequences().len()];
    for step in path.windows(2) {
        let column = instance.column(&step[0], &step[1]);
        for (row, &symbol) in rows.iter_mut().zip(column.iter()) {
            row.push(symbol);
        }
    }

    let rows = rows
        .into_iter()
        .map(|row| String::from_utf8(row).expect("alignment rows are built from validated symbols"))
        .collect();

    Alignment::new(rows, cost)
}
