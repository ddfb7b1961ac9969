use itertools::Itertools;
use tracing::debug;

use crate::aligner::queue::OpenQueue;
use crate::aligner::scoring::CostMatrix;
use crate::aligner::MstarAligner;
use crate::lattice::LatticeNode;

/// Lower bound on the remaining cost from a lattice node to the target
/// corner. Must never overestimate for A* to stay optimal.
pub trait AstarHeuristic {
    fn h(&self, node: &LatticeNode) -> u32;
}

/// A* heuristic that always returns 0, such that A* reduces to standard
/// Dijkstra's algorithm. The brute-force oracle of the crate.
#[derive(Default)]
pub struct Dijkstra;

impl AstarHeuristic for Dijkstra {
    #[inline]
    fn h(&self, _: &LatticeNode) -> u32 {
        0
    }
}

/// Exact 2D shortest-path costs for one dimension pair, dense over the
/// `(len_i + 1) x (len_j + 1)` projected grid.
struct PairTable {
    dim_i: usize,
    dim_j: usize,
    stride: usize,
    costs: Vec<u32>,
}

impl PairTable {
    #[inline]
    fn lookup(&self, coords: &[u32]) -> u32 {
        self.costs[coords[self.dim_i] as usize * self.stride + coords[self.dim_j] as usize]
    }
}

/// Sum of exact pairwise lower bounds.
///
/// For every pair `(i, j)` the table holds the true minimum cost of
/// finishing the 2D sub-alignment of sequences `i` and `j` from the node's
/// projected coordinates. A full-lattice step projects, per pair, onto
/// either a 2D edge of identical pair weight or a zero-cost stay, so each
/// table is a consistent lower bound and the sum stays admissible and
/// consistent: closed nodes never need reopening.
pub struct PairwiseHeuristic {
    tables: Vec<PairTable>,
}

impl PairwiseHeuristic {
    /// Build the full table set for `instance` by running one backward
    /// Dijkstra sweep per sequence pair.
    pub fn compute<C>(instance: &MstarAligner<C>) -> Self
    where
        C: CostMatrix,
    {
        let dims = instance.sequences().len();
        let tables = (0..dims)
            .tuple_combinations()
            .map(|(dim_i, dim_j)| backward_sweep(instance, dim_i, dim_j))
            .collect();

        Self { tables }
    }
}

impl AstarHeuristic for PairwiseHeuristic {
    fn h(&self, node: &LatticeNode) -> u32 {
        let coords = node.coords();
        self.tables.iter().map(|table| table.lookup(coords)).sum()
    }
}

/// Dijkstra backwards from the pairwise target corner over reversed edges,
/// until the whole projected grid is finalized. Cell predecessors (in the
/// reversed orientation) are the three decrements: diagonal with the
/// substitution cost of the consumed symbols, horizontal and vertical with
/// the gap penalty.
fn backward_sweep<C>(instance: &MstarAligner<C>, dim_i: usize, dim_j: usize) -> PairTable
where
    C: CostMatrix,
{
    let rows = instance.sequences()[dim_i].len() + 1;
    let cols = instance.sequences()[dim_j].len() + 1;
    let stride = cols;

    let mut costs = vec![u32::MAX; rows * cols];
    let mut closed = vec![false; rows * cols];
    let mut open = OpenQueue::new();

    let target = rows * cols - 1;
    costs[target] = 0;
    open.push(0, target);

    while let Some((cost, cell)) = open.pop() {
        if closed[cell] {
            continue;
        }

        closed[cell] = true;

        let x = (cell / stride) as u32;
        let y = (cell % stride) as u32;

        let mut relax = |parent: usize, tail: (u32, u32)| {
            if closed[parent] {
                return;
            }

            let tentative = cost + instance.pair_weight(dim_i, dim_j, tail, (x, y));
            if tentative < costs[parent] {
                costs[parent] = tentative;
                open.push(tentative, parent);
            }
        };

        if x > 0 {
            relax(cell - stride, (x - 1, y));
        }
        if y > 0 {
            relax(cell - 1, (x, y - 1));
        }
        if x > 0 && y > 0 {
            relax(cell - stride - 1, (x - 1, y - 1));
        }
    }

    debug!(dim_i, dim_j, cells = rows * cols, "pairwise heuristic table done");

    PairTable { dim_i, dim_j, stride, costs }
}
