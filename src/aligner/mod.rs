pub mod alignment;
pub mod astar;
pub mod heuristic;
pub mod queue;
pub mod scoring;

use smallvec::SmallVec;
use tracing::debug;

use crate::alphabet::{Alphabet, GAP};
use crate::errors::MstarError;
use crate::lattice::{LatticeNode, INLINE_DIMS};

use alignment::Alignment;
use astar::astar_align;
use heuristic::{Dijkstra, PairwiseHeuristic};
use scoring::CostMatrix;

/// Upper bound on the number of sequences per instance. Neighbor subsets are
/// enumerated through a bitmask, and instances anywhere near this many
/// dimensions are intractable regardless.
pub const MAX_SEQUENCES: usize = 32;

/// One multiple sequence alignment problem: a cost model, a linear gap
/// penalty, and the ordered sequences to align. Sequence order fixes the
/// lattice dimension indices for the lifetime of the instance.
pub struct MstarAligner<C>
where
    C: CostMatrix,
{
    costs: C,
    gap_penalty: u32,
    sequences: Vec<Vec<u8>>,
    bounds: Vec<u32>,
}

impl<C> MstarAligner<C>
where
    C: CostMatrix,
{
    /// Validates every sequence against `alphabet`; on any failure no
    /// instance is created.
    pub fn new<I, S>(
        costs: C,
        gap_penalty: u32,
        alphabet: &Alphabet,
        sequences: I,
    ) -> Result<Self, MstarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let sequences: Vec<Vec<u8>> = sequences
            .into_iter()
            .map(|seq| seq.as_ref().to_vec())
            .collect();

        if sequences.is_empty() {
            return Err(MstarError::NoSequences);
        }

        if sequences.len() > MAX_SEQUENCES {
            return Err(MstarError::TooManySequences(sequences.len()));
        }

        let mut bounds = Vec::with_capacity(sequences.len());
        for (index, seq) in sequences.iter().enumerate() {
            alphabet.validate(index, seq)?;
            let length = u32::try_from(seq.len())
                .map_err(|_| MstarError::SequenceTooLong(index))?;
            bounds.push(length);
        }

        Ok(Self { costs, gap_penalty, sequences, bounds })
    }

    /// Optimal alignment via A* guided by the pairwise-decomposed heuristic.
    pub fn align(&self) -> Alignment {
        let heuristic = PairwiseHeuristic::compute(self);
        let (alignment, stats) = astar_align(self, &heuristic);
        debug!(
            num_queued = stats.num_queued,
            num_popped = stats.num_popped,
            num_expanded = stats.num_expanded,
            "A* search done"
        );

        alignment
    }

    /// Optimal alignment via uniform-cost search (no heuristic). Much
    /// slower; kept as a correctness oracle for [`Self::align`].
    pub fn align_brute(&self) -> Alignment {
        let (alignment, stats) = astar_align(self, &Dijkstra);
        debug!(
            num_queued = stats.num_queued,
            num_popped = stats.num_popped,
            num_expanded = stats.num_expanded,
            "uniform-cost search done"
        );

        alignment
    }

    #[inline]
    pub fn sequences(&self) -> &[Vec<u8>] {
        &self.sequences
    }

    #[inline]
    pub fn gap_penalty(&self) -> u32 {
        self.gap_penalty
    }

    /// Per-sequence lengths, i.e., the upper bound of each lattice dimension.
    #[inline]
    pub(crate) fn bounds(&self) -> &[u32] {
        &self.bounds
    }

    pub(crate) fn source_node(&self) -> LatticeNode {
        LatticeNode::source(self.sequences.len())
    }

    pub(crate) fn target_node(&self) -> LatticeNode {
        LatticeNode::target(&self.bounds)
    }

    /// The alignment column implied by the step `tail -> head`: dimensions
    /// that advance contribute their sequence symbol at the tail coordinate,
    /// the rest contribute the gap symbol.
    pub(crate) fn column(&self, tail: &LatticeNode, head: &LatticeNode) -> SmallVec<[u8; INLINE_DIMS]> {
        let tail_coords = tail.coords();
        let head_coords = head.coords();

        let mut column = SmallVec::with_capacity(self.sequences.len());
        for (dim, seq) in self.sequences.iter().enumerate() {
            debug_assert!(head_coords[dim] == tail_coords[dim] || head_coords[dim] == tail_coords[dim] + 1);

            if tail_coords[dim] + 1 == head_coords[dim] {
                column.push(seq[tail_coords[dim] as usize]);
            } else {
                column.push(GAP);
            }
        }

        column
    }

    /// Weight of the lattice edge `tail -> head`: the column cost summed over
    /// all sequence pairs. Substitution cost for two symbols, the gap penalty
    /// for symbol-vs-gap, nothing for gap-vs-gap.
    pub(crate) fn column_weight(&self, tail: &LatticeNode, head: &LatticeNode) -> u32 {
        let column = self.column(tail, head);

        let mut cost = 0;
        for i in 0..column.len() {
            for j in i + 1..column.len() {
                let (a, b) = (column[i], column[j]);
                if a == GAP {
                    if b != GAP {
                        cost += self.gap_penalty;
                    }
                } else if b == GAP {
                    cost += self.gap_penalty;
                } else {
                    cost += self.costs.cost(a, b);
                }
            }
        }

        cost
    }

    /// [`Self::column_weight`] restricted to the dimension pair
    /// `(dim_i, dim_j)`, on 2D-projected coordinates. At least one of the two
    /// dimensions must advance on the step.
    pub(crate) fn pair_weight(
        &self,
        dim_i: usize,
        dim_j: usize,
        tail: (u32, u32),
        head: (u32, u32),
    ) -> u32 {
        debug_assert!(tail != head);

        if tail.0 == head.0 || tail.1 == head.1 {
            self.gap_penalty
        } else {
            let a = self.sequences[dim_i][tail.0 as usize];
            let b = self.sequences[dim_j][tail.1 as usize];
            self.costs.cost(a, b)
        }
    }
}
