//! The implicit k-dimensional alignment lattice.
//!
//! Nodes are coordinate tuples; edges exist from a node to every node
//! obtained by incrementing a non-empty subset of in-bounds dimensions by
//! one. The graph is never materialized: neighbors are generated on demand.

use smallvec::SmallVec;

/// Coordinates for up to this many sequences are stored inline; larger
/// instances spill to the heap.
pub const INLINE_DIMS: usize = 8;

pub type Coordinates = SmallVec<[u32; INLINE_DIMS]>;

/// One point of the alignment lattice. A plain value object: equality and
/// hashing are structural over the coordinate tuple.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct LatticeNode {
    coords: Coordinates,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl LatticeNode {
    pub fn new(coords: impl Into<Coordinates>) -> Self {
        Self { coords: coords.into() }
    }

    /// The all-zero corner.
    pub fn source(dims: usize) -> Self {
        Self { coords: std::iter::repeat(0).take(dims).collect() }
    }

    /// The corner at the per-sequence lengths.
    pub fn target(bounds: &[u32]) -> Self {
        Self { coords: SmallVec::from_slice(bounds) }
    }

    #[inline]
    pub fn coords(&self) -> &[u32] {
        &self.coords
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    /// Iterate over the `2^d - 1` forward neighbors, `d` being the number of
    /// dimensions still below their bound. Generation is lazy; nothing is
    /// materialized up front.
    pub fn children<'a>(&'a self, bounds: &[u32]) -> Neighbors<'a> {
        debug_assert_eq!(bounds.len(), self.dims());

        let movable = self
            .coords
            .iter()
            .zip(bounds)
            .enumerate()
            .filter(|&(_, (&coord, &bound))| coord < bound)
            .map(|(dim, _)| dim as u8)
            .collect();

        Neighbors::new(self, movable, Direction::Forward)
    }

    /// Iterate over the `2^d - 1` backward neighbors, `d` being the number
    /// of nonzero dimensions.
    pub fn parents(&self) -> Neighbors<'_> {
        let movable = self
            .coords
            .iter()
            .enumerate()
            .filter(|&(_, &coord)| coord > 0)
            .map(|(dim, _)| dim as u8)
            .collect();

        Neighbors::new(self, movable, Direction::Backward)
    }
}

/// Lazy neighbor generation: every non-empty subset of the movable
/// dimensions, encoded as a bit pattern, yields one neighbor.
pub struct Neighbors<'a> {
    origin: &'a LatticeNode,
    movable: SmallVec<[u8; INLINE_DIMS]>,
    direction: Direction,
    subset: u64,
    last: u64,
}

impl<'a> Neighbors<'a> {
    fn new(origin: &'a LatticeNode, movable: SmallVec<[u8; INLINE_DIMS]>, direction: Direction) -> Self {
        let last = (1u64 << movable.len()) - 1;

        Self { origin, movable, direction, subset: 1, last }
    }
}

impl Iterator for Neighbors<'_> {
    type Item = LatticeNode;

    fn next(&mut self) -> Option<LatticeNode> {
        if self.subset > self.last {
            return None;
        }

        let mut coords = self.origin.coords.clone();
        let mut bits = self.subset;
        while bits != 0 {
            let dim = self.movable[bits.trailing_zeros() as usize] as usize;
            match self.direction {
                Direction::Forward => coords[dim] += 1,
                Direction::Backward => coords[dim] -= 1,
            }

            bits &= bits - 1;
        }

        self.subset += 1;
        Some(LatticeNode { coords })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last + 1 - self.subset) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Neighbors<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn coord_set(nodes: impl Iterator<Item = LatticeNode>) -> HashSet<Vec<u32>> {
        nodes.map(|n| n.coords().to_vec()).collect()
    }

    #[test]
    fn source_with_two_sequences_has_three_children() {
        let source = LatticeNode::source(2);
        let children = coord_set(source.children(&[4, 3]));

        assert_eq!(children.len(), 3);
        assert!(children.contains(&vec![1, 0]));
        assert!(children.contains(&vec![0, 1]));
        assert!(children.contains(&vec![1, 1]));
    }

    #[test]
    fn target_has_no_children() {
        let bounds = [4, 3];
        let target = LatticeNode::target(&bounds);
        assert_eq!(target.children(&bounds).count(), 0);
    }

    #[test]
    fn source_has_no_parents() {
        assert_eq!(LatticeNode::source(3).parents().count(), 0);
    }

    #[test]
    fn children_respect_bounds() {
        let node = LatticeNode::new(Coordinates::from_slice(&[2, 3]));
        // Dimension 1 is at its bound, so only dimension 0 can advance.
        let children = coord_set(node.children(&[4, 3]));

        assert_eq!(children, HashSet::from([vec![3, 3]]));
    }

    #[test]
    fn parents_mirror_children() {
        let bounds = [2, 2, 2];
        let node = LatticeNode::new(Coordinates::from_slice(&[1, 1, 1]));

        for child in node.children(&bounds) {
            let parents = coord_set(child.parents());
            assert!(parents.contains(&node.coords().to_vec()));
        }
    }

    #[test]
    fn neighbor_count_is_exact() {
        let node = LatticeNode::new(Coordinates::from_slice(&[1, 0, 2]));
        let children = node.children(&[3, 3, 3]);
        assert_eq!(children.len(), 7);

        let parents = node.parents();
        assert_eq!(parents.len(), 3);
        assert_eq!(parents.count(), 3);
    }

    #[test]
    fn structural_equality() {
        let a = LatticeNode::new(Coordinates::from_slice(&[1, 2]));
        let b = LatticeNode::new(Coordinates::from_slice(&[1, 2]));
        let c = LatticeNode::new(Coordinates::from_slice(&[2, 1]));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
