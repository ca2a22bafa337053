use crate::{constants::MAX_DEPTH, error::TreeError};

/// Axis-aligned bounding box of a set of bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn from_points(xs: &[f32], ys: &[f32]) -> Self {
        debug_assert_eq!(xs.len(), ys.len());
        if xs.is_empty() {
            return Self {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            };
        }

        let mut bounds = Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        for (&x, &y) in xs.iter().zip(ys) {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds
    }

    /// Side of the enclosing square.
    pub fn size(&self) -> f32 {
        (self.max_x - self.min_x).max(self.max_y - self.min_y)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Position of each quadrant's centre relative to its parent, in quarter sizes.
const QUADRANT_OFFSETS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Centre of mass
    pub cx: f32,
    pub cy: f32,
    /// Total mass in the node
    pub mass: f32,

    /// Centre of the square
    pub sx: f32,
    pub sy: f32,
    /// Side length of the square
    pub size: f32,

    /// Index of the first of four consecutive children, 0 for leaves.
    pub first_child: u32,
    /// Index of the first node outside this subtree, 0 when there is none.
    pub next: u32,
}

impl Node {
    fn empty(sx: f32, sy: f32, size: f32, next: u32) -> Self {
        // An empty node keeps its centre of mass at the square's centre.
        Self {
            cx: sx,
            cy: sy,
            mass: 0.0,
            sx,
            sy,
            size,
            first_child: 0,
            next,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.first_child == 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mass == 0.0
    }

    /// Quadrant of `(x, y)`: 0 = (x<=sx, y<=sy), 1 = (x>sx, y<=sy),
    /// 2 = (x>sx, y>sy), 3 = (x<=sx, y>sy).
    #[inline]
    pub fn quadrant(&self, x: f32, y: f32) -> u32 {
        match (x > self.sx, y > self.sy) {
            (false, false) => 0,
            (true, false) => 1,
            (true, true) => 2,
            (false, true) => 3,
        }
    }
}

/// Barnes-Hut quadtree stored as a flat node array.
///
/// Node 0 is the root. Children are addressed by index, so growing the
/// storage never invalidates `first_child` or `next`.
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<Node>,
    /// Subdivided nodes in the order they were split, parents before children.
    subdivided: Vec<u32>,
}

impl QuadTree {
    /// Allocate an empty tree. It has no root until the first `reset`.
    pub fn new(capacity_hint: usize) -> Result<Self, TreeError> {
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(capacity_hint.max(1))
            .map_err(|_| TreeError::AllocationFailure)?;
        let mut subdivided = Vec::new();
        subdivided
            .try_reserve_exact((capacity_hint * 3 / 4).max(1))
            .map_err(|_| TreeError::AllocationFailure)?;
        Ok(Self { nodes, subdivided })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn root(&self) -> Result<&Node, TreeError> {
        self.nodes.first().ok_or(TreeError::InvalidReference)
    }

    /// Indices of internal nodes, in subdivision order.
    pub fn subdivided(&self) -> &[u32] {
        &self.subdivided
    }

    /// Mass held by the root. Only meaningful after `propagate`.
    pub fn total_mass(&self) -> Result<f32, TreeError> {
        self.root().map(|root| root.mass)
    }

    fn ensure_initialized(&self) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            Err(TreeError::InvalidReference)
        } else {
            Ok(())
        }
    }

    /// Drop all nodes and start over with an empty root covering `bounds`.
    pub fn reset(&mut self, bounds: Bounds) -> Result<(), TreeError> {
        self.nodes.clear();
        self.subdivided.clear();
        self.reserve_nodes(1)?;

        let (sx, sy) = bounds.center();
        self.nodes.push(Node::empty(sx, sy, bounds.size(), 0));
        Ok(())
    }

    /// Reset to the bounds of the given bodies, insert all of them and propagate.
    pub fn build(&mut self, xs: &[f32], ys: &[f32], masses: &[f32]) -> Result<(), TreeError> {
        self.reset(Bounds::from_points(xs, ys))?;
        for ((&x, &y), &mass) in xs.iter().zip(ys).zip(masses) {
            self.insert(x, y, mass)?;
        }
        self.propagate()
    }

    pub fn insert(&mut self, x: f32, y: f32, mass: f32) -> Result<(), TreeError> {
        self.ensure_initialized()?;
        if mass == 0.0 {
            return Ok(());
        }

        let mut idx = 0;
        while !self.nodes[idx].is_leaf() {
            let node = &self.nodes[idx];
            idx = (node.first_child + node.quadrant(x, y)) as usize;
        }

        let leaf = &mut self.nodes[idx];
        if leaf.is_empty() {
            leaf.cx = x;
            leaf.cy = y;
            leaf.mass = mass;
            return Ok(());
        }
        if leaf.cx == x && leaf.cy == y {
            leaf.mass += mass;
            return Ok(());
        }

        let (old_x, old_y, old_mass) = (leaf.cx, leaf.cy, leaf.mass);
        for _ in 0..MAX_DEPTH {
            self.subdivide(idx)?;

            let node = &self.nodes[idx];
            let old_child = (node.first_child + node.quadrant(old_x, old_y)) as usize;
            let new_child = (node.first_child + node.quadrant(x, y)) as usize;
            if old_child != new_child {
                let old = &mut self.nodes[old_child];
                old.cx = old_x;
                old.cy = old_y;
                old.mass = old_mass;

                let new = &mut self.nodes[new_child];
                new.cx = x;
                new.cy = y;
                new.mass = mass;
                return Ok(());
            }
            idx = old_child;
        }

        // Out of f32 resolution, keep both bodies in one leaf.
        log::trace!("merging bodies at ({x}, {y}) and ({old_x}, {old_y}) at max depth");
        let leaf = &mut self.nodes[idx];
        let total = old_mass + mass;
        leaf.mass = total;
        if total != 0.0 {
            leaf.cx = (old_x * old_mass + x * mass) / total;
            leaf.cy = (old_y * old_mass + y * mass) / total;
        } else {
            leaf.cx = old_x;
            leaf.cy = old_y;
        }
        Ok(())
    }

    /// Recompute mass and centre of mass of every internal node from its children.
    pub fn propagate(&mut self) -> Result<(), TreeError> {
        self.ensure_initialized()?;

        // Reverse subdivision order visits children before their parents.
        for &idx in self.subdivided.iter().rev() {
            let first = self.nodes[idx as usize].first_child as usize;
            let (mut mass, mut mx, mut my) = (0.0, 0.0, 0.0);
            for child in &self.nodes[first..first + 4] {
                mass += child.mass;
                mx += child.mass * child.cx;
                my += child.mass * child.cy;
            }

            let node = &mut self.nodes[idx as usize];
            node.mass = mass;
            if mass != 0.0 {
                node.cx = mx / mass;
                node.cy = my / mass;
            } else {
                node.cx = node.sx;
                node.cy = node.sy;
            }
        }
        Ok(())
    }

    /// Split leaf `idx` into four empty children appended to the node array.
    fn subdivide(&mut self, idx: usize) -> Result<(), TreeError> {
        self.reserve_nodes(4)?;
        self.reserve_subdivided()?;
        let first = u32::try_from(self.nodes.len()).map_err(|_| TreeError::AllocationFailure)?;
        if first.checked_add(4).is_none() {
            return Err(TreeError::AllocationFailure);
        }

        let parent = &mut self.nodes[idx];
        parent.first_child = first;
        parent.mass = 0.0;
        let parent = *parent;
        self.subdivided.push(idx as u32);

        let quarter = 0.25 * parent.size;
        for (k, (ox, oy)) in (0u32..).zip(QUADRANT_OFFSETS) {
            // Siblings chain to each other, the last one continues after the parent.
            let next = if k < 3 { first + k + 1 } else { parent.next };
            self.nodes.push(Node::empty(
                parent.sx + ox * quarter,
                parent.sy + oy * quarter,
                0.5 * parent.size,
                next,
            ));
        }
        Ok(())
    }

    /// Make room for `additional` nodes, doubling the capacity when full.
    fn reserve_nodes(&mut self, additional: usize) -> Result<(), TreeError> {
        let needed = self.nodes.len() + additional;
        let capacity = self.nodes.capacity();
        if needed <= capacity {
            return Ok(());
        }

        let mut new_capacity = capacity.max(1);
        while new_capacity < needed {
            new_capacity *= 2;
        }
        log::debug!("growing quadtree from {capacity} to {new_capacity} nodes");
        self.nodes
            .try_reserve_exact(new_capacity - self.nodes.len())
            .map_err(|_| TreeError::AllocationFailure)
    }

    /// Make room for one more subdivision record, growing by half when full.
    fn reserve_subdivided(&mut self) -> Result<(), TreeError> {
        let capacity = self.subdivided.capacity();
        if self.subdivided.len() < capacity {
            return Ok(());
        }

        let new_capacity = (capacity + capacity / 2).max(capacity + 1);
        self.subdivided
            .try_reserve_exact(new_capacity - self.subdivided.len())
            .map_err(|_| TreeError::AllocationFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(points: &[(f32, f32, f32)]) -> QuadTree {
        let xs: Vec<f32> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f32> = points.iter().map(|p| p.1).collect();
        let ms: Vec<f32> = points.iter().map(|p| p.2).collect();
        let mut tree = QuadTree::new(4).unwrap();
        tree.build(&xs, &ys, &ms).unwrap();
        tree
    }

    /// Pre-order walk using the child links only.
    fn preorder(tree: &QuadTree, idx: usize, out: &mut Vec<usize>) {
        out.push(idx);
        let node = tree.nodes()[idx];
        if !node.is_leaf() {
            for k in 0..4 {
                preorder(tree, node.first_child as usize + k, out);
            }
        }
    }

    #[test]
    fn uninitialized_tree_is_invalid_reference() {
        let mut tree = QuadTree::new(16).unwrap();
        assert_eq!(tree.insert(1.0, 1.0, 1.0), Err(TreeError::InvalidReference));
        assert_eq!(tree.propagate(), Err(TreeError::InvalidReference));
        assert_eq!(tree.total_mass(), Err(TreeError::InvalidReference));
    }

    #[test]
    fn reset_covers_bounding_box_with_square() {
        let mut tree = QuadTree::new(4).unwrap();
        let bounds = Bounds::from_points(&[-2.0, 6.0], &[1.0, 3.0]);
        tree.reset(bounds).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(root.size, 8.0);
        assert_eq!((root.sx, root.sy), (2.0, 2.0));
        assert_eq!((root.cx, root.cy), (2.0, 2.0));
        assert!(root.is_empty() && root.is_leaf());
        assert_eq!(root.next, 0);
    }

    #[test]
    fn quadrant_mapping() {
        let node = Node::empty(0.0, 0.0, 2.0, 0);
        assert_eq!(node.quadrant(-0.5, -0.5), 0);
        assert_eq!(node.quadrant(0.5, -0.5), 1);
        assert_eq!(node.quadrant(0.5, 0.5), 2);
        assert_eq!(node.quadrant(-0.5, 0.5), 3);
        // Points on the dividing lines go to the lower side.
        assert_eq!(node.quadrant(0.0, 0.0), 0);
        assert_eq!(node.quadrant(0.5, 0.0), 1);
        assert_eq!(node.quadrant(0.0, 0.5), 3);
    }

    #[test]
    fn total_mass_matches_inserted_mass() {
        let points: Vec<(f32, f32, f32)> = (0..500)
            .map(|i| {
                let t = i as f32 * 0.37;
                (t.cos() * (1.0 + t), t.sin() * (2.0 + 0.5 * t), 1.0 + (i % 7) as f32)
            })
            .collect();
        let tree = tree_with(&points);

        let expected: f32 = points.iter().map(|p| p.2).sum();
        let total = tree.total_mass().unwrap();
        assert!((total - expected).abs() <= expected * 1e-5, "{total} vs {expected}");
    }

    #[test]
    fn internal_nodes_hold_weighted_centroid() {
        let tree = tree_with(&[(0.0, 0.0, 1.0), (4.0, 0.0, 3.0), (4.0, 4.0, 4.0)]);
        let root = tree.root().unwrap();
        assert!((root.mass - 8.0).abs() < 1e-6);
        assert!((root.cx - (0.0 + 12.0 + 16.0) / 8.0).abs() < 1e-5);
        assert!((root.cy - 16.0 / 8.0).abs() < 1e-5);
    }

    #[test]
    fn coincident_bodies_merge_without_subdividing() {
        let mut tree = QuadTree::new(4).unwrap();
        tree.reset(Bounds::from_points(&[0.0, 1.0], &[0.0, 1.0])).unwrap();
        tree.insert(0.25, 0.75, 2.0).unwrap();
        tree.insert(0.25, 0.75, 3.0).unwrap();
        tree.propagate().unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.subdivided().is_empty());
        let root = tree.root().unwrap();
        assert_eq!(root.mass, 5.0);
        assert_eq!((root.cx, root.cy), (0.25, 0.75));
    }

    #[test]
    fn all_bodies_at_one_point() {
        let tree = tree_with(&[(3.0, 3.0, 1.0); 10]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.total_mass().unwrap(), 10.0);
    }

    #[test]
    fn zero_mass_bodies_are_skipped() {
        let tree = tree_with(&[(0.0, 0.0, 1.0), (1.0, 1.0, 0.0)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.total_mass().unwrap(), 1.0);
    }

    #[test]
    fn children_are_consecutive_and_subdivisions_top_down() {
        let tree = tree_with(&[(0.0, 0.0, 1.0), (0.1, 0.1, 1.0), (8.0, 8.0, 1.0)]);
        for &idx in tree.subdivided() {
            let node = tree.nodes()[idx as usize];
            assert!(!node.is_leaf());
            assert!(node.first_child as usize + 4 <= tree.len());
            assert!(node.first_child > idx);
            for k in 0..4 {
                let child = tree.nodes()[node.first_child as usize + k];
                assert_eq!(child.size, node.size * 0.5);
            }
        }
        // Every internal node was recorded, each after its parent.
        let internal = tree.nodes().iter().filter(|n| !n.is_leaf()).count();
        assert_eq!(internal, tree.subdivided().len());
        let order = |idx: u32| tree.subdivided().iter().position(|&i| i == idx);
        for (pos, &idx) in tree.subdivided().iter().enumerate() {
            let first = tree.nodes()[idx as usize].first_child;
            for child in first..first + 4 {
                if let Some(child_pos) = order(child) {
                    assert!(child_pos > pos);
                }
            }
        }
    }

    #[test]
    fn skip_pointers_follow_preorder() {
        let points: Vec<(f32, f32, f32)> = (0..64)
            .map(|i| ((i * 37 % 64) as f32, (i * 11 % 64) as f32 * 0.5, 1.0))
            .collect();
        let tree = tree_with(&points);

        let mut expected = Vec::new();
        preorder(&tree, 0, &mut expected);
        assert_eq!(expected.len(), tree.len());

        // Open every internal node, skip past every leaf.
        let mut visited = Vec::new();
        let mut idx = 0;
        loop {
            visited.push(idx);
            let node = tree.nodes()[idx];
            if node.is_leaf() {
                if node.next == 0 {
                    break;
                }
                idx = node.next as usize;
            } else {
                idx = node.first_child as usize;
            }
        }
        assert_eq!(visited, expected);
    }

    #[test]
    fn next_points_past_own_subtree() {
        let tree = tree_with(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (0.0, 1.0, 1.0), (9.0, 9.0, 1.0)]);
        for (idx, node) in tree.nodes().iter().enumerate() {
            let mut subtree = Vec::new();
            preorder(&tree, idx, &mut subtree);
            assert!(!subtree.contains(&(node.next as usize)) || node.next == 0);
        }
        assert_eq!(tree.root().unwrap().next, 0);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let points: Vec<(f32, f32, f32)> = (0..1000)
            .map(|i| ((i % 40) as f32, (i / 40) as f32, 1.0))
            .collect();
        let mut tree = QuadTree::new(1).unwrap();
        let xs: Vec<f32> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f32> = points.iter().map(|p| p.1).collect();
        let ms: Vec<f32> = points.iter().map(|p| p.2).collect();
        tree.build(&xs, &ys, &ms).unwrap();

        assert!(tree.capacity() >= tree.len());
        assert_eq!(tree.total_mass().unwrap(), 1000.0);
    }

    #[test]
    fn nearly_coincident_bodies_terminate() {
        let x = 1.0f32;
        let tree = tree_with(&[(x, 0.0, 1.0), (f32::from_bits(x.to_bits() + 1), 0.0, 1.0)]);
        assert_eq!(tree.total_mass().unwrap(), 2.0);
    }

    #[test]
    fn rebuild_reuses_storage() {
        let mut tree = tree_with(&[(0.0, 0.0, 1.0), (1.0, 1.0, 1.0)]);
        tree.build(&[5.0], &[5.0], &[2.0]).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.subdivided().is_empty());
        assert_eq!(tree.total_mass().unwrap(), 2.0);
    }
}
