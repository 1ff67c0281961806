//! Barnes-Hut quadtree
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. A tree is
//! built from scratch every tick the population is large enough and is never
//! mutated once force computation starts.
//!
//! Quadrant layout (screen coordinates, y grows downward):
//! ```text
//! +----+----+
//! | NW | NE |   0 | 1
//! +----+----+
//! | SW | SE |   2 | 3
//! +----+----+
//! ```

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use crate::consts::MAX_TREE_DEPTH;

/// Axis-aligned rectangle, half-open: `[x, x + w) × [y, y + h)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Boundary {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Which quadrant of this rectangle a point falls in
    #[inline]
    pub fn quadrant(&self, point: DVec2) -> usize {
        let center = self.center();
        let east = (point.x >= center.x) as usize;
        let south = (point.y >= center.y) as usize;
        south * 2 + east
    }

    /// The four equal quadrants, in `quadrant()` order
    pub fn split(&self) -> [Boundary; 4] {
        let w = self.w * 0.5;
        let h = self.h * 0.5;
        [
            Boundary::new(self.x, self.y, w, h),
            Boundary::new(self.x + w, self.y, w, h),
            Boundary::new(self.x, self.y + h, w, h),
            Boundary::new(self.x + w, self.y + h, w, h),
        ]
    }
}

/// Handle into the node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A body as the tree sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEntry {
    /// Index into the body slice the tree was built from
    pub index: usize,
    pub position: DVec2,
    pub mass: f64,
}

impl QuadEntry {
    pub fn from_body(index: usize, body: &Body) -> Self {
        Self {
            index,
            position: body.position,
            mass: body.mass,
        }
    }
}

/// A quadtree node
///
/// Undivided nodes hold at most `capacity` entries (more only at the depth
/// limit). Divided nodes hold none; their entries live in the subtree.
#[derive(Debug, Clone)]
pub struct QuadNode {
    pub boundary: Boundary,
    pub entries: Vec<QuadEntry>,
    /// Mass of every entry in the subtree
    pub total_mass: f64,
    /// Mass-weighted mean position of the subtree
    pub center_of_mass: DVec2,
    pub children: Option<[NodeId; 4]>,
    pub depth: u32,
}

impl QuadNode {
    fn new(boundary: Boundary, depth: u32) -> Self {
        Self {
            boundary,
            entries: Vec::new(),
            total_mass: 0.0,
            center_of_mass: DVec2::ZERO,
            children: None,
            depth,
        }
    }

    #[inline]
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    fn accumulate(&mut self, entry: &QuadEntry) {
        let total = self.total_mass + entry.mass;
        self.center_of_mass =
            (self.center_of_mass * self.total_mass + entry.position * entry.mass) / total;
        self.total_mass = total;
    }
}

/// Debug overlay view of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadNodeInfo {
    pub boundary: Boundary,
    pub center_of_mass: DVec2,
    pub total_mass: f64,
    pub depth: u32,
    pub divided: bool,
}

/// Barnes-Hut quadtree over one tick's bodies
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    capacity: usize,
    /// Bodies that fell outside the root boundary
    outliers: Vec<usize>,
}

impl QuadTree {
    /// Empty tree covering `boundary`
    pub fn new(boundary: Boundary, capacity: usize) -> Self {
        Self {
            nodes: vec![QuadNode::new(boundary, 0)],
            capacity: capacity.max(1),
            outliers: Vec::new(),
        }
    }

    /// Build a tree from the current body set
    pub fn build(bodies: &[Body], boundary: Boundary, capacity: usize) -> Self {
        let mut tree = Self::new(boundary, capacity);
        for (index, body) in bodies.iter().enumerate() {
            tree.insert(QuadEntry::from_body(index, body));
        }
        tree
    }

    /// Insert one entry; returns false if it lies outside the root boundary
    pub fn insert(&mut self, entry: QuadEntry) -> bool {
        if !self.nodes[NodeId::ROOT.index()].boundary.contains(entry.position) {
            self.outliers.push(entry.index);
            return false;
        }
        self.insert_from(NodeId::ROOT, entry);
        true
    }

    fn insert_from(&mut self, start: NodeId, entry: QuadEntry) {
        let mut current = start;
        loop {
            let node = &mut self.nodes[current.index()];
            node.accumulate(&entry);

            let children = match node.children {
                Some(children) => children,
                None => {
                    if node.entries.len() < self.capacity || node.depth >= MAX_TREE_DEPTH {
                        node.entries.push(entry);
                        return;
                    }
                    self.subdivide(current)
                }
            };

            let quadrant = self.nodes[current.index()].boundary.quadrant(entry.position);
            current = children[quadrant];
        }
    }

    /// Split a full leaf and push its entries down one level
    fn subdivide(&mut self, id: NodeId) -> [NodeId; 4] {
        let (boundary, depth) = {
            let node = &self.nodes[id.index()];
            (node.boundary, node.depth)
        };

        let first = self.nodes.len() as u32;
        let children = [
            NodeId(first),
            NodeId(first + 1),
            NodeId(first + 2),
            NodeId(first + 3),
        ];
        for quadrant in boundary.split() {
            self.nodes.push(QuadNode::new(quadrant, depth + 1));
        }

        let node = &mut self.nodes[id.index()];
        node.children = Some(children);
        let entries = std::mem::take(&mut node.entries);

        // Entries are already counted in this node's aggregate
        for entry in entries {
            let quadrant = boundary.quadrant(entry.position);
            self.insert_from(children[quadrant], entry);
        }
        children
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&QuadNode> {
        self.nodes.get(id.index())
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[QuadNode] {
        &self.nodes
    }

    pub fn outliers(&self) -> &[usize] {
        &self.outliers
    }

    pub fn boundary(&self) -> Boundary {
        self.nodes[NodeId::ROOT.index()].boundary
    }

    pub fn total_mass(&self) -> f64 {
        self.nodes[NodeId::ROOT.index()].total_mass
    }

    pub fn center_of_mass(&self) -> DVec2 {
        self.nodes[NodeId::ROOT.index()].center_of_mass
    }

    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Non-empty nodes, root first
    pub fn snapshot(&self) -> Vec<QuadNodeInfo> {
        self.nodes
            .iter()
            .filter(|n| n.total_mass > 0.0)
            .map(|n| QuadNodeInfo {
                boundary: n.boundary,
                center_of_mass: n.center_of_mass,
                total_mass: n.total_mass,
                depth: n.depth,
                divided: n.is_divided(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, x: f64, y: f64, mass: f64) -> QuadEntry {
        QuadEntry {
            index,
            position: DVec2::new(x, y),
            mass,
        }
    }

    fn leaf_entries(tree: &QuadTree) -> Vec<usize> {
        let mut indices: Vec<usize> = tree
            .nodes()
            .iter()
            .filter(|n| !n.is_divided())
            .flat_map(|n| n.entries.iter().map(|e| e.index))
            .collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn test_boundary_quadrants() {
        let b = Boundary::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(b.quadrant(DVec2::new(10.0, 10.0)), 0);
        assert_eq!(b.quadrant(DVec2::new(60.0, 10.0)), 1);
        assert_eq!(b.quadrant(DVec2::new(10.0, 60.0)), 2);
        assert_eq!(b.quadrant(DVec2::new(50.0, 50.0)), 3);

        let quads = b.split();
        for (i, q) in quads.iter().enumerate() {
            assert!(q.contains(q.center()));
            assert_eq!(b.quadrant(q.center()), i);
        }
        assert!(!b.contains(DVec2::new(100.0, 50.0)));
    }

    #[test]
    fn test_leaf_stays_undivided_under_capacity() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 4);
        for i in 0..4 {
            assert!(tree.insert(entry(i, 10.0 + i as f64, 10.0, 1.0)));
        }
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.nodes()[0].entries.len(), 4);
    }

    #[test]
    fn test_overflow_subdivides_and_redistributes() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 4);
        let points = [(10.0, 10.0), (90.0, 10.0), (10.0, 90.0), (90.0, 90.0), (20.0, 20.0)];
        for (i, (x, y)) in points.iter().enumerate() {
            tree.insert(entry(i, *x, *y, 1.0));
        }
        let root = &tree.nodes()[0];
        assert!(root.is_divided());
        assert!(root.entries.is_empty());
        assert_eq!(leaf_entries(&tree), vec![0, 1, 2, 3, 4]);
        assert_eq!(tree.total_mass(), 5.0);
    }

    #[test]
    fn test_center_of_mass_is_mass_weighted() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(entry(0, 10.0, 10.0, 3.0));
        tree.insert(entry(1, 90.0, 10.0, 1.0));
        let com = tree.center_of_mass();
        assert!((com.x - 30.0).abs() < 1e-12);
        assert!((com.y - 10.0).abs() < 1e-12);

        // Every divided node aggregates exactly its subtree
        for node in tree.nodes() {
            if let Some(children) = node.children {
                let mass: f64 = children
                    .iter()
                    .map(|c| tree.node(*c).unwrap().total_mass)
                    .sum();
                assert!((mass - node.total_mass).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_outside_root_is_recorded_as_outlier() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 4);
        assert!(!tree.insert(entry(7, -5.0, 50.0, 10.0)));
        assert!(!tree.insert(entry(8, 100.0, 50.0, 10.0)));
        assert_eq!(tree.outliers(), &[7, 8]);
        assert_eq!(tree.total_mass(), 0.0);
    }

    #[test]
    fn test_coincident_bodies_stop_at_depth_limit() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 1);
        for i in 0..10 {
            tree.insert(entry(i, 25.0, 25.0, 1.0));
        }
        assert_eq!(tree.depth(), MAX_TREE_DEPTH);
        assert_eq!(leaf_entries(&tree).len(), 10);
        assert_eq!(tree.total_mass(), 10.0);
    }

    #[test]
    fn test_snapshot_skips_empty_quadrants() {
        let mut tree = QuadTree::new(Boundary::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(entry(0, 10.0, 10.0, 2.0));
        tree.insert(entry(1, 90.0, 90.0, 2.0));
        let nodes = tree.snapshot();
        // root + NW + SE
        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].divided);
        assert_eq!(nodes[0].total_mass, 4.0);
        assert!(nodes[1..].iter().all(|n| n.depth == 1 && !n.divided));
    }
}
