//! Point quadtree used as the body-body broad phase
//!
//! Nodes live in a single `Vec` and point at their children by index, so a
//! rebuild is one allocation and no stale buckets survive between frames.
//!
//! Quadrant layout (screen coordinates, y down):
//! ```text
//! +-------+-------+
//! |   0   |   1   |  (north-west, north-east)
//! +-------+-------+
//! |   2   |   3   |  (south-west, south-east)
//! +-------+-------+
//! ```

use glam::DVec2;

use super::body::Body;

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Bounding box of a circle
    pub fn around(center: DVec2, radius: f64) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    /// Smallest rect holding every body center, padded by `pad` on each side
    pub fn enclosing(bodies: &[Body], pad: f64) -> Self {
        let (min, max) = bodies.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), b| (min.min(b.pos), max.max(b.pos)),
        );
        if bodies.is_empty() {
            return Self::new(-pad, -pad, 2.0 * pad, 2.0 * pad);
        }
        Self::new(
            min.x - pad,
            min.y - pad,
            (max.x - min.x) + 2.0 * pad,
            (max.y - min.y) + 2.0 * pad,
        )
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x + other.width < self.x
            || other.x > self.x + self.width
            || other.y + other.height < self.y
            || other.y > self.y + self.height)
    }

    fn quadrant(&self, index: usize) -> Rect {
        let w = self.width / 2.0;
        let h = self.height / 2.0;
        let x = if index & 1 != 0 { self.x + w } else { self.x };
        let y = if index & 2 != 0 { self.y + h } else { self.y };
        Rect::new(x, y, w, h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Rect,
    depth: u32,
    points: Vec<(DVec2, usize)>,
    children: Option<[NodeId; 4]>,
}

impl Node {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            points: Vec::new(),
            children: None,
        }
    }
}

/// Arena-backed point quadtree keyed by body index
#[derive(Debug, Clone)]
pub struct Quadtree {
    nodes: Vec<Node>,
    capacity: usize,
    max_depth: u32,
    len: usize,
}

impl Quadtree {
    pub fn new(bounds: Rect, capacity: usize, max_depth: u32) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0)],
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    /// Fresh tree over every body center
    pub fn build(bodies: &[Body], capacity: usize, max_depth: u32) -> Self {
        let mut tree = Self::new(Rect::enclosing(bodies, 1.0), capacity, max_depth);
        for (i, body) in bodies.iter().enumerate() {
            tree.insert(body.pos, i);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[0].bounds
    }

    /// Insert a point. Returns false only for points outside the root bounds.
    pub fn insert(&mut self, point: DVec2, data: usize) -> bool {
        if !self.nodes[0].bounds.contains(point) {
            return false;
        }
        self.insert_at(NodeId(0), point, data);
        self.len += 1;
        true
    }

    fn insert_at(&mut self, id: NodeId, point: DVec2, data: usize) {
        let node = &self.nodes[id.index()];
        let at_max_depth = node.depth >= self.max_depth;

        if node.children.is_none() && (node.points.len() < self.capacity || at_max_depth) {
            // Room here, or too deep to split: never drop data
            self.nodes[id.index()].points.push((point, data));
            return;
        }

        let children = match self.nodes[id.index()].children {
            Some(children) => children,
            None => self.subdivide(id),
        };

        let target = children
            .iter()
            .copied()
            .find(|c| self.nodes[c.index()].bounds.contains(point));
        match target {
            Some(child) => self.insert_at(child, point, data),
            // Rounding at a split line can leave a sliver no child claims
            None => self.nodes[id.index()].points.push((point, data)),
        }
    }

    fn subdivide(&mut self, id: NodeId) -> [NodeId; 4] {
        let bounds = self.nodes[id.index()].bounds;
        let depth = self.nodes[id.index()].depth + 1;
        let base = self.nodes.len() as u32;
        let children = [NodeId(base), NodeId(base + 1), NodeId(base + 2), NodeId(base + 3)];
        for q in 0..4 {
            self.nodes.push(Node::new(bounds.quadrant(q), depth));
        }
        self.nodes[id.index()].children = Some(children);

        let existing = std::mem::take(&mut self.nodes[id.index()].points);
        for (point, data) in existing {
            self.insert_at(id, point, data);
        }
        children
    }

    /// All entries whose point lies within `radius` of `center` (inclusive)
    pub fn query_radius(&self, center: DVec2, radius: f64) -> Vec<usize> {
        let mut found = Vec::new();
        let range = Rect::around(center, radius);
        let radius_sq = radius * radius;
        let mut stack = vec![NodeId(0)];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if !node.bounds.intersects(&range) {
                continue;
            }
            found.extend(
                node.points
                    .iter()
                    .filter(|(p, _)| p.distance_squared(center) <= radius_sq)
                    .map(|&(_, data)| data),
            );
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        found
    }

    /// All entries whose point lies inside `range`
    pub fn query_range(&self, range: &Rect) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![NodeId(0)];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if !node.bounds.intersects(range) {
                continue;
            }
            found.extend(
                node.points
                    .iter()
                    .filter(|(p, _)| range.contains(*p))
                    .map(|&(_, data)| data),
            );
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        found
    }
}

/// Unordered body pairs whose circles touch, found through the quadtree
///
/// Each pair appears once as (i, j) with i < j, sorted.
pub fn broad_phase_pairs(bodies: &[Body], capacity: usize, max_depth: u32) -> Vec<(usize, usize)> {
    if bodies.len() < 2 {
        return Vec::new();
    }
    let tree = Quadtree::build(bodies, capacity, max_depth);
    let max_radius = bodies.iter().map(|b| b.radius).fold(0.0, f64::max);

    let mut pairs = Vec::new();
    for (i, a) in bodies.iter().enumerate() {
        for j in tree.query_radius(a.pos, a.radius + max_radius) {
            if j <= i {
                continue;
            }
            if touching(a, &bodies[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Reference O(n²) version of `broad_phase_pairs`
pub fn brute_force_pairs(bodies: &[Body]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if touching(&bodies[i], &bodies[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[inline]
fn touching(a: &Body, b: &Body) -> bool {
    let sum = a.radius + b.radius;
    a.pos.distance_squared(b.pos) <= sum * sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body_at(x: f64, y: f64, radius: f64) -> Body {
        Body::new(0, DVec2::new(x, y), DVec2::ZERO, radius, 1.0, 0.0).unwrap()
    }

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(DVec2::new(0.0, 0.0)));
        assert!(!r.contains(DVec2::new(10.0, 5.0)));
        assert!(r.intersects(&Rect::new(9.0, 9.0, 5.0, 5.0)));
        assert!(!r.intersects(&Rect::new(11.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_subdivides_past_capacity() {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2, 8);
        tree.insert(DVec2::new(10.0, 10.0), 0);
        tree.insert(DVec2::new(80.0, 10.0), 1);
        assert_eq!(tree.node_count(), 1);
        tree.insert(DVec2::new(10.0, 80.0), 2);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_max_depth_keeps_everything() {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1, 3);
        for i in 0..20 {
            assert!(tree.insert(DVec2::new(5.0, 5.0), i));
        }
        let mut found = tree.query_radius(DVec2::new(5.0, 5.0), 0.5);
        found.sort_unstable();
        assert_eq!(found, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_points_outside_root() {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 10.0, 10.0), 4, 4);
        assert!(!tree.insert(DVec2::new(20.0, 5.0), 0));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_query_radius_is_exact() {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1, 8);
        tree.insert(DVec2::new(50.0, 50.0), 0);
        tree.insert(DVec2::new(53.0, 54.0), 1); // distance 5
        tree.insert(DVec2::new(57.0, 50.0), 2); // distance 7
        let mut found = tree.query_radius(DVec2::new(50.0, 50.0), 5.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_query_range() {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1, 8);
        tree.insert(DVec2::new(10.0, 10.0), 0);
        tree.insert(DVec2::new(90.0, 90.0), 1);
        assert_eq!(tree.query_range(&Rect::new(0.0, 0.0, 50.0, 50.0)), vec![0]);
    }

    #[test]
    fn test_root_bounds_pad_body_centers() {
        let bodies = vec![body_at(10.0, 20.0, 30.0), body_at(50.0, 80.0, 2.0)];
        let tree = Quadtree::build(&bodies, 4, 10);
        assert_eq!(tree.bounds(), Rect::new(9.0, 19.0, 42.0, 62.0));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_broad_phase_small_scene() {
        let bodies = vec![
            body_at(0.0, 0.0, 10.0),
            body_at(15.0, 0.0, 10.0),
            body_at(100.0, 100.0, 5.0),
            body_at(300.0, 0.0, 40.0),
            body_at(345.0, 0.0, 6.0),
        ];
        assert_eq!(broad_phase_pairs(&bodies, 4, 10), vec![(0, 1), (3, 4)]);
        assert_eq!(brute_force_pairs(&bodies), vec![(0, 1), (3, 4)]);
    }

    proptest! {
        #[test]
        fn prop_broad_phase_matches_brute_force(
            specs in prop::collection::vec((-400.0f64..400.0, -400.0f64..400.0, 1.0f64..40.0), 0..60),
            capacity in 1usize..6,
            max_depth in 1u32..10,
        ) {
            let bodies: Vec<Body> = specs.iter().map(|&(x, y, r)| body_at(x, y, r)).collect();
            prop_assert_eq!(
                broad_phase_pairs(&bodies, capacity, max_depth),
                brute_force_pairs(&bodies)
            );
        }
    }
}
