//! Binary-tree rectangle allocator.
//!
//! Every node covers a rectangle of the atlas. An empty node is a free slot;
//! an occupied node holds one item and owns exactly two children that tile
//! the space left over after the item's (margin-padded) rectangle was cut
//! from the node's top-left corner. The tree only grows: nodes are never
//! freed, merged or rebalanced.
//!
//! Nodes live in an arena and reference their children by index. Descent and
//! traversal run on explicit stacks, so tree depth is limited by heap memory
//! rather than the native call stack.

use super::diagonal;
use crate::model::Rect;

/// Index of a node in the tree arena.
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Free slot, no children.
    Empty,
    /// Holds `item` and the two leftover children `[first, second]`.
    Occupied { item: usize, children: [NodeId; 2] },
}

#[derive(Debug, Clone)]
pub struct PackNode {
    rect: Rect,
    state: NodeState,
}

impl PackNode {
    fn empty(rect: Rect) -> Self {
        Self {
            rect,
            state: NodeState::Empty,
        }
    }

    /// Node rectangle in atlas space. For occupied nodes this is the item
    /// size plus the margin on every side.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, NodeState::Empty)
    }

    pub fn occupant(&self) -> Option<usize> {
        match self.state {
            NodeState::Empty => None,
            NodeState::Occupied { item, .. } => Some(item),
        }
    }

    pub fn children(&self) -> Option<[NodeId; 2]> {
        match self.state {
            NodeState::Empty => None,
            NodeState::Occupied { children, .. } => Some(children),
        }
    }
}

/// One occupied node as seen by a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub node: NodeId,
    /// Caller-defined item index given to [`PackTree::try_place`].
    pub item: usize,
    /// Node rectangle, margin included.
    pub slot: Rect,
    /// Item rectangle, margin stripped.
    pub frame: Rect,
}

pub struct PackTree {
    nodes: Vec<PackNode>,
    margin: u32,
    placed: usize,
    // Reused between insertions to avoid reallocating the descent stack.
    unvisited: Vec<NodeId>,
}

impl PackTree {
    /// Creates a tree whose empty root spans `(0, 0, width, height)`.
    ///
    /// `margin` is fixed for the lifetime of the tree.
    pub fn new(width: u32, height: u32, margin: u32) -> Self {
        Self {
            nodes: vec![PackNode::empty(Rect::new(0, 0, width, height))],
            margin,
            placed: 0,
            unvisited: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&PackNode> {
        self.nodes.get(id)
    }

    /// Total number of nodes in the arena, empty ones included. Never zero.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn placed_count(&self) -> usize {
        self.placed
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Size an item of `w x h` occupies once the margin is added on both
    /// sides. `None` if that size overflows.
    fn padded(&self, w: u32, h: u32) -> Option<(u32, u32)> {
        let total = self.margin.checked_mul(2)?;
        Some((w.checked_add(total)?, h.checked_add(total)?))
    }

    /// Tries to place an item of `w x h` starting at the root.
    ///
    /// Returns the occupied node on success. On failure the tree is left
    /// exactly as it was.
    pub fn try_place(&mut self, item: usize, w: u32, h: u32) -> Option<NodeId> {
        let (need_w, need_h) = self.padded(w, h)?;

        self.unvisited.clear();
        self.unvisited.push(ROOT);

        while let Some(id) = self.unvisited.pop() {
            let node = &self.nodes[id];
            match node.state {
                NodeState::Empty => {
                    if need_w <= node.rect.w && need_h <= node.rect.h {
                        self.occupy(id, item, need_w, need_h);
                        return Some(id);
                    }
                }
                NodeState::Occupied {
                    children: [first, second],
                    ..
                } => {
                    let (preferred, fallback) = self.child_order(first, second, w, h);
                    // Pushed last, explored first: the whole preferred subtree
                    // is searched before the fallback one.
                    self.unvisited.push(fallback);
                    self.unvisited.push(preferred);
                }
            }
        }

        None
    }

    /// Orders the children of an occupied node by how closely their free
    /// rectangle matches the item. The first child wins only with a strictly
    /// lower score.
    fn child_order(&self, first: NodeId, second: NodeId, w: u32, h: u32) -> (NodeId, NodeId) {
        let score = |id: NodeId| {
            let r = self.nodes[id].rect;
            diagonal(h as i64 - r.h as i64, w as i64 - r.w as i64)
        };
        if score(first) < score(second) {
            (first, second)
        } else {
            (second, first)
        }
    }

    fn occupy(&mut self, id: NodeId, item: usize, w: u32, h: u32) {
        let old = self.nodes[id].rect;
        let placed = Rect::new(old.x, old.y, w, h);
        let (first, second) = split_remainder(&old, &placed);

        let first_id = self.nodes.len();
        self.nodes.push(PackNode::empty(first));
        let second_id = self.nodes.len();
        self.nodes.push(PackNode::empty(second));

        let node = &mut self.nodes[id];
        node.rect = placed;
        node.state = NodeState::Occupied {
            item,
            children: [first_id, second_id],
        };
        self.placed += 1;
    }

    /// Strips the margin from an occupied node's rectangle.
    pub fn content_rect(&self, slot: &Rect) -> Rect {
        let m = self.margin;
        let total = m.saturating_mul(2);
        Rect::new(
            slot.x.saturating_add(m),
            slot.y.saturating_add(m),
            slot.w.saturating_sub(total),
            slot.h.saturating_sub(total),
        )
    }

    /// Pre-order walk over occupied nodes: a node, then its first subtree,
    /// then its second. Empty nodes end their branch.
    pub fn occupied_preorder(&self) -> OccupiedPreorder<'_> {
        OccupiedPreorder {
            tree: self,
            stack: vec![ROOT],
        }
    }
}

/// Splits the L-shaped leftover of `old` after `placed` was cut from its
/// top-left corner into two rectangles that exactly tile it.
///
/// A tall `placed` gets a right strip of its own height and a bottom strip of
/// the full original width; otherwise a bottom strip of its own width and a
/// right strip of the full original height.
pub fn split_remainder(old: &Rect, placed: &Rect) -> (Rect, Rect) {
    let right_w = old.w - placed.w;
    let bottom_h = old.h - placed.h;
    if placed.h > placed.w {
        (
            Rect::new(placed.x + placed.w, placed.y, right_w, placed.h),
            Rect::new(old.x, placed.y + placed.h, old.w, bottom_h),
        )
    } else {
        (
            Rect::new(placed.x, placed.y + placed.h, placed.w, bottom_h),
            Rect::new(placed.x + placed.w, placed.y, right_w, old.h),
        )
    }
}

pub struct OccupiedPreorder<'a> {
    tree: &'a PackTree,
    stack: Vec<NodeId>,
}

impl Iterator for OccupiedPreorder<'_> {
    type Item = Placement;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id];
            if let NodeState::Occupied {
                item,
                children: [first, second],
            } = node.state
            {
                self.stack.push(second);
                self.stack.push(first);
                return Some(Placement {
                    node: id,
                    item,
                    slot: node.rect,
                    frame: self.tree.content_rect(&node.rect),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_fills_root() {
        let mut t = PackTree::new(64, 64, 0);
        assert_eq!(t.try_place(0, 64, 64), Some(0));
        let root = t.node(t.root()).unwrap();
        assert_eq!(root.rect(), Rect::new(0, 0, 64, 64));
        let [a, b] = root.children().unwrap();
        assert_eq!(t.node(a).unwrap().rect(), Rect::new(0, 64, 64, 0));
        assert_eq!(t.node(b).unwrap().rect(), Rect::new(64, 0, 0, 64));
    }

    #[test]
    fn too_large_leaves_tree_untouched() {
        let mut t = PackTree::new(63, 63, 0);
        assert_eq!(t.try_place(0, 64, 64), None);
        assert_eq!(t.node_count(), 1);
        assert!(t.node(t.root()).unwrap().is_empty());
        assert_eq!(t.placed_count(), 0);
    }

    #[test]
    fn margin_counts_on_both_sides() {
        let mut t = PackTree::new(100, 100, 5);
        assert_eq!(t.try_place(0, 91, 91), None);
        assert_eq!(t.try_place(0, 91, 90), None);
        assert!(t.try_place(0, 90, 90).is_some());
        let p = t.occupied_preorder().next().unwrap();
        assert_eq!(p.slot, Rect::new(0, 0, 100, 100));
        assert_eq!(p.frame, Rect::new(5, 5, 90, 90));
    }

    #[test]
    fn wide_split_bottom_then_full_height_right() {
        let old = Rect::new(10, 20, 100, 80);
        let placed = Rect::new(10, 20, 40, 30);
        let (first, second) = split_remainder(&old, &placed);
        assert_eq!(first, Rect::new(10, 50, 40, 50));
        assert_eq!(second, Rect::new(50, 20, 60, 80));
    }

    #[test]
    fn tall_split_right_then_full_width_bottom() {
        let old = Rect::new(10, 20, 100, 80);
        let placed = Rect::new(10, 20, 30, 40);
        let (first, second) = split_remainder(&old, &placed);
        assert_eq!(first, Rect::new(40, 20, 70, 40));
        assert_eq!(second, Rect::new(10, 60, 100, 40));
    }

    #[test]
    fn square_split_uses_wide_rule() {
        let old = Rect::new(0, 0, 10, 10);
        let placed = Rect::new(0, 0, 4, 4);
        let (first, _) = split_remainder(&old, &placed);
        assert_eq!(first, Rect::new(0, 4, 4, 6));
    }

    #[test]
    fn split_children_tile_the_leftover() {
        let old = Rect::new(0, 0, 37, 23);
        for (w, h) in [(5, 9), (9, 5), (37, 1), (1, 23), (7, 7)] {
            let placed = Rect::new(0, 0, w, h);
            let (a, b) = split_remainder(&old, &placed);
            assert_eq!(placed.area() + a.area() + b.area(), old.area());
            assert!(!a.intersects(&b));
            assert!(!a.intersects(&placed));
            assert!(!b.intersects(&placed));
        }
    }

    #[test]
    fn prefers_closest_shaped_child() {
        // Wide first item: children are bottom (40x70) and right (60x100).
        let mut t = PackTree::new(100, 100, 0);
        t.try_place(0, 40, 30).unwrap();
        let [bottom, right] = t.node(0).unwrap().children().unwrap();
        // 40x70 matches the bottom child exactly.
        assert_eq!(t.try_place(1, 40, 70), Some(bottom));
        assert!(t.node(right).unwrap().is_empty());
        // 60x100 matches the right child exactly.
        assert_eq!(t.try_place(2, 60, 100), Some(right));
    }

    #[test]
    fn falls_back_to_other_child() {
        let mut t = PackTree::new(100, 100, 0);
        t.try_place(0, 40, 30).unwrap();
        let [bottom, right] = t.node(0).unwrap().children().unwrap();
        // Scores closer to the bottom child (40x70) but only fits the right one.
        let placed = t.try_place(1, 45, 60).unwrap();
        assert_eq!(placed, right);
        assert!(t.node(bottom).unwrap().is_empty());
    }

    #[test]
    fn equal_scores_try_second_child_first() {
        // Occupy 50x50 of a 100x100: children bottom 50x50 and right 50x100.
        let mut t = PackTree::new(100, 100, 0);
        t.try_place(0, 50, 50).unwrap();
        let [bottom, right] = t.node(0).unwrap().children().unwrap();
        // 50x75: distance 25 to both children.
        assert_eq!(t.try_place(1, 50, 75), Some(right));
        assert!(t.node(bottom).unwrap().is_empty());
    }

    #[test]
    fn failure_leaves_every_node_unchanged() {
        let mut t = PackTree::new(100, 100, 2);
        t.try_place(0, 30, 30).unwrap();
        t.try_place(1, 20, 40).unwrap();
        let snapshot = |t: &PackTree| -> Vec<(Rect, NodeState)> {
            (0..t.node_count())
                .map(|i| {
                    let n = t.node(i).unwrap();
                    (n.rect(), n.state())
                })
                .collect()
        };
        let before = snapshot(&t);
        assert_eq!(t.try_place(2, 99, 99), None);
        assert_eq!(before, snapshot(&t));
    }

    #[test]
    fn preorder_visits_node_then_first_then_second() {
        let mut t = PackTree::new(100, 100, 0);
        t.try_place(0, 40, 30).unwrap();
        t.try_place(1, 60, 100).unwrap(); // right child
        t.try_place(2, 40, 70).unwrap(); // bottom child
        let items: Vec<usize> = t.occupied_preorder().map(|p| p.item).collect();
        assert_eq!(items, vec![0, 2, 1]);
    }

    #[test]
    fn overflowing_margin_never_fits() {
        let mut t = PackTree::new(u32::MAX, u32::MAX, u32::MAX / 2 + 1);
        assert_eq!(t.try_place(0, 1, 1), None);
        let mut t = PackTree::new(u32::MAX, u32::MAX, 1);
        assert_eq!(t.try_place(0, u32::MAX, 1), None);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        // Each 1x1 item nests one level deeper than the previous one.
        let n = 5_000u32;
        let mut t = PackTree::new(n, 1, 0);
        for i in 0..n {
            assert!(t.try_place(i as usize, 1, 1).is_some(), "item {i}");
        }
        assert_eq!(t.try_place(n as usize, 1, 1), None);
        assert_eq!(t.occupied_preorder().count(), n as usize);
        let xs: Vec<u32> = t.occupied_preorder().map(|p| p.frame.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn content_rect_saturates_huge_margin() {
        let t = PackTree::new(10, 10, u32::MAX);
        let r = t.content_rect(&Rect::new(0, 0, 10, 10));
        assert_eq!(r, Rect::new(u32::MAX, u32::MAX, 0, 0));
    }
}
