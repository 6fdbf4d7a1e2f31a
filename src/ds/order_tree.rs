//! Arena-backed AVL tree addressed by position.
//!
//! Shared engine under [`SparseIndex`](crate::ds::SparseIndex) and
//! [`RecencyOrder`](crate::ds::RecencyOrder). Nodes are ordered purely by
//! position; each node covers `span` consecutive positions and either holds a
//! payload (`span == 1`) or stands for a run of empty positions.
//!
//! ## Architecture
//!
//! ```text
//!   nodes: SlotArena<Node<P>>          links are SlotIds, never pointers
//!
//!                 ┌───────────────────────┐
//!                 │ id_4  Filled(x)       │  size 7, empties 5
//!                 │ span 1, height 3      │
//!                 └─────┬───────────┬─────┘
//!                       │           │
//!        ┌──────────────▼───┐   ┌───▼──────────────┐
//!        │ id_1  Empty      │   │ id_9  Filled(y)  │  size 4, empties 3
//!        │ span 2, size 2   │   │ span 1           │
//!        └──────────────────┘   └────────┬─────────┘
//!                                        │ right
//!                               ┌────────▼─────────┐
//!                               │ id_2  Empty      │
//!                               │ span 3           │
//!                               └──────────────────┘
//!
//!   positions:  0 1 | 2 | 3 | 4 5 6
//!               _ _   x   y   _ _ _
//! ```
//!
//! Every node caches `size` (sum of spans in its subtree) and `empties`
//! (positions in its subtree that hold no payload), so locating a position,
//! computing a node's position from its id, and the order-statistic queries
//! all run in O(log n) where n is the number of nodes, not positions.
//!
//! Rotations touch O(1) nodes and run only when an insert or removal leaves a
//! node with a height difference of two.

use rustc_hash::FxHashSet;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

/// Stable handle to a tree node. Survives rotations and positional shifts.
pub type NodeId = SlotId;

#[derive(Debug, Clone)]
struct Node<P> {
    parent: Option<SlotId>,
    left: Option<SlotId>,
    right: Option<SlotId>,
    height: i32,
    span: usize,
    size: usize,
    empties: usize,
    payload: Option<P>,
}

#[derive(Debug, Clone)]
pub(crate) struct OrderTree<P> {
    nodes: SlotArena<Node<P>>,
    root: Option<SlotId>,
}

impl<P> OrderTree<P> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotArena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: SlotArena::with_capacity(nodes),
            root: None,
        }
    }

    /// Total positions covered.
    pub(crate) fn len(&self) -> usize {
        self.size(self.root)
    }

    pub(crate) fn empties(&self) -> usize {
        self.root.map_or(0, |root| self.nodes[root].empties)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.nodes.approx_bytes()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub(crate) fn span(&self, id: NodeId) -> usize {
        self.nodes[id].span
    }

    pub(crate) fn is_run(&self, id: NodeId) -> bool {
        self.nodes[id].payload.is_none()
    }

    pub(crate) fn payload(&self, id: NodeId) -> Option<&P> {
        self.nodes.get(id).and_then(|node| node.payload.as_ref())
    }

    pub(crate) fn payload_mut(&mut self, id: NodeId) -> Option<&mut P> {
        self.nodes.get_mut(id).and_then(|node| node.payload.as_mut())
    }

    /// Swaps the payload of a single-position node, fixing empty counts on
    /// the path to the root.
    pub(crate) fn set_payload(&mut self, id: NodeId, payload: Option<P>) -> Option<P> {
        let node = &mut self.nodes[id];
        assert_eq!(node.span, 1, "payload swap on a multi-position run");
        let previous = std::mem::replace(&mut node.payload, payload);
        self.refresh_upward(Some(id));
        previous
    }

    /// Resizes an empty run in place. Structure is unchanged.
    pub(crate) fn set_run_span(&mut self, id: NodeId, span: usize) {
        let node = &mut self.nodes[id];
        assert!(node.payload.is_none(), "span change on a filled node");
        assert!(span > 0, "empty run must cover at least one position");
        node.span = span;
        self.refresh_upward(Some(id));
    }

    /// Finds the node covering `position` and the offset inside it.
    pub(crate) fn locate(&self, mut position: usize) -> Option<(NodeId, usize)> {
        if position >= self.len() {
            return None;
        }
        let mut current = self.root?;
        loop {
            let node = &self.nodes[current];
            let left_size = self.size(node.left);
            if position < left_size {
                current = node.left?;
            } else if position < left_size + node.span {
                return Some((current, position - left_size));
            } else {
                position -= left_size + node.span;
                current = node.right?;
            }
        }
    }

    /// First position covered by `id`.
    pub(crate) fn position_of(&self, id: NodeId) -> usize {
        let mut position = self.size(self.nodes[id].left);
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            let parent_node = &self.nodes[parent];
            if parent_node.right == Some(current) {
                position += self.size(parent_node.left) + parent_node.span;
            }
            current = parent;
        }
        position
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        let mut current = self.root?;
        while let Some(right) = self.nodes[current].right {
            current = right;
        }
        Some(current)
    }

    /// In-order successor.
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order predecessor.
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        if let Some(mut current) = self.nodes[id].left {
            while let Some(right) = self.nodes[current].right {
                current = right;
            }
            return Some(current);
        }
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Links a new node so that it starts at `position`.
    ///
    /// `position` must fall on a node boundary (or equal `len()`); callers
    /// split runs first when it does not.
    pub(crate) fn insert_at(
        &mut self,
        mut position: usize,
        span: usize,
        payload: Option<P>,
    ) -> NodeId {
        assert!(
            position <= self.len(),
            "insert position {} beyond length {}",
            position,
            self.len()
        );
        debug_assert!(span > 0);
        debug_assert!(payload.is_none() || span == 1);

        let empties = if payload.is_none() { span } else { 0 };
        let id = self.nodes.insert(Node {
            parent: None,
            left: None,
            right: None,
            height: 1,
            span,
            size: span,
            empties,
            payload,
        });

        let Some(mut current) = self.root else {
            self.root = Some(id);
            return id;
        };

        loop {
            let left_size = self.size(self.nodes[current].left);
            if position <= left_size {
                match self.nodes[current].left {
                    Some(left) => current = left,
                    None => {
                        self.nodes[current].left = Some(id);
                        break;
                    },
                }
            } else {
                let skip = left_size + self.nodes[current].span;
                debug_assert!(position >= skip, "insert inside a run");
                position -= skip;
                match self.nodes[current].right {
                    Some(right) => current = right,
                    None => {
                        self.nodes[current].right = Some(id);
                        break;
                    },
                }
            }
        }

        self.nodes[id].parent = Some(current);
        self.rebalance_upward(Some(current));
        id
    }

    /// Unlinks `id` and returns its span and payload.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> (usize, Option<P>) {
        let (left, right, parent) = {
            let node = &self.nodes[id];
            (node.left, node.right, node.parent)
        };

        let fix_from = match (left, right) {
            (None, _) => {
                self.transplant(id, right);
                parent
            },
            (_, None) => {
                self.transplant(id, left);
                parent
            },
            (Some(left), Some(right)) => {
                let successor = self.leftmost(right);
                let fix_from = if self.nodes[successor].parent != Some(id) {
                    let fix_from = self.nodes[successor].parent;
                    let successor_right = self.nodes[successor].right;
                    self.transplant(successor, successor_right);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                    fix_from
                } else {
                    Some(successor)
                };
                self.transplant(id, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                fix_from
            },
        };

        let node = match self.nodes.remove(id) {
            Some(node) => node,
            None => panic!("order tree: node {} vanished during removal", id.index()),
        };
        self.rebalance_upward(fix_from);
        (node.span, node.payload)
    }

    /// Walks the whole tree checking links, aggregates and balance.
    pub(crate) fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut seen = FxHashSet::default();
        if let Some(root) = self.root {
            if self.nodes[root].parent.is_some() {
                return Err(InvariantError::new("root has a parent link"));
            }
            self.check_subtree(root, &mut seen)?;
        }
        if seen.len() != self.nodes.len() {
            return Err(InvariantError::new(format!(
                "{} nodes reachable but {} allocated",
                seen.len(),
                self.nodes.len()
            )));
        }
        Ok(())
    }

    fn check_subtree(
        &self,
        id: NodeId,
        seen: &mut FxHashSet<NodeId>,
    ) -> Result<(i32, usize, usize), InvariantError> {
        if !seen.insert(id) {
            return Err(InvariantError::new(format!("node {} reached twice", id.index())));
        }
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| InvariantError::new(format!("dangling node id {}", id.index())))?;
        if node.span == 0 {
            return Err(InvariantError::new("node with zero span"));
        }
        if node.payload.is_some() && node.span != 1 {
            return Err(InvariantError::new("filled node spans more than one position"));
        }

        let mut height = 0;
        let mut size = node.span;
        let mut empties = if node.payload.is_none() { node.span } else { 0 };
        let mut child_heights = [0i32; 2];
        for (slot, child) in [node.left, node.right].into_iter().enumerate() {
            if let Some(child) = child {
                if self.nodes.get(child).and_then(|c| c.parent) != Some(id) {
                    return Err(InvariantError::new(format!(
                        "child {} does not point back to parent {}",
                        child.index(),
                        id.index()
                    )));
                }
                let (h, s, e) = self.check_subtree(child, seen)?;
                child_heights[slot] = h;
                height = height.max(h);
                size += s;
                empties += e;
            }
        }
        height += 1;

        if (child_heights[0] - child_heights[1]).abs() > 1 {
            return Err(InvariantError::new(format!("node {} out of balance", id.index())));
        }
        if node.height != height || node.size != size || node.empties != empties {
            return Err(InvariantError::new(format!(
                "node {} caches (h={}, size={}, empties={}) \
                 but subtree has (h={}, size={}, empties={})",
                id.index(),
                node.height,
                node.size,
                node.empties,
                height,
                size,
                empties
            )));
        }
        Ok((height, size, empties))
    }

    fn size(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self.nodes[id].size)
    }

    fn height(&self, id: Option<NodeId>) -> i32 {
        id.map_or(0, |id| self.nodes[id].height)
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn refresh(&mut self, id: NodeId) {
        let (left, right) = (self.nodes[id].left, self.nodes[id].right);
        let height = self.height(left).max(self.height(right)) + 1;
        let mut size = self.size(left) + self.size(right);
        let mut empties = left.map_or(0, |l| self.nodes[l].empties)
            + right.map_or(0, |r| self.nodes[r].empties);
        let node = &mut self.nodes[id];
        size += node.span;
        if node.payload.is_none() {
            empties += node.span;
        }
        node.height = height;
        node.size = size;
        node.empties = empties;
    }

    fn refresh_upward(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.refresh(id);
            current = self.nodes[id].parent;
        }
    }

    fn rebalance_upward(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            let top = self.rebalance(id);
            current = self.nodes[top].parent;
        }
    }

    fn balance(&self, id: NodeId) -> i32 {
        let node = &self.nodes[id];
        self.height(node.left) - self.height(node.right)
    }

    /// Restores the AVL condition at `id`; returns the new subtree root.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.refresh(id);
        let balance = self.balance(id);
        if balance > 1 {
            let Some(left) = self.nodes[id].left else {
                unreachable!("left-heavy node without a left child")
            };
            if self.balance(left) < 0 {
                self.rotate_left(left);
            }
            return self.rotate_right(id);
        }
        if balance < -1 {
            let Some(right) = self.nodes[id].right else {
                unreachable!("right-heavy node without a right child")
            };
            if self.balance(right) > 0 {
                self.rotate_right(right);
            }
            return self.rotate_left(id);
        }
        id
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.nodes[x].right else {
            unreachable!("rotate_left without a right child")
        };
        let inner = self.nodes[y].left;
        let parent = self.nodes[x].parent;

        self.nodes[x].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));

        self.refresh(x);
        self.refresh(y);
        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.nodes[x].left else {
            unreachable!("rotate_right without a left child")
        };
        let inner = self.nodes[y].right;
        let parent = self.nodes[x].parent;

        self.nodes[x].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));

        self.refresh(x);
        self.refresh(y);
        y
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = &mut self.nodes[parent];
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    debug_assert_eq!(node.right, Some(old));
                    node.right = new;
                }
            },
        }
    }

    /// Puts `with` where `id` hangs. `id`'s own links are left stale.
    fn transplant(&mut self, id: NodeId, with: Option<NodeId>) {
        let parent = self.nodes[id].parent;
        self.replace_child(parent, id, with);
        if let Some(with) = with {
            self.nodes[with].parent = parent;
        }
    }
}

impl<P> Default for OrderTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(tree: &OrderTree<u32>) -> Vec<(usize, Option<u32>)> {
        let mut out = Vec::new();
        let mut current = tree.first();
        while let Some(id) = current {
            out.push((tree.span(id), tree.payload(id).copied()));
            current = tree.next(id);
        }
        out
    }

    #[test]
    fn appends_stay_balanced() {
        let mut tree = OrderTree::new();
        for i in 0..1000u32 {
            let len = tree.len();
            tree.insert_at(len, 1, Some(i));
        }
        tree.check_invariants().unwrap();
        assert_eq!(tree.len(), 1000);
        // AVL height bound: 1.44 * log2(1001) < 15
        assert!(tree.height(tree.root) <= 15);
        let (id, offset) = tree.locate(617).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(tree.payload(id), Some(&617));
        assert_eq!(tree.position_of(id), 617);
    }

    #[test]
    fn front_inserts_rotate_through_root() {
        let mut tree = OrderTree::new();
        let mut ids = Vec::new();
        for i in 0..64u32 {
            ids.push(tree.insert_at(0, 1, Some(i)));
            tree.check_invariants().unwrap();
        }
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(tree.position_of(*id), 63 - i);
        }
    }

    #[test]
    fn runs_count_as_empties() {
        let mut tree = OrderTree::new();
        tree.insert_at(0, 5, None);
        tree.insert_at(5, 1, Some(9));
        tree.insert_at(6, 3, None);
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.empties(), 8);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(collect(&tree), vec![(5, None), (1, Some(9)), (3, None)]);

        let (id, offset) = tree.locate(7).unwrap();
        assert_eq!(offset, 1);
        tree.set_run_span(id, 1);
        assert_eq!(tree.len(), 7);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_node_with_two_children_keeps_handles() {
        let mut tree = OrderTree::new();
        let ids: Vec<_> = (0..31u32)
            .map(|i| {
                let len = tree.len();
                tree.insert_at(len, 1, Some(i))
            })
            .collect();
        let root = tree.root.unwrap();
        let (_, payload) = tree.remove_node(root);
        tree.check_invariants().unwrap();
        let removed = payload.unwrap() as usize;

        for (i, id) in ids.iter().enumerate() {
            if i == removed {
                assert!(!tree.contains(*id));
                continue;
            }
            let expected = if i < removed { i } else { i - 1 };
            assert_eq!(tree.position_of(*id), expected);
            assert_eq!(tree.payload(*id), Some(&(i as u32)));
        }
    }

    #[test]
    fn prev_and_next_walk_in_order() {
        let mut tree = OrderTree::new();
        for i in 0..10u32 {
            let len = tree.len();
            tree.insert_at(len, 1, Some(i));
        }
        let mut backwards = Vec::new();
        let mut current = tree.last();
        while let Some(id) = current {
            backwards.push(*tree.payload(id).unwrap());
            current = tree.prev(id);
        }
        assert_eq!(backwards, (0..10).rev().collect::<Vec<_>>());
    }

    #[test]
    fn set_payload_flips_empty_counts() {
        let mut tree = OrderTree::new();
        let a = tree.insert_at(0, 1, Some(1u32));
        tree.insert_at(1, 1, Some(2u32));
        assert_eq!(tree.empties(), 0);
        assert_eq!(tree.set_payload(a, None), Some(1));
        assert_eq!(tree.empties(), 1);
        assert!(tree.is_run(a));
        tree.check_invariants().unwrap();
    }
}
