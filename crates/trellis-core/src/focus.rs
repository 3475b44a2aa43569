//! Focus chain and tab-order traversal.
//!
//! Focus is a chain from the root down to one leaf: every node on it has
//! `has_focus` set and each links to the next through its focused child.
//! Moving focus fires [`NodeEvent::Leave`] on the old nodes from the leaf
//! upward, stopping below the common ancestor, then [`NodeEvent::Enter`] on
//! the new nodes from below the common ancestor down to the new leaf. Nodes
//! that stay on the chain see nothing.

use tracing::trace;

use crate::error::Result;
use crate::event::NodeEvent;
use crate::node::NodeId;
use crate::tree::ViewTree;

impl ViewTree {
    /// The focused leaf, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus_chain().last().copied()
    }

    /// The focus chain from the root down to the focused leaf. Empty when
    /// nothing has focus.
    pub fn focus_chain(&self) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(self.root).filter(|r| self.has_focus(*r));
        while let Some(id) = current {
            chain.push(id);
            current = self.nodes[id].focused_child;
        }
        chain
    }

    /// Whether `id` may take focus now: attached, initialized, visible all
    /// the way up, and `can_focus`.
    pub fn is_focusable(&self, id: NodeId) -> bool {
        self.can_focus(id)
            && self.is_initialized(id)
            && self.is_attached(id)
            && self.is_effectively_visible(id)
    }

    /// Make `id` the focused leaf.
    ///
    /// Returns `Ok(false)` without touching anything when the node cannot
    /// take focus.
    pub fn set_focus(&mut self, id: NodeId) -> Result<bool> {
        self.node(id)?;
        if !self.is_focusable(id) {
            return Ok(false);
        }
        self.move_focus(Some(id));
        Ok(true)
    }

    /// Remove focus from every node.
    pub fn clear_focus(&mut self) {
        self.move_focus(None);
    }

    /// Move focus to the next focusable view in tab order, wrapping around.
    pub fn focus_next(&mut self) -> bool {
        self.cycle_focus(true)
    }

    /// Move focus to the previous focusable view in tab order, wrapping
    /// around.
    pub fn focus_prev(&mut self) -> bool {
        self.cycle_focus(false)
    }

    /// Focusable nodes in tab order. A focusable container is skipped when
    /// it has focusable descendants; traversal enters them instead.
    pub fn tab_order(&self) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = self
            .pre_order(self.root)
            .into_iter()
            .filter(|id| self.is_focusable(*id))
            .collect();
        candidates
            .iter()
            .enumerate()
            .filter(|(i, id)| {
                candidates
                    .get(i + 1)
                    .is_none_or(|next| !self.ancestors(*next).contains(*id))
            })
            .map(|(_, id)| *id)
            .collect()
    }

    fn cycle_focus(&mut self, forward: bool) -> bool {
        let order = self.tab_order();
        if order.is_empty() {
            return false;
        }
        let target = match self.focused() {
            Some(current) => match order.iter().position(|id| *id == current) {
                Some(i) if forward => order[(i + 1) % order.len()],
                Some(i) => order[(i + order.len() - 1) % order.len()],
                None => self.nearest_in_order(current, &order, forward),
            },
            None if forward => order[0],
            None => order[order.len() - 1],
        };
        self.move_focus(Some(target));
        true
    }

    /// For a focused node outside the tab order (a container), the first
    /// target after it (or last before it) in pre-order.
    fn nearest_in_order(&self, current: NodeId, order: &[NodeId], forward: bool) -> NodeId {
        let all = self.pre_order(self.root);
        let index_of = |id: NodeId| all.iter().position(|n| *n == id).unwrap_or(0);
        let here = index_of(current);
        let found = if forward {
            order.iter().find(|id| index_of(**id) > here)
        } else {
            order.iter().rev().find(|id| index_of(**id) < here)
        };
        match (found, forward) {
            (Some(id), _) => *id,
            (None, true) => order[0],
            (None, false) => order[order.len() - 1],
        }
    }

    /// Move focus out of the subtree at `id` if it is on the focus chain:
    /// to the nearest focusable ancestor, or nowhere.
    pub(crate) fn release_focus(&mut self, id: NodeId) {
        if !self.has_focus(id) {
            return;
        }
        let fallback = self
            .ancestors(id)
            .into_iter()
            .skip(1)
            .find(|a| self.is_focusable(*a));
        trace!(?id, ?fallback, "focus released");
        self.move_focus(fallback);
    }

    fn move_focus(&mut self, target: Option<NodeId>) {
        let old_chain = self.focus_chain();
        let previous = old_chain.last().copied();
        if previous == target {
            return;
        }
        let new_chain: Vec<NodeId> = match target {
            Some(id) => self.ancestors(id).into_iter().rev().collect(),
            None => Vec::new(),
        };
        let common = old_chain
            .iter()
            .zip(&new_chain)
            .take_while(|(a, b)| a == b)
            .count();

        for id in old_chain[common..].iter().rev() {
            let node = &mut self.nodes[*id];
            node.has_focus = false;
            node.focused_child = None;
            node.notify(*id, &NodeEvent::Leave { next: target });
        }

        for pair in new_chain.windows(2) {
            self.nodes[pair[0]].focused_child = Some(pair[1]);
        }
        if let Some(leaf) = target {
            self.nodes[leaf].focused_child = None;
        }

        for id in &new_chain[common..] {
            let node = &mut self.nodes[*id];
            node.has_focus = true;
            node.notify(*id, &NodeEvent::Enter { previous });
        }

        self.needs_redraw = true;
        trace!(?previous, ?target, "focus moved");
    }
}
