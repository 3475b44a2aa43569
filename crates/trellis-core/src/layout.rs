//! The layout engine.
//!
//! A pass walks the tree depth-first, parents before children. For each
//! Computed node it resolves Width/Height, then X/Y, against the parent's
//! Bounds. Absolute nodes keep their Frame but their children are still laid
//! out.
//!
//! Expressions may reference other nodes. A sibling that has not been
//! resolved yet is resolved on demand and memoized for the rest of the pass;
//! meeting a node that is still in progress is a [`Error::LayoutCycle`]. Any
//! other reference to a node that this pass has not produced yet is a
//! [`Error::LayoutOrder`]. All per-pass markers live in a `LayoutPass` that
//! is created fresh for every call, so re-entrant layout from a handler is
//! safe.

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::dim::{Dim, FrameSource};
use crate::error::{Error, Result};
use crate::event::NodeEvent;
use crate::geometry::{Rect, Size};
use crate::node::{LayoutStyle, NodeId};
use crate::pos::Pos;
use crate::tree::ViewTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    NotStarted,
    ResolvingDimensions,
    ResolvingPositions,
    Done,
}

/// Per-call resolution state.
struct LayoutPass<'t> {
    tree: &'t mut ViewTree,
    scope: NodeId,
    screen: Size,
    phases: SecondaryMap<NodeId, Phase>,
    changed: Vec<(NodeId, Rect)>,
}

impl<'t> LayoutPass<'t> {
    fn new(tree: &'t mut ViewTree, scope: NodeId, screen: Size) -> Self {
        Self {
            tree,
            scope,
            screen,
            phases: SecondaryMap::new(),
            changed: Vec::new(),
        }
    }

    fn phase(&self, id: NodeId) -> Phase {
        self.phases.get(id).copied().unwrap_or_default()
    }

    /// Resolve `id` and then its subtree.
    fn run(&mut self, id: NodeId) -> Result<()> {
        if !self.tree.is_initialized(id) {
            return Ok(());
        }
        self.resolve(id)?;
        let children = self.tree.children(id).to_vec();
        for child in children {
            self.run(child)?;
        }
        Ok(())
    }

    /// The containing size for `id`: its parent's Bounds, or the screen for
    /// the root.
    fn containing(&self, id: NodeId) -> Size {
        match self.tree.nodes[id].parent {
            Some(parent) => self.tree.nodes[parent].bounds().size(),
            None => self.screen,
        }
    }

    /// Resolve one node's Frame (not its children), memoized per pass.
    fn resolve(&mut self, id: NodeId) -> Result<Rect> {
        match self.phase(id) {
            Phase::Done => return Ok(self.tree.nodes[id].frame),
            Phase::ResolvingDimensions | Phase::ResolvingPositions => {
                return Err(Error::LayoutCycle { node: id });
            }
            Phase::NotStarted => {}
        }

        let node = self.tree.node(id)?;
        if node.layout_style() == LayoutStyle::Absolute {
            let frame = node.frame;
            self.phases.insert(id, Phase::Done);
            return Ok(frame);
        }

        let current = node.frame;
        let x = node.x.clone().unwrap_or(Pos::Absolute(current.x));
        let y = node.y.clone().unwrap_or(Pos::Absolute(current.y));
        let width = node.width.clone().unwrap_or(Dim::Absolute(current.width));
        let height = node.height.clone().unwrap_or(Dim::Absolute(current.height));
        let containing = self.containing(id);

        self.phases.insert(id, Phase::ResolvingDimensions);
        let (w, early_x) = self.resolve_axis_size(id, &width, &x, containing.width)?;
        let (h, early_y) = self.resolve_axis_size(id, &height, &y, containing.height)?;

        self.phases.insert(id, Phase::ResolvingPositions);
        let px = match early_x {
            Some(px) => px,
            None => x.resolve(containing.width, w, id, self)?,
        };
        let py = match early_y {
            Some(py) => py,
            None => y.resolve(containing.height, h, id, self)?,
        };

        let frame = Rect::new(px, py, w, h);
        let node = &mut self.tree.nodes[id];
        if node.frame != frame {
            self.changed.push((id, node.frame));
            node.frame = frame;
        }
        node.needs_layout = false;
        self.phases.insert(id, Phase::Done);
        Ok(frame)
    }

    /// Resolve a size. A size anchored to the far edge needs the position
    /// first, which is returned so it is not evaluated twice.
    fn resolve_axis_size(
        &mut self,
        id: NodeId,
        size: &Dim,
        pos: &Pos,
        containing: i32,
    ) -> Result<(i32, Option<i32>)> {
        if !size.needs_position() {
            return Ok((size.resolve(containing, id, self)?, None));
        }
        if pos.needs_own_size() {
            return Err(Error::LayoutCycle { node: id });
        }
        let at = pos.resolve(containing, 0, id, self)?;
        Ok((size.resolve_at(containing, at, id, self)?, Some(at)))
    }

    fn is_sibling(&self, a: NodeId, b: NodeId) -> bool {
        let pa = self.tree.nodes.get(a).and_then(|n| n.parent);
        pa.is_some() && pa == self.tree.nodes.get(b).and_then(|n| n.parent)
    }

    fn in_scope(&self, id: NodeId) -> bool {
        self.tree.ancestors(id).contains(&self.scope)
    }

    /// Fire `FrameChanged` for everything this pass moved.
    fn finish(self) -> usize {
        let count = self.changed.len();
        for (id, old) in self.changed {
            if let Some(node) = self.tree.nodes.get_mut(id) {
                let new = node.frame;
                node.notify(id, &NodeEvent::FrameChanged { old, new });
            }
        }
        if count > 0 {
            self.tree.needs_redraw = true;
        }
        count
    }
}

impl FrameSource for LayoutPass<'_> {
    fn frame_of(&mut self, requester: NodeId, target: NodeId) -> Result<Rect> {
        if target == requester {
            return Err(Error::LayoutCycle { node: requester });
        }
        let order_error = Error::LayoutOrder {
            node: requester,
            target,
        };
        if !self.tree.nodes.contains_key(target) {
            return Err(order_error);
        }
        if self.phase(target) == Phase::Done {
            return Ok(self.tree.nodes[target].frame);
        }
        if self.is_sibling(requester, target) && self.tree.is_initialized(target) {
            return self.resolve(target);
        }
        // Attached nodes outside this pass keep the Frame from their last pass.
        if !self.in_scope(target) && self.tree.is_attached(target) {
            return Ok(self.tree.nodes[target].frame);
        }
        Err(order_error)
    }
}

impl ViewTree {
    /// Lay out the whole tree for a screen of `screen` cells.
    pub fn layout(&mut self, screen: Size) -> Result<()> {
        if screen.is_negative() {
            let dimension = screen.width.min(screen.height);
            return Err(Error::InvalidGeometry { dimension });
        }
        self.screen = Some(screen);
        let root = self.root;
        let result = self.run_pass(root, screen);
        if result.is_ok() {
            self.layout_pending = false;
        }
        result
    }

    /// Re-lay out the subtree at `id` against its parent's current Bounds.
    ///
    /// A node that is not initialized, or not attached under the root, is
    /// left alone.
    pub fn layout_subtree(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if !self.is_initialized(id) || !self.is_attached(id) {
            return Ok(());
        }
        let screen = self
            .screen
            .unwrap_or_else(|| self.nodes[self.root].frame.size());
        self.run_pass(id, screen)
    }

    /// Run a full pass if a layout was requested or the screen changed.
    ///
    /// Returns whether a pass ran. Hosts call this once per cycle before
    /// drawing.
    pub fn layout_if_needed(&mut self, screen: Size) -> Result<bool> {
        if !self.layout_pending && self.screen == Some(screen) {
            return Ok(false);
        }
        self.layout(screen)?;
        Ok(true)
    }

    fn run_pass(&mut self, scope: NodeId, screen: Size) -> Result<()> {
        let mut pass = LayoutPass::new(self, scope, screen);
        let result = pass.run(scope);
        match result {
            Ok(()) => {
                let changed = pass.finish();
                debug!(?scope, changed, "layout pass complete");
                Ok(())
            }
            Err(err) => {
                // Frames resolved before the failure stay in place, so their
                // observers still hear about the move.
                let changed = pass.finish();
                warn!(?scope, changed, error = %err, "layout pass failed");
                Err(err)
            }
        }
    }
}
