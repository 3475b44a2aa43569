//! The view tree: node storage, attachment, disposal and accessors.
//!
//! [`ViewTree`] is the application context. It owns every node (in a
//! [`SlotMap`] arena), the root, the application-scope key bindings and the
//! redraw flag. Layout, drawing, focus and routing are implemented on it in
//! their own modules.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::SlotMap;
use tracing::trace;

use crate::binding::{KeyBindings, KeyChord};
use crate::command::{Command, CommandContext, CommandHandler, Outcome};
use crate::dim::Dim;
use crate::draw::Render;
use crate::error::{Error, Result};
use crate::event::NodeEvent;
use crate::geometry::{Point, Rect, Size, Thickness};
use crate::node::{InitState, LayoutStyle, Node, NodeId, View};
use crate::pos::Pos;
use crate::router::MouseContext;

/// Owner of all nodes plus application-scope state.
pub struct ViewTree {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) root: NodeId,
    pub(crate) app_bindings: KeyBindings,
    pub(crate) app_handlers: HashMap<Command, CommandHandler>,
    pub(crate) screen: Option<Size>,
    pub(crate) layout_pending: bool,
    pub(crate) needs_redraw: bool,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// A tree containing only an initialized root that fills the screen.
    ///
    /// Application scope starts with Tab / Shift+Tab bound to focus
    /// traversal.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root = View::new("root")
            .x(Pos::Absolute(0))
            .y(Pos::Absolute(0))
            .width(Dim::Fill(0))
            .height(Dim::Fill(0))
            .node;
        root.init = InitState::Initialized;
        let root = nodes.insert(root);

        let mut app_handlers: HashMap<Command, CommandHandler> = HashMap::new();
        app_handlers.insert(
            Command::NextView,
            Rc::new(|cx: &mut CommandContext<'_>| Outcome::from(cx.tree.focus_next())),
        );
        app_handlers.insert(
            Command::PreviousView,
            Rc::new(|cx: &mut CommandContext<'_>| Outcome::from(cx.tree.focus_prev())),
        );

        Self {
            nodes,
            root,
            app_bindings: KeyBindings::application_defaults(),
            app_handlers,
            screen: None,
            layout_pending: true,
            needs_redraw: true,
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Store a detached, uninitialized node and return its id.
    pub fn insert(&mut self, view: View) -> NodeId {
        let id = self.nodes.insert(view.node);
        trace!(?id, "node created");
        id
    }

    /// Append `child` to `parent`'s children (on top in z-order).
    ///
    /// A child that already has a parent is moved. Unset expressions get
    /// their defaults; if `parent` is initialized, the whole child subtree is
    /// initialized. The child is laid out on the next pass, not here.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(Error::InvalidHierarchy("the root cannot be re-parented"));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::InvalidHierarchy(
                "cannot add a node under itself or its own descendant",
            ));
        }
        if self.nodes[child].parent.is_some() {
            self.remove(child)?;
        }

        self.nodes[parent].children.push(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.apply_default_expressions();
        node.needs_layout = true;

        if self.nodes[parent].is_initialized() {
            self.initialize_subtree(child);
        }
        self.request_layout(parent);
        trace!(?parent, ?child, "node added");
        Ok(())
    }

    /// Detach `child` from its parent without disposing it.
    ///
    /// The node keeps its last Frame. If focus was inside it, focus first
    /// moves to the nearest focusable ancestor. Returns `false` if it was
    /// already detached.
    pub fn remove(&mut self, child: NodeId) -> Result<bool> {
        self.node(child)?;
        if child == self.root {
            return Err(Error::InvalidHierarchy("the root cannot be removed"));
        }
        let Some(parent) = self.nodes[child].parent else {
            return Ok(false);
        };
        self.release_focus(child);
        self.detach(parent, child);
        self.request_layout(parent);
        trace!(?parent, ?child, "node removed");
        Ok(true)
    }

    /// Dispose `id` and every descendant, children before parents.
    ///
    /// Focus leaves the subtree first. Each node's observers see
    /// [`NodeEvent::Disposed`] before it is dropped. Disposing an
    /// already-disposed id is a no-op returning `Ok(false)`.
    pub fn dispose(&mut self, id: NodeId) -> Result<bool> {
        if !self.nodes.contains_key(id) {
            return Ok(false);
        }
        if id == self.root {
            return Err(Error::InvalidHierarchy("the root cannot be disposed"));
        }
        self.release_focus(id);
        if let Some(parent) = self.nodes[id].parent {
            self.detach(parent, id);
            self.request_layout(parent);
        }
        let order = self.post_order(id);
        for node_id in &order {
            if let Some(node) = self.nodes.get_mut(*node_id) {
                node.notify(*node_id, &NodeEvent::Disposed);
            }
            self.nodes.remove(*node_id);
        }
        self.needs_redraw = true;
        trace!(?id, count = order.len(), "subtree disposed");
        Ok(true)
    }

    /// Whether `id` no longer names a live node.
    pub fn is_disposed(&self, id: NodeId) -> bool {
        !self.nodes.contains_key(id)
    }

    /// Mark `id` for re-layout on the next
    /// [`layout_if_needed`](ViewTree::layout_if_needed) call.
    pub fn request_layout(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.needs_layout = true;
            self.layout_pending = true;
        }
    }

    /// Whether `id` is waiting for a layout pass.
    pub fn needs_layout(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.needs_layout)
    }

    /// Ask the host to repaint on its next frame.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Whether anything changed since the last draw.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    // ----- accessors -------------------------------------------------------

    /// Logical name.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.name.as_str())
    }

    /// Parent, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children in z-order (last is on top).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Frame in the parent's content coordinates.
    pub fn frame(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.frame)
    }

    /// Content rectangle in the node's own coordinates (origin 0,0).
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id).map(Node::bounds)
    }

    /// Padding between Frame and Bounds.
    pub fn padding(&self, id: NodeId) -> Option<Thickness> {
        self.nodes.get(id).map(|n| n.padding)
    }

    /// X expression, if any.
    pub fn x(&self, id: NodeId) -> Option<&Pos> {
        self.nodes.get(id).and_then(|n| n.x.as_ref())
    }

    /// Y expression, if any.
    pub fn y(&self, id: NodeId) -> Option<&Pos> {
        self.nodes.get(id).and_then(|n| n.y.as_ref())
    }

    /// Width expression, if any.
    pub fn width(&self, id: NodeId) -> Option<&Dim> {
        self.nodes.get(id).and_then(|n| n.width.as_ref())
    }

    /// Height expression, if any.
    pub fn height(&self, id: NodeId) -> Option<&Dim> {
        self.nodes.get(id).and_then(|n| n.height.as_ref())
    }

    /// Absolute or Computed, inferred from the expressions.
    pub fn layout_style(&self, id: NodeId) -> Option<LayoutStyle> {
        self.nodes.get(id).map(Node::layout_style)
    }

    /// Initialization state.
    pub fn init_state(&self, id: NodeId) -> Option<InitState> {
        self.nodes.get(id).map(|n| n.init)
    }

    /// Whether the node is initialized.
    pub fn is_initialized(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(Node::is_initialized)
    }

    /// The node's own visibility flag.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    /// The CanFocus flag.
    pub fn can_focus(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.can_focus)
    }

    /// Whether the node is on the focus chain.
    pub fn has_focus(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.has_focus)
    }

    /// The node's own key bindings.
    pub fn bindings(&self, id: NodeId) -> Option<&KeyBindings> {
        self.nodes.get(id).map(|n| &n.bindings)
    }

    /// Application-scope bindings, consulted last.
    pub fn app_bindings(&self) -> &KeyBindings {
        &self.app_bindings
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists for the tree's lifetime.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the first node with `name` in pre-order under the root.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.pre_order(self.root)
            .into_iter()
            .find(|id| self.nodes[*id].name == name)
    }

    // ----- mutation --------------------------------------------------------

    /// Replace the X expression.
    pub fn set_x(&mut self, id: NodeId, x: impl Into<Pos>) -> Result<()> {
        self.node_mut(id)?.x = Some(x.into());
        self.request_layout(id);
        Ok(())
    }

    /// Replace the Y expression.
    pub fn set_y(&mut self, id: NodeId, y: impl Into<Pos>) -> Result<()> {
        self.node_mut(id)?.y = Some(y.into());
        self.request_layout(id);
        Ok(())
    }

    /// Replace the width expression.
    pub fn set_width(&mut self, id: NodeId, width: impl Into<Dim>) -> Result<()> {
        self.node_mut(id)?.width = Some(width.into());
        self.request_layout(id);
        Ok(())
    }

    /// Replace the height expression.
    pub fn set_height(&mut self, id: NodeId, height: impl Into<Dim>) -> Result<()> {
        self.node_mut(id)?.height = Some(height.into());
        self.request_layout(id);
        Ok(())
    }

    /// Set the Frame directly, switching the node to Absolute layout.
    pub fn set_frame(&mut self, id: NodeId, frame: Rect) -> Result<()> {
        let node = self.node_mut(id)?;
        node.x = None;
        node.y = None;
        node.width = None;
        node.height = None;
        node.frame_set = true;
        let old = node.frame;
        node.frame = frame;
        if old != frame {
            node.notify(id, &NodeEvent::FrameChanged { old, new: frame });
        }
        self.request_layout(id);
        self.needs_redraw = true;
        Ok(())
    }

    /// Replace the padding.
    pub fn set_padding(&mut self, id: NodeId, padding: Thickness) -> Result<()> {
        self.node_mut(id)?.padding = padding;
        self.request_layout(id);
        Ok(())
    }

    /// Show or hide a node. Hiding a node on the focus chain moves focus to
    /// the nearest focusable ancestor.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.visible == visible {
            return Ok(());
        }
        node.visible = visible;
        node.notify(id, &NodeEvent::VisibilityChanged(visible));
        if !visible {
            self.release_focus(id);
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Change the CanFocus flag. Clearing it on a focused node moves focus
    /// to the nearest focusable ancestor.
    pub fn set_can_focus(&mut self, id: NodeId, can_focus: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        node.can_focus = can_focus;
        if !can_focus && node.has_focus && node.focused_child.is_none() {
            self.release_focus(id);
        }
        Ok(())
    }

    /// Replace the paint strategy.
    pub fn set_renderer(&mut self, id: NodeId, renderer: impl Render + 'static) -> Result<()> {
        self.node_mut(id)?.renderer = Some(Box::new(renderer));
        self.needs_redraw = true;
        Ok(())
    }

    /// Bind a chord in the node's own table (last write wins).
    pub fn bind(
        &mut self,
        id: NodeId,
        chord: impl Into<KeyChord>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<()> {
        self.node_mut(id)?.bindings.bind(chord, commands)
    }

    /// Remove a chord from the node's own table.
    pub fn unbind(&mut self, id: NodeId, chord: &KeyChord) -> Result<Option<Vec<Command>>> {
        Ok(self.node_mut(id)?.bindings.unbind(chord))
    }

    /// Bind a chord at application scope.
    pub fn bind_app(
        &mut self,
        chord: impl Into<KeyChord>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<()> {
        self.app_bindings.bind(chord, commands)
    }

    /// Mutable access to the application-scope table.
    pub fn app_bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.app_bindings
    }

    /// Register the node's handler for `command`.
    pub fn on_command(
        &mut self,
        id: NodeId,
        command: Command,
        handler: impl Fn(&mut CommandContext<'_>) -> Outcome + 'static,
    ) -> Result<()> {
        self.node_mut(id)?
            .handlers
            .insert(command, Rc::new(handler));
        Ok(())
    }

    /// Register an application-scope handler for `command`.
    pub fn on_app_command(
        &mut self,
        command: Command,
        handler: impl Fn(&mut CommandContext<'_>) -> Outcome + 'static,
    ) {
        self.app_handlers.insert(command, Rc::new(handler));
    }

    /// Replace the node's mouse handler.
    pub fn on_mouse(
        &mut self,
        id: NodeId,
        handler: impl Fn(&mut MouseContext<'_>) -> bool + 'static,
    ) -> Result<()> {
        self.node_mut(id)?.mouse = Some(Rc::new(handler));
        Ok(())
    }

    /// Append an observer to the node.
    pub fn observe(
        &mut self,
        id: NodeId,
        observer: impl FnMut(NodeId, &NodeEvent) + 'static,
    ) -> Result<()> {
        self.node_mut(id)?.observers.push(Box::new(observer));
        Ok(())
    }

    // ----- coordinates -----------------------------------------------------

    /// Frame in screen coordinates. Detached nodes report their Frame as-is.
    pub fn screen_frame(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        match node.parent {
            Some(parent) => Some(node.frame.offset(self.content_origin(parent)?)),
            None => Some(node.frame),
        }
    }

    /// Screen position of the node's Bounds origin.
    pub fn content_origin(&self, id: NodeId) -> Option<Point> {
        let frame = self.screen_frame(id)?;
        Some(frame.origin() + self.nodes[id].content_offset())
    }

    /// Bounds coordinates to screen coordinates.
    pub fn to_screen(&self, id: NodeId, local: Point) -> Option<Point> {
        Some(self.content_origin(id)? + local)
    }

    /// Screen coordinates to Bounds coordinates.
    pub fn to_local(&self, id: NodeId, screen: Point) -> Option<Point> {
        Some(screen - self.content_origin(id)?)
    }

    // ----- traversal -------------------------------------------------------

    /// `id` followed by its ancestors up to the topmost one.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).map(|_| id);
        while let Some(c) = current {
            out.push(c);
            current = self.nodes[c].parent;
        }
        out
    }

    /// Whether `id` hangs under the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors(id).last() == Some(&self.root)
    }

    /// Visible itself and through every ancestor.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let chain = self.ancestors(id);
        !chain.is_empty() && chain.iter().all(|a| self.nodes[*a].visible)
    }

    /// Pre-order listing of the subtree at `id`.
    pub fn pre_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        out
    }

    /// Post-order listing of the subtree at `id` (children before parents).
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.nodes.contains_key(id) {
            self.collect_post_order(id, &mut out);
        }
        out
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[id].children {
            self.collect_post_order(*child, out);
        }
        out.push(id);
    }

    // ----- internals -------------------------------------------------------

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::UnknownNode(id))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        self.ancestors(of).contains(&candidate)
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
            if p.focused_child == Some(child) {
                p.focused_child = None;
            }
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
        self.needs_redraw = true;
    }

    fn initialize_subtree(&mut self, id: NodeId) {
        for node_id in self.pre_order(id) {
            let node = &mut self.nodes[node_id];
            if node.init != InitState::Uninitialized {
                continue;
            }
            node.init = InitState::Initializing;
            node.needs_layout = true;
            node.init = InitState::Initialized;
            node.notify(node_id, &NodeEvent::Initialized);
        }
        self.layout_pending = true;
    }
}
