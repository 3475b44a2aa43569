//! View nodes and the builder used to create them.
//!
//! A node is one rectangle of the UI tree. Widget behavior is attached by
//! composition: a paint strategy ([`Render`]), a command handler map, key
//! bindings, an optional mouse handler and observers. There is no widget
//! subclassing; every widget is a plain node with callbacks.

use std::collections::HashMap;
use std::rc::Rc;

use crate::binding::{KeyBindings, KeyChord};
use crate::command::{Command, CommandContext, CommandHandler, Outcome};
use crate::dim::Dim;
use crate::draw::Render;
use crate::error::Result;
use crate::event::{NodeEvent, Observer};
use crate::geometry::{Point, Rect, Thickness};
use crate::pos::Pos;
use crate::router::{MouseContext, MouseHandler};

slotmap::new_key_type! {
    /// Stable handle to a node in a [`ViewTree`](crate::tree::ViewTree).
    ///
    /// Handles are versioned: once a node is disposed its id never names
    /// another node.
    pub struct NodeId;
}

/// Whether layout and resolution may run for a node yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    /// Created but never attached under an initialized parent.
    #[default]
    Uninitialized,
    /// Initialization in progress.
    Initializing,
    /// Ready for layout.
    Initialized,
}

/// How a node's Frame is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStyle {
    /// The Frame was set directly and is never recomputed.
    Absolute,
    /// The Frame is derived from expressions on every layout pass.
    Computed,
}

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) x: Option<Pos>,
    pub(crate) y: Option<Pos>,
    pub(crate) width: Option<Dim>,
    pub(crate) height: Option<Dim>,
    pub(crate) frame: Rect,
    pub(crate) frame_set: bool,
    pub(crate) padding: Thickness,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) can_focus: bool,
    pub(crate) has_focus: bool,
    pub(crate) focused_child: Option<NodeId>,
    pub(crate) visible: bool,
    pub(crate) init: InitState,
    pub(crate) needs_layout: bool,
    pub(crate) renderer: Option<Box<dyn Render>>,
    pub(crate) bindings: KeyBindings,
    pub(crate) handlers: HashMap<Command, CommandHandler>,
    pub(crate) mouse: Option<MouseHandler>,
    pub(crate) observers: Vec<Observer>,
}

impl Node {
    pub(crate) fn layout_style(&self) -> LayoutStyle {
        if self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none() {
            LayoutStyle::Absolute
        } else {
            LayoutStyle::Computed
        }
    }

    /// Frame size minus padding, at the origin.
    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.frame.width - self.padding.horizontal(),
            self.frame.height - self.padding.vertical(),
        )
    }

    /// Where the content (Bounds) origin sits inside the Frame.
    pub(crate) fn content_offset(&self) -> Point {
        Point::new(self.padding.left, self.padding.top)
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.init == InitState::Initialized
    }

    /// Give unset expressions their defaults so the node always has a
    /// resolvable geometry. A node placed with an explicit Frame and no
    /// expressions stays Absolute.
    pub(crate) fn apply_default_expressions(&mut self) {
        if self.frame_set && self.layout_style() == LayoutStyle::Absolute {
            return;
        }
        self.x.get_or_insert(Pos::Absolute(0));
        self.y.get_or_insert(Pos::Absolute(0));
        self.width.get_or_insert(Dim::Fill(0));
        self.height.get_or_insert(Dim::Fill(0));
    }

    pub(crate) fn notify(&mut self, id: NodeId, event: &NodeEvent) {
        for observer in self.observers.iter_mut() {
            observer(id, event);
        }
    }
}

/// Builder for a detached node; hand it to
/// [`ViewTree::insert`](crate::tree::ViewTree::insert).
///
/// ```rust,ignore
/// let id = tree.insert(
///     View::new("ok-button")
///         .x(Pos::center())
///         .y(Pos::anchor_end(1))
///         .width(Dim::absolute(8))
///         .height(Dim::absolute(1))
///         .can_focus(true),
/// );
/// ```
pub struct View {
    pub(crate) node: Node,
}

impl View {
    /// A new node with a logical name (not required to be unique).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Node {
                name: name.into(),
                x: None,
                y: None,
                width: None,
                height: None,
                frame: Rect::default(),
                frame_set: false,
                padding: Thickness::default(),
                parent: None,
                children: Vec::new(),
                can_focus: false,
                has_focus: false,
                focused_child: None,
                visible: true,
                init: InitState::Uninitialized,
                needs_layout: true,
                renderer: None,
                bindings: KeyBindings::new(),
                handlers: HashMap::new(),
                mouse: None,
                observers: Vec::new(),
            },
        }
    }

    /// X expression.
    pub fn x(mut self, x: impl Into<Pos>) -> Self {
        self.node.x = Some(x.into());
        self
    }

    /// Y expression.
    pub fn y(mut self, y: impl Into<Pos>) -> Self {
        self.node.y = Some(y.into());
        self
    }

    /// Width expression.
    pub fn width(mut self, width: impl Into<Dim>) -> Self {
        self.node.width = Some(width.into());
        self
    }

    /// Height expression.
    pub fn height(mut self, height: impl Into<Dim>) -> Self {
        self.node.height = Some(height.into());
        self
    }

    /// Place the node with an explicit Frame. With no expressions set, the
    /// node is laid out Absolute.
    pub fn frame(mut self, frame: Rect) -> Self {
        self.node.frame = frame;
        self.node.frame_set = true;
        self
    }

    /// Padding between the Frame and the content Bounds.
    pub fn padding(mut self, padding: Thickness) -> Self {
        self.node.padding = padding;
        self
    }

    /// Whether the node can become the focused leaf.
    pub fn can_focus(mut self, can_focus: bool) -> Self {
        self.node.can_focus = can_focus;
        self
    }

    /// Initial visibility.
    pub fn visible(mut self, visible: bool) -> Self {
        self.node.visible = visible;
        self
    }

    /// Paint strategy.
    pub fn render(mut self, renderer: impl Render + 'static) -> Self {
        self.node.renderer = Some(Box::new(renderer));
        self
    }

    /// Bind a chord in this node's own table.
    pub fn bind(
        mut self,
        chord: impl Into<KeyChord>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<Self> {
        self.node.bindings.bind(chord, commands)?;
        Ok(self)
    }

    /// Handler for `command`. Replaces any previous handler for it.
    pub fn on_command(
        mut self,
        command: Command,
        handler: impl Fn(&mut CommandContext<'_>) -> Outcome + 'static,
    ) -> Self {
        self.node.handlers.insert(command, Rc::new(handler));
        self
    }

    /// Mouse handler; receives node-local coordinates.
    pub fn on_mouse(mut self, handler: impl Fn(&mut MouseContext<'_>) -> bool + 'static) -> Self {
        self.node.mouse = Some(Rc::new(handler));
        self
    }

    /// Append an observer.
    pub fn observe(mut self, observer: impl FnMut(NodeId, &NodeEvent) + 'static) -> Self {
        self.node.observers.push(Box::new(observer));
        self
    }
}
