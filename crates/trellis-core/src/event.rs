//! Terminal input events and per-node notifications.

use crossterm::event::{KeyEvent, MouseEvent};

use crate::geometry::Rect;
use crate::node::NodeId;

/// Terminal events produced by the host loop.
///
/// Each variant wraps the corresponding [`crossterm::event::Event`] payload,
/// so key codes, modifiers and mouse buttons keep the full crossterm API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Terminal window gained focus.
    FocusGained,
    /// Terminal window lost focus.
    FocusLost,
    /// Bracketed paste content.
    Paste(String),
}

impl From<crossterm::event::Event> for TerminalEvent {
    fn from(event: crossterm::event::Event) -> Self {
        match event {
            crossterm::event::Event::Key(k) => TerminalEvent::Key(k),
            crossterm::event::Event::Mouse(m) => TerminalEvent::Mouse(m),
            crossterm::event::Event::Resize(w, h) => TerminalEvent::Resize(w, h),
            crossterm::event::Event::FocusGained => TerminalEvent::FocusGained,
            crossterm::event::Event::FocusLost => TerminalEvent::FocusLost,
            crossterm::event::Event::Paste(s) => TerminalEvent::Paste(s),
        }
    }
}

/// A notification delivered to a node's observers.
///
/// Observers run synchronously, in registration order, at the point the
/// change happens. Focus transitions fire `Leave` from the old leaf upward,
/// then `Enter` from below the common ancestor down to the new leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    /// The node joined the focus chain.
    Enter {
        /// The previously focused leaf, if any.
        previous: Option<NodeId>,
    },
    /// The node left the focus chain.
    Leave {
        /// The newly focused leaf, if any.
        next: Option<NodeId>,
    },
    /// The node finished initialization.
    Initialized,
    /// The node is about to be removed from the arena.
    Disposed,
    /// A layout pass changed the node's Frame.
    FrameChanged {
        /// Frame before the pass.
        old: Rect,
        /// Frame after the pass.
        new: Rect,
    },
    /// The visibility flag flipped.
    VisibilityChanged(bool),
}

/// An observer callback. Receives the id of the node it was registered on.
pub type Observer = Box<dyn FnMut(NodeId, &NodeEvent)>;
