//! Abstract commands and the handlers nodes register for them.
//!
//! A [`Command`] names an action ("accept", "move focus to the next view")
//! independently of the key that triggers it. Key bindings map chords to
//! command sequences; a node decides what each command *means* for it by
//! registering a [`CommandHandler`].
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::{Command, Outcome, ViewTree, View};
//! use crossterm::event::KeyCode;
//!
//! let mut tree = ViewTree::new();
//! let button = tree.insert(View::new("ok").can_focus(true));
//! tree.on_command(button, Command::Accept, |cx| {
//!     tracing::info!(node = ?cx.node, "pressed");
//!     Outcome::Handled
//! })?;
//! tree.bind(button, KeyCode::Enter, [Command::Accept])?;
//! ```

use std::rc::Rc;

use crate::binding::KeyChord;
use crate::node::NodeId;
use crate::tree::ViewTree;

/// A named action a view may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Confirm / activate (Enter on a button).
    Accept,
    /// Dismiss / abort.
    Cancel,
    /// Flip a boolean state (Space on a checkbox).
    Toggle,
    /// Move focus to the next view in tab order.
    NextView,
    /// Move focus to the previous view in tab order.
    PreviousView,
    /// Move up.
    Up,
    /// Move down.
    Down,
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Jump to the start.
    Start,
    /// Jump to the end.
    End,
    /// Force a redraw.
    Refresh,
    /// Leave the application.
    Quit,
    /// Widget-specific action.
    Custom(&'static str),
}

/// What a handler did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command was consumed; dispatch stops.
    Handled,
    /// The handler ran but declined; the next command still executes.
    NotHandled,
    /// The node does not support this command at all.
    NotApplicable,
}

impl Outcome {
    /// Whether dispatch should stop here.
    pub fn is_handled(self) -> bool {
        self == Outcome::Handled
    }
}

impl From<bool> for Outcome {
    fn from(handled: bool) -> Self {
        if handled {
            Outcome::Handled
        } else {
            Outcome::NotHandled
        }
    }
}

/// Everything a command handler can see and touch.
pub struct CommandContext<'a> {
    /// The whole tree; handlers may re-enter layout or move focus.
    pub tree: &'a mut ViewTree,
    /// The node whose handler is running (the tree root for
    /// application-scope handlers).
    pub node: NodeId,
    /// The command being executed.
    pub command: Command,
    /// The chord that triggered it, if it came from a key event.
    pub chord: Option<KeyChord>,
}

/// A per-command handler.
///
/// Handlers are reference-counted so the router can clone one out of the
/// tree and hand the handler `&mut ViewTree` at the same time. A panic inside
/// a handler is not caught.
pub type CommandHandler = Rc<dyn Fn(&mut CommandContext<'_>) -> Outcome>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_bool() {
        assert_eq!(Outcome::from(true), Outcome::Handled);
        assert_eq!(Outcome::from(false), Outcome::NotHandled);
        assert!(Outcome::Handled.is_handled());
        assert!(!Outcome::NotApplicable.is_handled());
    }

    #[test]
    fn custom_commands_compare_by_name() {
        assert_eq!(Command::Custom("save"), Command::Custom("save"));
        assert_ne!(Command::Custom("save"), Command::Custom("load"));
    }
}
