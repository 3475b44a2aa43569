//! Core of the **trellis** TUI toolkit.
//!
//! trellis arranges the screen as a tree of rectangular views. Each view's
//! position and size are symbolic expressions ([`Pos`], [`Dim`]) that are
//! re-evaluated on every layout pass, so a view can be centered, anchored to
//! the far edge, or sized relative to a sibling without any manual
//! arithmetic. Rendering is clipped per view, focus is a chain from the root
//! to one leaf, and keys are mapped to [`Command`]s that bubble from the
//! focused view up to the application.
//!
//! # Key types
//!
//! | Type | Role |
//! |------|------|
//! | [`ViewTree`] | Owns every node; the application context |
//! | [`View`] | Builder for a detached node |
//! | [`Pos`] / [`Dim`] | Position and size expressions |
//! | [`KeyBindings`] | Chord to command-sequence table |
//! | [`Render`] / [`Painter`] | Clipped, frame-local drawing |
//! | [`Application`] | Async crossterm host loop |
//! | [`TestApp`] | Headless harness for tests |
//!
//! # Quick start
//!
//! ```ignore
//! use trellis_core::{Application, Dim, Pos, View, ViewTree};
//! use ratatui::style::Style;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), trellis_core::ProgramError> {
//!     let mut tree = ViewTree::new();
//!     let hello = tree.insert(
//!         View::new("hello")
//!             .x(Pos::center())
//!             .y(Pos::center())
//!             .width(Dim::absolute(13))
//!             .height(Dim::absolute(1))
//!             .render(|_: &trellis_core::RenderContext<'_>, p: &mut trellis_core::Painter<'_>| {
//!                 p.set_str(0, 0, "Hello, world!", Style::default());
//!             }),
//!     );
//!     let root = tree.root();
//!     tree.add(root, hello)?;
//!     Application::new(tree)?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod command;
pub mod dim;
pub mod draw;
pub mod error;
pub mod event;
mod focus;
pub mod geometry;
mod layout;
pub mod node;
pub mod pos;
pub mod router;
pub mod runtime;
pub mod testing;
pub mod tree;

pub use binding::{KeyBindings, KeyChord};
pub use command::{Command, CommandContext, CommandHandler, Outcome};
pub use dim::{Detached, Dim, FrameSource};
pub use draw::{Painter, Render, RenderContext};
pub use error::{Error, Result};
pub use event::{NodeEvent, Observer, TerminalEvent};
pub use geometry::{Point, Rect, Size, Thickness};
pub use node::{InitState, LayoutStyle, NodeId, View};
pub use pos::Pos;
pub use router::{MouseContext, MouseHandler, MouseInput};
pub use runtime::{
    log_to_file, AppHandle, AppOptions, AppRequest, Application, OutputTarget, ProgramError,
};
pub use testing::TestApp;
pub use tree::ViewTree;
