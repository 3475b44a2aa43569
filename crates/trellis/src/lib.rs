//! **trellis** -- a constraint-layout TUI widget toolkit for [`ratatui`].
//!
//! This is the umbrella crate that re-exports everything you need to build a
//! trellis application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! trellis = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`trellis_core`] are available at the crate root
//!   ([`ViewTree`], [`View`], [`Pos`], [`Dim`], [`Command`], [`Application`],
//!   [`TestApp`], etc.).
//! * The [`widgets`] module re-exports everything from [`trellis_widgets`]
//!   (label, button, checkbox, status bar, frame view, registry).
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use trellis::widgets::button::Button;
//! use trellis::{Application, Command, Pos, ViewTree};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), trellis::ProgramError> {
//!     let mut tree = ViewTree::new();
//!     let quit = Button::new("Quit")
//!         .on_accept(|tree| {
//!             tree.invoke_app_command(Command::Quit);
//!         })
//!         .insert(&mut tree)?;
//!     tree.set_x(quit, Pos::center())?;
//!     tree.set_y(quit, Pos::center())?;
//!     let root = tree.root();
//!     tree.add(root, quit)?;
//!     Application::new(tree)?.run().await?;
//!     Ok(())
//! }
//! ```

pub use trellis_core::*;
pub mod widgets {
    pub use trellis_widgets::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
