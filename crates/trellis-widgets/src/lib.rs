//! Ready-made widgets for the **trellis** TUI toolkit.
//!
//! Every widget here is a plain [`trellis_core::View`] node with a paint
//! closure, key bindings and command handlers attached by composition. A
//! builder inserts the node detached; add it under any parent and position it
//! with the usual [`Pos`](trellis_core::Pos) / [`Dim`](trellis_core::Dim)
//! expressions.
//!
//! # Widgets
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`label`] | Single-row text whose width follows its content |
//! | [`button`] | Focusable push button (`Enter`, `Space`, click) |
//! | [`checkbox`] | Focusable two-state toggle |
//! | [`status_bar`] | Left / center / right status line on the bottom row |
//! | [`frame_view`] | Bordered, titled container |
//!
//! # Utilities
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`registry`] | [`WidgetKind`](registry::WidgetKind) tag to constructor table |
//! | [`text`] | Unicode-aware width, sanitizing and truncation |

pub mod button;
pub mod checkbox;
pub mod frame_view;
pub mod label;
pub mod registry;
pub mod status_bar;
pub mod text;
