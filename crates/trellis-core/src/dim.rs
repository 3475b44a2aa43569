//! Symbolic width/height expressions.
//!
//! A [`Dim`] is stored on a node and re-evaluated on every layout pass. The
//! `Function` variant is deliberately uncached so a dimension can follow
//! runtime state such as the measured width of a label's text.
//!
//! ```
//! use trellis_core::dim::{Dim, Detached};
//! use trellis_core::node::NodeId;
//!
//! let width = Dim::percent(50.0) - 2;
//! let resolved = width.resolve(40, NodeId::default(), &mut Detached).unwrap();
//! assert_eq!(resolved, 18);
//! ```

use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::node::NodeId;

/// A no-argument callback evaluated at resolve time.
pub type IntFn = Rc<dyn Fn() -> i32>;

/// Access to other nodes' resolved Frames during expression evaluation.
///
/// The layout engine implements this over its per-pass state so referenced
/// siblings are resolved on demand.
pub trait FrameSource {
    /// Return the resolved Frame of `target`, as needed by `requester`.
    fn frame_of(&mut self, requester: NodeId, target: NodeId) -> Result<Rect>;
}

/// A [`FrameSource`] with no resolved frames at all.
///
/// Useful for evaluating expressions outside a layout pass: any
/// node reference fails with [`Error::LayoutOrder`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl FrameSource for Detached {
    fn frame_of(&mut self, requester: NodeId, target: NodeId) -> Result<Rect> {
        Err(Error::LayoutOrder {
            node: requester,
            target,
        })
    }
}

/// A width or height expression.
#[derive(Clone)]
pub enum Dim {
    /// Fixed size, clamped to `>= 0`.
    Absolute(i32),
    /// Percentage of the containing dimension, rounded and clamped to
    /// `[0, containing]`.
    Percent(f32),
    /// The containing dimension minus a margin, clamped to `>= 0`.
    Fill(i32),
    /// Evaluated fresh on every resolve.
    Function(IntFn),
    /// Same as `Fill(0)`.
    Center,
    /// Extend from the node's own position to the container's far edge,
    /// stopping `offset` cells short.
    AnchorEnd(i32),
    /// Another node's resolved width.
    Width(NodeId),
    /// Another node's resolved height.
    Height(NodeId),
    /// Sum of two expressions.
    Sum(Box<Dim>, Box<Dim>),
    /// Difference of two expressions.
    Difference(Box<Dim>, Box<Dim>),
}

impl Dim {
    /// A fixed size.
    pub fn absolute(n: i32) -> Self {
        Dim::Absolute(n)
    }

    /// A percentage of the container.
    pub fn percent(p: f32) -> Self {
        Dim::Percent(p)
    }

    /// Fill the container, leaving `margin` cells.
    pub fn fill(margin: i32) -> Self {
        Dim::Fill(margin)
    }

    /// Computed by `f` on each layout pass.
    pub fn function(f: impl Fn() -> i32 + 'static) -> Self {
        Dim::Function(Rc::new(f))
    }

    /// Run to the far edge of the container minus `offset`.
    pub fn anchor_end(offset: i32) -> Self {
        Dim::AnchorEnd(offset)
    }

    /// Track another node's width.
    pub fn width_of(node: NodeId) -> Self {
        Dim::Width(node)
    }

    /// Track another node's height.
    pub fn height_of(node: NodeId) -> Self {
        Dim::Height(node)
    }

    /// Whether resolving needs the node's own position on the same axis.
    pub fn needs_position(&self) -> bool {
        match self {
            Dim::AnchorEnd(_) => true,
            Dim::Sum(a, b) | Dim::Difference(a, b) => a.needs_position() || b.needs_position(),
            _ => false,
        }
    }

    /// Resolve against `containing`, treating the node's own position as 0.
    pub fn resolve(
        &self,
        containing: i32,
        node: NodeId,
        frames: &mut dyn FrameSource,
    ) -> Result<i32> {
        self.resolve_at(containing, 0, node, frames)
    }

    /// Resolve against `containing` for a node sitting at `position`.
    ///
    /// The final result is clamped to `>= 0`; operands of compound expressions
    /// are combined before clamping.
    pub fn resolve_at(
        &self,
        containing: i32,
        position: i32,
        node: NodeId,
        frames: &mut dyn FrameSource,
    ) -> Result<i32> {
        if containing < 0 {
            return Err(Error::InvalidGeometry {
                dimension: containing,
            });
        }
        Ok(self.eval(containing, position, node, frames)?.max(0))
    }

    fn eval(
        &self,
        containing: i32,
        position: i32,
        node: NodeId,
        frames: &mut dyn FrameSource,
    ) -> Result<i32> {
        let value = match self {
            Dim::Absolute(n) => (*n).max(0),
            Dim::Percent(p) => percent_of(containing, *p),
            Dim::Fill(margin) => containing.saturating_sub(*margin).max(0),
            Dim::Function(f) => f(),
            Dim::Center => containing,
            Dim::AnchorEnd(offset) => containing
                .saturating_sub(position)
                .saturating_sub(*offset)
                .max(0),
            Dim::Width(target) => frames.frame_of(node, *target)?.width,
            Dim::Height(target) => frames.frame_of(node, *target)?.height,
            Dim::Sum(a, b) => {
                let a = a.eval(containing, position, node, frames)?;
                a.saturating_add(b.eval(containing, position, node, frames)?)
            }
            Dim::Difference(a, b) => {
                let a = a.eval(containing, position, node, frames)?;
                a.saturating_sub(b.eval(containing, position, node, frames)?)
            }
        };
        Ok(value)
    }
}

/// `round(containing * p / 100)`, clamped to `[0, containing]`.
pub(crate) fn percent_of(containing: i32, p: f32) -> i32 {
    let raw = (f64::from(containing) * f64::from(p) / 100.0).round();
    (raw as i32).clamp(0, containing.max(0))
}

impl fmt::Debug for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Absolute(n) => write!(f, "Absolute({n})"),
            Dim::Percent(p) => write!(f, "Percent({p})"),
            Dim::Fill(m) => write!(f, "Fill({m})"),
            Dim::Function(_) => f.write_str("Function(..)"),
            Dim::Center => f.write_str("Center"),
            Dim::AnchorEnd(o) => write!(f, "AnchorEnd({o})"),
            Dim::Width(id) => write!(f, "Width({id:?})"),
            Dim::Height(id) => write!(f, "Height({id:?})"),
            Dim::Sum(a, b) => write!(f, "({a:?} + {b:?})"),
            Dim::Difference(a, b) => write!(f, "({a:?} - {b:?})"),
        }
    }
}

impl From<i32> for Dim {
    fn from(n: i32) -> Self {
        Dim::Absolute(n)
    }
}

impl Add for Dim {
    type Output = Dim;

    fn add(self, rhs: Dim) -> Dim {
        Dim::Sum(Box::new(self), Box::new(rhs))
    }
}

impl Sub for Dim {
    type Output = Dim;

    fn sub(self, rhs: Dim) -> Dim {
        Dim::Difference(Box::new(self), Box::new(rhs))
    }
}

impl Add<i32> for Dim {
    type Output = Dim;

    fn add(self, rhs: i32) -> Dim {
        self + Dim::Absolute(rhs)
    }
}

impl Sub<i32> for Dim {
    type Output = Dim;

    fn sub(self, rhs: i32) -> Dim {
        self - Dim::Absolute(rhs)
    }
}
