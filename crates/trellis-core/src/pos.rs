//! Symbolic x/y expressions.
//!
//! Positions resolve after the node's own size, so `Center` and `AnchorEnd`
//! can use it. Positions are never clamped: a negative result places the node
//! partly before its container's near edge.

use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;

use crate::dim::{percent_of, FrameSource, IntFn};
use crate::error::{Error, Result};
use crate::node::NodeId;

/// An x or y expression.
#[derive(Clone)]
pub enum Pos {
    /// Fixed offset from the container's near edge.
    Absolute(i32),
    /// `floor((containing - own) / 2)`.
    Center,
    /// `containing - own - offset`.
    AnchorEnd(i32),
    /// Percentage of the containing dimension.
    Percent(f32),
    /// Evaluated fresh on every resolve.
    Function(IntFn),
    /// Another node's left edge.
    Left(NodeId),
    /// Another node's top edge.
    Top(NodeId),
    /// Another node's right edge (exclusive).
    Right(NodeId),
    /// Another node's bottom edge (exclusive).
    Bottom(NodeId),
    /// Sum of two expressions.
    Sum(Box<Pos>, Box<Pos>),
    /// Difference of two expressions.
    Difference(Box<Pos>, Box<Pos>),
}

impl Pos {
    /// A fixed offset.
    pub fn absolute(n: i32) -> Self {
        Pos::Absolute(n)
    }

    /// Centered in the container.
    pub fn center() -> Self {
        Pos::Center
    }

    /// Against the container's far edge, `offset` cells in.
    pub fn anchor_end(offset: i32) -> Self {
        Pos::AnchorEnd(offset)
    }

    /// A percentage of the container.
    pub fn percent(p: f32) -> Self {
        Pos::Percent(p)
    }

    /// Computed by `f` on each layout pass.
    pub fn function(f: impl Fn() -> i32 + 'static) -> Self {
        Pos::Function(Rc::new(f))
    }

    /// Aligned with `node`'s left edge.
    pub fn left(node: NodeId) -> Self {
        Pos::Left(node)
    }

    /// Aligned with `node`'s top edge.
    pub fn top(node: NodeId) -> Self {
        Pos::Top(node)
    }

    /// Just past `node`'s right edge.
    pub fn right(node: NodeId) -> Self {
        Pos::Right(node)
    }

    /// Just past `node`'s bottom edge.
    pub fn bottom(node: NodeId) -> Self {
        Pos::Bottom(node)
    }

    /// Whether resolving needs the node's own size on the same axis.
    pub fn needs_own_size(&self) -> bool {
        match self {
            Pos::Center | Pos::AnchorEnd(_) => true,
            Pos::Sum(a, b) | Pos::Difference(a, b) => a.needs_own_size() || b.needs_own_size(),
            _ => false,
        }
    }

    /// Resolve against `containing` for a node whose size on this axis is
    /// `own`.
    pub fn resolve(
        &self,
        containing: i32,
        own: i32,
        node: NodeId,
        frames: &mut dyn FrameSource,
    ) -> Result<i32> {
        if containing < 0 {
            return Err(Error::InvalidGeometry {
                dimension: containing,
            });
        }
        self.eval(containing, own, node, frames)
    }

    fn eval(
        &self,
        containing: i32,
        own: i32,
        node: NodeId,
        frames: &mut dyn FrameSource,
    ) -> Result<i32> {
        let value = match self {
            Pos::Absolute(n) => *n,
            Pos::Center => containing.saturating_sub(own).div_euclid(2),
            Pos::AnchorEnd(offset) => containing.saturating_sub(own).saturating_sub(*offset),
            Pos::Percent(p) => percent_of(containing, *p),
            Pos::Function(f) => f(),
            Pos::Left(target) => frames.frame_of(node, *target)?.x,
            Pos::Top(target) => frames.frame_of(node, *target)?.y,
            Pos::Right(target) => frames.frame_of(node, *target)?.right(),
            Pos::Bottom(target) => frames.frame_of(node, *target)?.bottom(),
            Pos::Sum(a, b) => {
                let a = a.eval(containing, own, node, frames)?;
                a.saturating_add(b.eval(containing, own, node, frames)?)
            }
            Pos::Difference(a, b) => {
                let a = a.eval(containing, own, node, frames)?;
                a.saturating_sub(b.eval(containing, own, node, frames)?)
            }
        };
        Ok(value)
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pos::Absolute(n) => write!(f, "Absolute({n})"),
            Pos::Center => f.write_str("Center"),
            Pos::AnchorEnd(o) => write!(f, "AnchorEnd({o})"),
            Pos::Percent(p) => write!(f, "Percent({p})"),
            Pos::Function(_) => f.write_str("Function(..)"),
            Pos::Left(id) => write!(f, "Left({id:?})"),
            Pos::Top(id) => write!(f, "Top({id:?})"),
            Pos::Right(id) => write!(f, "Right({id:?})"),
            Pos::Bottom(id) => write!(f, "Bottom({id:?})"),
            Pos::Sum(a, b) => write!(f, "({a:?} + {b:?})"),
            Pos::Difference(a, b) => write!(f, "({a:?} - {b:?})"),
        }
    }
}

impl From<i32> for Pos {
    fn from(n: i32) -> Self {
        Pos::Absolute(n)
    }
}

impl Add for Pos {
    type Output = Pos;

    fn add(self, rhs: Pos) -> Pos {
        Pos::Sum(Box::new(self), Box::new(rhs))
    }
}

impl Sub for Pos {
    type Output = Pos;

    fn sub(self, rhs: Pos) -> Pos {
        Pos::Difference(Box::new(self), Box::new(rhs))
    }
}

impl Add<i32> for Pos {
    type Output = Pos;

    fn add(self, rhs: i32) -> Pos {
        self + Pos::Absolute(rhs)
    }
}

impl Sub<i32> for Pos {
    type Output = Pos;

    fn sub(self, rhs: i32) -> Pos {
        self - Pos::Absolute(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Detached;

    fn resolve(p: &Pos, containing: i32, own: i32) -> i32 {
        p.resolve(containing, own, NodeId::default(), &mut Detached)
            .unwrap()
    }

    #[test]
    fn absolute_is_not_clamped() {
        assert_eq!(resolve(&Pos::absolute(-3), 10, 2), -3);
    }

    #[test]
    fn center_floors() {
        assert_eq!(resolve(&Pos::center(), 30, 12), 9);
        assert_eq!(resolve(&Pos::center(), 11, 4), 3);
        // Larger than the container: floor, not truncation toward zero.
        assert_eq!(resolve(&Pos::center(), 4, 7), -2);
    }

    #[test]
    fn anchor_end_against_far_edge() {
        assert_eq!(resolve(&Pos::anchor_end(0), 30, 2), 28);
        assert_eq!(resolve(&Pos::anchor_end(3), 30, 2), 25);
    }

    #[test]
    fn anchor_end_minus_function() {
        let x = Pos::anchor_end(0) - Pos::function(|| 2);
        assert_eq!(resolve(&x, 30, 2), 26);
    }

    #[test]
    fn extreme_values_saturate() {
        assert_eq!(resolve(&Pos::anchor_end(i32::MIN), 10, 2), i32::MAX);
        assert_eq!(resolve(&(Pos::function(|| i32::MAX) + 1), 10, 2), i32::MAX);
        assert_eq!(resolve(&(Pos::function(|| i32::MIN) - 1), 10, 2), i32::MIN);
        assert_eq!(resolve(&Pos::center(), i32::MAX, -1), i32::MAX / 2);
    }

    #[test]
    fn percent_position() {
        assert_eq!(resolve(&Pos::percent(25.0), 80, 0), 20);
    }

    #[test]
    fn needs_own_size_sees_through_compounds() {
        assert!((Pos::absolute(1) + Pos::center()).needs_own_size());
        assert!(!(Pos::absolute(1) + 4).needs_own_size());
    }

    #[test]
    fn relative_reference_without_frames_is_order_error() {
        let err = Pos::right(NodeId::default())
            .resolve(10, 1, NodeId::default(), &mut Detached)
            .unwrap_err();
        assert!(matches!(err, Error::LayoutOrder { .. }));
    }
}
