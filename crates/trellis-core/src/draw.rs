//! Redraw and clipping.
//!
//! Drawing walks the tree in z-order (children in insertion order, parents
//! before children). Each node paints through a [`Painter`] that drops every
//! cell outside the node's effective clip: the intersection of the proposed
//! clip, the node's own Frame and each ancestor's content area. A node whose
//! effective clip is empty is skipped together with its whole subtree without
//! invoking any paint strategy.
//!
//! Painter coordinates are relative to the node's Frame origin, so borders
//! drawn in the padding area sit at row 0 / column 0 and content starts at
//! [`RenderContext::content`].

use ratatui::buffer::Buffer;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use tracing::trace;
use unicode_width::UnicodeWidthChar;

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::node::NodeId;
use crate::tree::ViewTree;

/// A node's paint strategy.
///
/// Any `FnMut(&RenderContext, &mut Painter)` closure implements it.
pub trait Render {
    /// Paint the node. Called at most once per draw, only when the effective
    /// clip is non-empty.
    fn render(&mut self, cx: &RenderContext<'_>, painter: &mut Painter<'_>);
}

impl<F> Render for F
where
    F: FnMut(&RenderContext<'_>, &mut Painter<'_>),
{
    fn render(&mut self, cx: &RenderContext<'_>, painter: &mut Painter<'_>) {
        self(cx, painter)
    }
}

/// What a paint strategy knows about the node being drawn.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The node being painted.
    pub node: NodeId,
    /// The node's logical name.
    pub name: &'a str,
    /// The whole Frame, in painter coordinates (origin 0,0).
    pub area: Rect,
    /// The content (Bounds) area inside the padding, in painter coordinates.
    pub content: Rect,
    /// The effective clip, in painter coordinates.
    pub clip: Rect,
    /// Whether the node is on the focus chain.
    pub focused: bool,
}

/// Clipped cell writer handed to paint strategies.
pub struct Painter<'b> {
    buf: &'b mut Buffer,
    origin: Point,
    clip: Rect,
}

impl<'b> Painter<'b> {
    /// A painter whose local (0,0) sits at `origin` on the screen and which
    /// never writes outside `clip` (screen coordinates) or the buffer.
    pub fn new(buf: &'b mut Buffer, origin: Point, clip: Rect) -> Self {
        let clip = clip.intersection(&Rect::from(buf.area));
        Self { buf, origin, clip }
    }

    /// The writable region in local coordinates.
    pub fn clip(&self) -> Rect {
        self.clip.offset(Point::new(-self.origin.x, -self.origin.y))
    }

    fn screen(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        let p = Point::new(x, y) + self.origin;
        if self.clip.contains(p) {
            Some((p.x as u16, p.y as u16))
        } else {
            None
        }
    }

    /// Write one character. Returns whether the cell was inside the clip.
    pub fn set_char(&mut self, x: i32, y: i32, ch: char, style: Style) -> bool {
        let Some(pos) = self.screen(x, y) else {
            return false;
        };
        match self.buf.cell_mut(pos) {
            Some(cell) => {
                cell.set_char(ch).set_style(style);
                true
            }
            None => false,
        }
    }

    /// Write a string starting at `(x, y)`, advancing by each character's
    /// display width. Wide characters are only written when both cells are
    /// inside the clip. Returns the number of columns advanced.
    pub fn set_str(&mut self, x: i32, y: i32, text: &str, style: Style) -> i32 {
        let mut col = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0) as i32;
            if width == 0 {
                continue;
            }
            let fits = (0..width).all(|dx| self.screen(col + dx, y).is_some());
            if fits {
                self.set_char(col, y, ch, style);
                for dx in 1..width {
                    if let Some(pos) = self.screen(col + dx, y) {
                        if let Some(cell) = self.buf.cell_mut(pos) {
                            cell.reset();
                            cell.set_symbol("");
                        }
                    }
                }
            }
            col += width;
        }
        col - x
    }

    /// Fill `area` (local coordinates) with `ch`.
    pub fn fill(&mut self, area: Rect, ch: char, style: Style) {
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set_char(x, y, ch, style);
            }
        }
    }

    /// Patch the style of every cell in `area` without touching symbols.
    pub fn set_style(&mut self, area: Rect, style: Style) {
        let screen = area.offset(self.origin).intersection(&self.clip);
        for y in screen.y..screen.bottom() {
            for x in screen.x..screen.right() {
                if let Some(cell) = self.buf.cell_mut((x as u16, y as u16)) {
                    cell.set_style(style);
                }
            }
        }
    }

    /// Render any ratatui widget into `area` (local coordinates), keeping
    /// only the cells inside the clip.
    ///
    /// The widget draws into a scratch buffer the size of `area`, seeded
    /// with what is already on screen, and the visible part is copied back.
    pub fn render_widget<W: Widget>(&mut self, widget: W, area: Rect) {
        let screen_area = area.offset(self.origin);
        let visible = screen_area.intersection(&self.clip);
        if visible.is_empty() {
            return;
        }
        let Some(scratch_area) = Rect::from_size(area.size()).to_buffer_rect() else {
            return;
        };
        let mut scratch = Buffer::empty(scratch_area);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                let local = (
                    (x - screen_area.x) as u16,
                    (y - screen_area.y) as u16,
                );
                if let (Some(src), Some(dst)) =
                    (self.buf.cell((x as u16, y as u16)), scratch.cell_mut(local))
                {
                    *dst = src.clone();
                }
            }
        }
        widget.render(scratch_area, &mut scratch);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                let local = (
                    (x - screen_area.x) as u16,
                    (y - screen_area.y) as u16,
                );
                if let (Some(src), Some(dst)) =
                    (scratch.cell(local), self.buf.cell_mut((x as u16, y as u16)))
                {
                    *dst = src.clone();
                }
            }
        }
    }
}

impl ViewTree {
    /// Draw the whole tree into `buf`, clipped to the buffer's area, and
    /// clear the redraw flag.
    pub fn draw(&mut self, buf: &mut Buffer) -> Result<()> {
        let root = self.root;
        self.draw_view(root, buf, Rect::from(buf.area))?;
        self.needs_redraw = false;
        Ok(())
    }

    /// Draw the subtree at `id` with `proposed_clip` in screen coordinates.
    ///
    /// The clip is first narrowed by every ancestor's content area. Hidden
    /// nodes (or nodes under a hidden ancestor) draw nothing.
    pub fn draw_view(&mut self, id: NodeId, buf: &mut Buffer, proposed_clip: Rect) -> Result<()> {
        self.node(id)?;
        if !self.is_effectively_visible(id) {
            return Ok(());
        }
        let mut clip = proposed_clip;
        for ancestor in self.ancestors(id).into_iter().skip(1) {
            if let Some(content) = self.content_screen_rect(ancestor) {
                clip = clip.intersection(&content);
            }
        }
        let parent_origin = match self.nodes[id].parent {
            Some(parent) => self.content_origin(parent).unwrap_or_default(),
            None => Point::default(),
        };
        self.paint(id, buf, clip, parent_origin);
        Ok(())
    }

    fn content_screen_rect(&self, id: NodeId) -> Option<Rect> {
        let frame = self.screen_frame(id)?;
        Some(frame.inset(self.nodes[id].padding))
    }

    fn paint(&mut self, id: NodeId, buf: &mut Buffer, clip: Rect, parent_origin: Point) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let frame = node.frame.offset(parent_origin);
        let effective = clip.intersection(&frame);
        if effective.is_empty() {
            return;
        }

        let offset = node.content_offset();
        let bounds = node.bounds();
        let local = Point::new(-frame.x, -frame.y);
        if let Some(renderer) = node.renderer.as_mut() {
            let cx = RenderContext {
                node: id,
                name: &node.name,
                area: Rect::from_size(frame.size()),
                content: bounds.offset(offset),
                clip: effective.offset(local),
                focused: node.has_focus,
            };
            trace!(node = ?id, name = %node.name, "paint");
            let mut painter = Painter::new(buf, frame.origin(), effective);
            renderer.render(&cx, &mut painter);
        }

        let content = frame.inset(node.padding);
        let child_clip = effective.intersection(&content);
        if child_clip.is_empty() {
            return;
        }
        let origin = frame.origin() + offset;
        let children = node.children.clone();
        for (i, child) in children.iter().enumerate() {
            let Some(area) = self
                .nodes
                .get(*child)
                .map(|n| child_clip.intersection(&n.frame.offset(origin)))
            else {
                continue;
            };
            if self.is_covered(&children[i + 1..], area, origin) {
                trace!(node = ?child, "covered by a later sibling");
                continue;
            }
            self.paint(*child, buf, child_clip, origin);
        }
    }

    // Whether a visible sibling drawn later hides all of `area`. Partial
    // overlap still paints.
    fn is_covered(&self, later: &[NodeId], area: Rect, origin: Point) -> bool {
        !area.is_empty()
            && later.iter().any(|sibling| {
                self.nodes.get(*sibling).is_some_and(|n| {
                    n.visible && n.is_initialized() && n.frame.offset(origin).contains_rect(&area)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Size, Thickness};
    use crate::node::View;
    use ratatui::widgets::{Block, Borders, Paragraph};
    use std::cell::Cell;
    use std::rc::Rc;

    fn buffer(w: u16, h: u16) -> Buffer {
        Buffer::empty(ratatui::layout::Rect::new(0, 0, w, h))
    }

    fn rows(buf: &Buffer) -> Vec<String> {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn filler(ch: char) -> impl FnMut(&RenderContext<'_>, &mut Painter<'_>) {
        move |cx, p| p.fill(cx.area, ch, Style::default())
    }

    fn counter(calls: &Rc<Cell<u32>>) -> impl FnMut(&RenderContext<'_>, &mut Painter<'_>) {
        let calls = calls.clone();
        move |_, _| calls.set(calls.get() + 1)
    }

    fn attach(tree: &mut ViewTree, parent: NodeId, view: View) -> NodeId {
        let id = tree.insert(view);
        tree.add(parent, id).unwrap();
        id
    }

    #[test]
    fn offscreen_subtree_gets_no_paint_calls() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let outer_calls = Rc::new(Cell::new(0));
        let inner_calls = Rc::new(Cell::new(0));
        let outer = attach(
            &mut tree,
            root,
            View::new("outer")
                .frame(Rect::new(50, 50, 5, 5))
                .render(counter(&outer_calls)),
        );
        let inner = tree.insert(
            View::new("inner")
                .frame(Rect::new(-50, -50, 3, 3))
                .render(counter(&inner_calls)),
        );
        tree.add(outer, inner).unwrap();
        tree.layout(Size::new(20, 10)).unwrap();

        let mut buf = buffer(20, 10);
        tree.draw(&mut buf).unwrap();
        assert_eq!(outer_calls.get(), 0);
        assert_eq!(inner_calls.get(), 0);
    }

    #[test]
    fn explicit_clip_outside_frame_skips_node() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let calls = Rc::new(Cell::new(0));
        let a = attach(
            &mut tree,
            root,
            View::new("a")
                .frame(Rect::new(0, 0, 4, 2))
                .render(counter(&calls)),
        );
        tree.layout(Size::new(10, 10)).unwrap();
        let mut buf = buffer(10, 10);
        tree.draw_view(a, &mut buf, Rect::new(6, 6, 2, 2)).unwrap();
        assert_eq!(calls.get(), 0);
        tree.draw_view(a, &mut buf, Rect::new(3, 1, 2, 2)).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn painting_is_clipped_to_frame() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        attach(
            &mut tree,
            root,
            View::new("a")
                .frame(Rect::new(1, 0, 3, 1))
                .render(|_: &RenderContext<'_>, p: &mut Painter<'_>| {
                    p.set_str(-1, 0, "abcdefg", Style::default());
                }),
        );
        tree.layout(Size::new(6, 1)).unwrap();
        let mut buf = buffer(6, 1);
        tree.draw(&mut buf).unwrap();
        assert_eq!(rows(&buf), vec![" bcd  "]);
    }

    #[test]
    fn children_draw_in_insertion_order() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        attach(&mut tree, root, View::new("a").frame(Rect::new(0, 0, 3, 1)).render(filler('a')));
        attach(&mut tree, root, View::new("b").frame(Rect::new(2, 0, 3, 1)).render(filler('b')));
        tree.layout(Size::new(5, 1)).unwrap();
        let mut buf = buffer(5, 1);
        tree.draw(&mut buf).unwrap();
        assert_eq!(rows(&buf), vec!["aabbb"]);
    }

    #[test]
    fn fully_covered_sibling_is_not_painted() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let below = Rc::new(Cell::new(0));
        let above = Rc::new(Cell::new(0));
        attach(&mut tree, root, View::new("a").frame(Rect::new(0, 0, 5, 5)).render(counter(&below)));
        attach(&mut tree, root, View::new("b").frame(Rect::new(0, 0, 5, 5)).render(counter(&above)));
        tree.layout(Size::new(8, 8)).unwrap();
        let mut buf = buffer(8, 8);
        tree.draw(&mut buf).unwrap();
        assert_eq!(below.get(), 0);
        assert_eq!(above.get(), 1);
    }

    #[test]
    fn clipped_remainder_covered_by_later_sibling_is_skipped() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let below = Rc::new(Cell::new(0));
        // Only the on-screen part of "a" matters; "b" covers all of it.
        attach(&mut tree, root, View::new("a").frame(Rect::new(-3, 0, 5, 1)).render(counter(&below)));
        attach(&mut tree, root, View::new("b").frame(Rect::new(0, 0, 3, 1)).render(filler('b')));
        tree.layout(Size::new(4, 1)).unwrap();
        let mut buf = buffer(4, 1);
        tree.draw(&mut buf).unwrap();
        assert_eq!(below.get(), 0);
        assert_eq!(rows(&buf), vec!["bbb "]);
    }

    #[test]
    fn hidden_later_sibling_does_not_cover() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        attach(&mut tree, root, View::new("a").frame(Rect::new(0, 0, 3, 1)).render(filler('a')));
        attach(
            &mut tree,
            root,
            View::new("b")
                .frame(Rect::new(0, 0, 3, 1))
                .visible(false)
                .render(filler('b')),
        );
        tree.layout(Size::new(3, 1)).unwrap();
        let mut buf = buffer(3, 1);
        tree.draw(&mut buf).unwrap();
        assert_eq!(rows(&buf), vec!["aaa"]);
    }

    #[test]
    fn children_are_clipped_to_parent_content() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let panel = attach(
            &mut tree,
            root,
            View::new("panel")
                .frame(Rect::new(0, 0, 5, 3))
                .padding(Thickness::uniform(1))
                .render(filler('#')),
        );
        attach(&mut tree, panel, View::new("wide").frame(Rect::new(-2, 0, 10, 1)).render(filler('x')));
        tree.layout(Size::new(6, 3)).unwrap();
        let mut buf = buffer(6, 3);
        tree.draw(&mut buf).unwrap();
        assert_eq!(rows(&buf), vec!["##### ", "#xxx# ", "##### "]);
    }

    #[test]
    fn hidden_nodes_and_their_children_are_skipped() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let calls = Rc::new(Cell::new(0));
        let hidden = attach(&mut tree, root, View::new("hidden").visible(false));
        attach(&mut tree, hidden, View::new("child").render(counter(&calls)));
        tree.layout(Size::new(4, 4)).unwrap();
        let mut buf = buffer(4, 4);
        tree.draw(&mut buf).unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn render_context_reports_content_and_clip() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let seen = Rc::new(Cell::new(None));
        let s = seen.clone();
        attach(
            &mut tree,
            root,
            View::new("a")
                .frame(Rect::new(-1, 0, 6, 4))
                .padding(Thickness::new(1, 1, 0, 0))
                .render(move |cx: &RenderContext<'_>, _: &mut Painter<'_>| {
                    s.set(Some((cx.area, cx.content, cx.clip)));
                }),
        );
        tree.layout(Size::new(10, 10)).unwrap();
        let mut buf = buffer(10, 10);
        tree.draw(&mut buf).unwrap();
        assert_eq!(
            seen.get(),
            Some((
                Rect::new(0, 0, 6, 4),
                Rect::new(1, 1, 5, 3),
                Rect::new(1, 0, 5, 4)
            ))
        );
    }

    #[test]
    fn ratatui_widgets_render_clipped() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        attach(
            &mut tree,
            root,
            View::new("boxed")
                .frame(Rect::new(0, 0, 6, 3))
                .render(|cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                    p.render_widget(Block::default().borders(Borders::ALL), cx.area);
                }),
        );
        tree.layout(Size::new(4, 3)).unwrap();
        let mut buf = buffer(4, 3);
        tree.draw(&mut buf).unwrap();
        assert_eq!(rows(&buf), vec!["┌───", "│   ", "└───"]);
    }

    #[test]
    fn widget_keeps_underlying_cells_it_does_not_touch() {
        let mut buf = buffer(4, 1);
        let mut p = Painter::new(&mut buf, Point::default(), Rect::new(0, 0, 4, 1));
        p.fill(Rect::new(0, 0, 4, 1), '.', Style::default());
        p.render_widget(Paragraph::new("hi"), Rect::new(1, 0, 2, 1));
        drop(p);
        assert_eq!(rows(&buf), vec![".hi."]);
    }

    #[test]
    fn wide_characters_need_both_cells() {
        let mut buf = buffer(3, 1);
        let mut p = Painter::new(&mut buf, Point::default(), Rect::new(0, 0, 3, 1));
        let advanced = p.set_str(0, 0, "a世界", Style::default());
        assert_eq!(advanced, 5);
        drop(p);
        assert_eq!(buf[(0, 0)].symbol(), "a");
        assert_eq!(buf[(1, 0)].symbol(), "世");
    }

    #[test]
    fn draw_clears_redraw_flag() {
        let mut tree = ViewTree::new();
        tree.layout(Size::new(2, 2)).unwrap();
        assert!(tree.needs_redraw());
        let mut buf = buffer(2, 2);
        tree.draw(&mut buf).unwrap();
        assert!(!tree.needs_redraw());
    }
}
