//! A three-section status line (left / center / right) pinned to the bottom
//! row of its parent.
//!
//! The node is laid out with `Y = anchor_end(0)`, `Width = fill(0)` and
//! `Height = 1`, so it follows terminal resizes without any host code.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use trellis_core::{Dim, NodeId, Painter, Pos, Rect, RenderContext, View, ViewTree};

#[derive(Default)]
struct Sections {
    left: Option<Line<'static>>,
    center: Option<Line<'static>>,
    right: Option<Line<'static>>,
}

/// Builder for a status bar node.
///
/// # Example
///
/// ```ignore
/// use trellis_widgets::status_bar::StatusBar;
/// use ratatui::style::{Style, Color};
///
/// let bar = StatusBar::new()
///     .left("main")
///     .center("trellis")
///     .right("Ctrl+Q quits")
///     .style(Style::default().bg(Color::DarkGray))
///     .insert(&mut tree);
/// ```
pub struct StatusBar {
    name: String,
    sections: Sections,
    style: Style,
}

impl StatusBar {
    /// An empty status bar.
    pub fn new() -> Self {
        Self {
            name: "status-bar".to_string(),
            sections: Sections::default(),
            style: Style::default(),
        }
    }

    /// Node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Left-aligned content.
    pub fn left(mut self, content: impl Into<Line<'static>>) -> Self {
        self.sections.left = Some(content.into());
        self
    }

    /// Centered content.
    pub fn center(mut self, content: impl Into<Line<'static>>) -> Self {
        self.sections.center = Some(content.into());
        self
    }

    /// Right-aligned content.
    pub fn right(mut self, content: impl Into<Line<'static>>) -> Self {
        self.sections.right = Some(content.into());
        self
    }

    /// Base style (background color, etc.) for the entire bar.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Insert the node (detached) and return a handle to it.
    pub fn insert(self, tree: &mut ViewTree) -> StatusBarHandle {
        let sections = Rc::new(RefCell::new(self.sections));
        let shown = sections.clone();
        let style = self.style;
        let id = tree.insert(
            View::new(self.name)
                .x(Pos::absolute(0))
                .y(Pos::anchor_end(0))
                .width(Dim::fill(0))
                .height(Dim::absolute(1))
                .render(move |cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                    render_sections(&shown.borrow(), style, cx.area, p);
                }),
        );
        StatusBarHandle { id, sections }
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

fn render_sections(sections: &Sections, style: Style, area: Rect, p: &mut Painter<'_>) {
    let Some(whole) = area.to_buffer_rect() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(whole);

    // Background first so gaps between sections carry the style.
    p.render_widget(Block::default().style(style), area);

    let placed = [
        (&sections.left, Alignment::Left, chunks[0]),
        (&sections.center, Alignment::Center, chunks[1]),
        (&sections.right, Alignment::Right, chunks[2]),
    ];
    for (line, alignment, chunk) in placed {
        if let Some(line) = line {
            let styled = line.clone().patch_style(style);
            p.render_widget(
                Paragraph::new(styled).alignment(alignment),
                Rect::from(chunk),
            );
        }
    }
}

/// Handle to an inserted status bar.
#[derive(Clone)]
pub struct StatusBarHandle {
    id: NodeId,
    sections: Rc<RefCell<Sections>>,
}

impl StatusBarHandle {
    /// The bar's node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Replace the left section.
    pub fn set_left(&self, tree: &mut ViewTree, content: impl Into<Line<'static>>) {
        self.sections.borrow_mut().left = Some(content.into());
        tree.request_redraw();
    }

    /// Replace the center section.
    pub fn set_center(&self, tree: &mut ViewTree, content: impl Into<Line<'static>>) {
        self.sections.borrow_mut().center = Some(content.into());
        tree.request_redraw();
    }

    /// Replace the right section.
    pub fn set_right(&self, tree: &mut ViewTree, content: impl Into<Line<'static>>) {
        self.sections.borrow_mut().right = Some(content.into());
        tree.request_redraw();
    }

    /// Empty all three sections.
    pub fn clear(&self, tree: &mut ViewTree) {
        *self.sections.borrow_mut() = Sections::default();
        tree.request_redraw();
    }
}
