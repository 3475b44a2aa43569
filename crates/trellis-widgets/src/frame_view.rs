//! A bordered, titled container.
//!
//! The border lives in a one-cell padding, so children are laid out and
//! clipped inside it. The border turns cyan while the focus chain passes
//! through the frame and dark gray otherwise.

use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};
use trellis_core::{NodeId, Painter, RenderContext, Thickness, View, ViewTree};

/// Build the frame's border block for the given focus state.
pub fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    Block::new()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color))
}

/// Builder for a frame view node.
///
/// Position and size default to filling the parent; set them on the
/// returned node like any other view.
pub struct FrameView {
    name: String,
    title: String,
}

impl FrameView {
    /// A frame titled `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            name: "frame".to_string(),
            title: title.into(),
        }
    }

    /// Node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Insert the node (detached).
    pub fn insert(self, tree: &mut ViewTree) -> NodeId {
        let title = self.title;
        tree.insert(
            View::new(self.name)
                .padding(Thickness::uniform(1))
                .render(move |cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                    p.render_widget(focus_block(&title, cx.focused), cx.area);
                }),
        )
    }
}
