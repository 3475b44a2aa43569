//! A single-row, non-focusable text label whose width follows its text.
//!
//! The width is a [`Dim::function`] over the shared text, so changing the
//! text with [`LabelHandle::set_text`] resizes the label on the next layout
//! pass with no other bookkeeping.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::style::Style;
use trellis_core::{Dim, NodeId, Painter, RenderContext, View, ViewTree};

use crate::text::{display_width, sanitize, truncate};

/// Builder for a label node.
///
/// # Example
///
/// ```ignore
/// use trellis_widgets::label::Label;
///
/// let title = Label::new("Settings").name("title").insert(&mut tree);
/// tree.add(tree.root(), title.id())?;
/// title.set_text(&mut tree, "Settings (modified)");
/// ```
pub struct Label {
    name: String,
    text: String,
    style: Style,
}

impl Label {
    /// A label showing `text`. Control characters are stripped.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: "label".to_string(),
            text: sanitize(&text.into()),
            style: Style::default(),
        }
    }

    /// Node name used by [`ViewTree::find`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Text style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Insert the node (detached) and return a handle to it.
    pub fn insert(self, tree: &mut ViewTree) -> LabelHandle {
        let text = Rc::new(RefCell::new(self.text));
        let measured = text.clone();
        let shown = text.clone();
        let style = self.style;
        let id = tree.insert(
            View::new(self.name)
                .width(Dim::function(move || display_width(&measured.borrow())))
                .height(Dim::absolute(1))
                .render(move |cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                    let text = shown.borrow();
                    let fitted = truncate(&text, cx.area.width, "…");
                    p.set_str(0, 0, &fitted, style);
                }),
        );
        LabelHandle { id, text }
    }
}

/// Handle to an inserted label.
#[derive(Clone)]
pub struct LabelHandle {
    id: NodeId,
    text: Rc<RefCell<String>>,
}

impl LabelHandle {
    /// The label's node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Replace the text and schedule a relayout.
    pub fn set_text(&self, tree: &mut ViewTree, text: impl Into<String>) {
        let text = sanitize(&text.into());
        if *self.text.borrow() == text {
            return;
        }
        *self.text.borrow_mut() = text;
        tree.request_layout(self.id);
        tree.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Pos, TestApp};

    #[test]
    fn width_follows_text() {
        let mut app = TestApp::new(20, 1);
        let label = Label::new("hello").insert(app.tree_mut());
        let root = app.tree().root();
        app.tree_mut().add(root, label.id()).unwrap();
        assert_eq!(app.render_string().unwrap(), "hello               ");
        assert_eq!(app.tree().frame(label.id()).unwrap().width, 5);

        label.set_text(app.tree_mut(), "hi there");
        assert!(app.tree().needs_layout(label.id()));
        assert_eq!(app.render_string().unwrap(), "hi there            ");
        assert_eq!(app.tree().frame(label.id()).unwrap().width, 8);
    }

    #[test]
    fn centered_label_recenters_after_text_change() {
        let mut app = TestApp::new(10, 1);
        let label = Label::new("ab").insert(app.tree_mut());
        app.tree_mut().set_x(label.id(), Pos::center()).unwrap();
        let root = app.tree().root();
        app.tree_mut().add(root, label.id()).unwrap();
        assert_eq!(app.render_string().unwrap(), "    ab    ");

        label.set_text(app.tree_mut(), "abcd");
        assert_eq!(app.render_string().unwrap(), "   abcd   ");
    }

    #[test]
    fn narrow_frame_truncates_with_ellipsis() {
        let mut app = TestApp::new(10, 1);
        let label = Label::new("overflowing").insert(app.tree_mut());
        app.tree_mut().set_width(label.id(), Dim::absolute(5)).unwrap();
        let root = app.tree().root();
        app.tree_mut().add(root, label.id()).unwrap();
        assert_eq!(app.render_string().unwrap(), "over…     ");
    }

    #[test]
    fn control_characters_are_stripped() {
        let mut tree = ViewTree::new();
        let label = Label::new("a\nb").insert(&mut tree);
        assert_eq!(label.text(), "ab");
    }

    #[test]
    fn labels_are_not_focusable() {
        let mut app = TestApp::new(10, 1);
        let label = Label::new("x").insert(app.tree_mut());
        let root = app.tree().root();
        app.tree_mut().add(root, label.id()).unwrap();
        app.layout().unwrap();
        assert!(!app.tree().is_focusable(label.id()));
    }
}
