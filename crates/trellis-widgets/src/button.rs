//! A focusable push button.
//!
//! `Enter` and `Space` are bound to [`Command::Accept`] in the button's own
//! table, and a left-click on the button runs the same command, so keyboard
//! and mouse activation share one handler.

use std::rc::Rc;

use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::style::{Modifier, Style};
use trellis_core::{
    Command, Dim, MouseContext, NodeId, Outcome, Painter, RenderContext, Result, View, ViewTree,
};

use crate::text::{display_width, sanitize};

type AcceptFn = Rc<dyn Fn(&mut ViewTree)>;

/// Builder for a button node, drawn as `[ text ]`.
///
/// # Example
///
/// ```ignore
/// use trellis_widgets::button::Button;
///
/// let ok = Button::new("OK")
///     .on_accept(|tree| tree.request_redraw())
///     .insert(&mut tree)?;
/// ```
pub struct Button {
    name: String,
    text: String,
    style: Style,
    focus_style: Style,
    on_accept: Option<AcceptFn>,
}

impl Button {
    /// A button labelled `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: "button".to_string(),
            text: sanitize(&text.into()),
            style: Style::default(),
            focus_style: Style::default().add_modifier(Modifier::REVERSED),
            on_accept: None,
        }
    }

    /// Node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Style when not focused.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Style while focused.
    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }

    /// Called each time the button is accepted.
    pub fn on_accept(mut self, f: impl Fn(&mut ViewTree) + 'static) -> Self {
        self.on_accept = Some(Rc::new(f));
        self
    }

    /// Insert the node (detached).
    pub fn insert(self, tree: &mut ViewTree) -> Result<NodeId> {
        let caption = format!("[ {} ]", self.text);
        let width = display_width(&caption);
        let (style, focus_style) = (self.style, self.focus_style);
        let on_accept = self.on_accept;

        let view = View::new(self.name)
            .width(Dim::absolute(width))
            .height(Dim::absolute(1))
            .can_focus(true)
            .bind(KeyCode::Enter, [Command::Accept])?
            .bind(KeyCode::Char(' '), [Command::Accept])?
            .on_command(Command::Accept, move |cx| {
                if let Some(f) = &on_accept {
                    f(cx.tree);
                }
                Outcome::Handled
            })
            .on_mouse(|cx: &mut MouseContext<'_>| {
                if cx.event.kind != MouseEventKind::Down(MouseButton::Left) {
                    return false;
                }
                cx.tree
                    .invoke_command(cx.node, Command::Accept)
                    .map(Outcome::is_handled)
                    .unwrap_or(false)
            })
            .render(move |cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                let style = if cx.focused { focus_style } else { style };
                p.set_str(0, 0, &caption, style);
            });
        Ok(tree.insert(view))
    }
}
