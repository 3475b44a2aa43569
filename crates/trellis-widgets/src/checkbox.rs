//! A focusable two-state checkbox, drawn as `[x] text` or `[ ] text`.

use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::style::{Modifier, Style};
use trellis_core::{
    Command, Dim, MouseContext, NodeId, Outcome, Painter, RenderContext, Result, View, ViewTree,
};

use crate::text::{display_width, sanitize};

type ToggleFn = Rc<dyn Fn(&mut ViewTree, bool)>;

/// Builder for a checkbox node.
pub struct Checkbox {
    name: String,
    text: String,
    checked: bool,
    style: Style,
    focus_style: Style,
    on_toggle: Option<ToggleFn>,
}

impl Checkbox {
    /// An unchecked checkbox labelled `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: "checkbox".to_string(),
            text: sanitize(&text.into()),
            checked: false,
            style: Style::default(),
            focus_style: Style::default().add_modifier(Modifier::REVERSED),
            on_toggle: None,
        }
    }

    /// Node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Initial state.
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
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

    /// Called with the new state after every toggle.
    pub fn on_toggle(mut self, f: impl Fn(&mut ViewTree, bool) + 'static) -> Self {
        self.on_toggle = Some(Rc::new(f));
        self
    }

    /// Insert the node (detached) and return a handle to it.
    ///
    /// `Space` is bound to [`Command::Toggle`]; a left-click toggles too.
    pub fn insert(self, tree: &mut ViewTree) -> Result<CheckboxHandle> {
        let checked = Rc::new(Cell::new(self.checked));
        let text = self.text;
        let width = 4 + display_width(&text);
        let (style, focus_style) = (self.style, self.focus_style);
        let on_toggle = self.on_toggle;

        let state = checked.clone();
        let shown = checked.clone();
        let view = View::new(self.name)
            .width(Dim::absolute(width))
            .height(Dim::absolute(1))
            .can_focus(true)
            .bind(KeyCode::Char(' '), [Command::Toggle])?
            .on_command(Command::Toggle, move |cx| {
                let now = !state.get();
                state.set(now);
                cx.tree.request_redraw();
                if let Some(f) = &on_toggle {
                    f(cx.tree, now);
                }
                Outcome::Handled
            })
            .on_mouse(|cx: &mut MouseContext<'_>| {
                if cx.event.kind != MouseEventKind::Down(MouseButton::Left) {
                    return false;
                }
                cx.tree
                    .invoke_command(cx.node, Command::Toggle)
                    .map(Outcome::is_handled)
                    .unwrap_or(false)
            })
            .render(move |cx: &RenderContext<'_>, p: &mut Painter<'_>| {
                let style = if cx.focused { focus_style } else { style };
                let mark = if shown.get() { "[x] " } else { "[ ] " };
                let col = p.set_str(0, 0, mark, style);
                p.set_str(col, 0, &text, style);
            });
        let id = tree.insert(view);
        Ok(CheckboxHandle { id, checked })
    }
}

/// Handle to an inserted checkbox.
#[derive(Clone)]
pub struct CheckboxHandle {
    id: NodeId,
    checked: Rc<Cell<bool>>,
}

impl CheckboxHandle {
    /// The checkbox's node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current state.
    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    /// Set the state without running the toggle callback.
    pub fn set_checked(&self, tree: &mut ViewTree, checked: bool) {
        if self.checked.replace(checked) != checked {
            tree.request_redraw();
        }
    }
}
