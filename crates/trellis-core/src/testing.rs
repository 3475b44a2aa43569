use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::buffer::Buffer;

use crate::binding::KeyChord;
use crate::error::Result;
use crate::geometry::Size;
use crate::tree::ViewTree;

/// A headless harness that drives a [`ViewTree`] without a real terminal.
///
/// `TestApp` does what the host loop would: it lays out before every input
/// and draw, routes keys and mouse events, and renders into an in-memory
/// buffer. No tokio runtime or TTY is needed.
///
/// # Example
///
/// ```rust,ignore
/// use trellis_core::testing::TestApp;
/// use crossterm::event::KeyCode;
///
/// let mut app = TestApp::new(20, 3);
/// let button = trellis_widgets::button::Button::new("OK").insert(app.tree_mut())?;
/// let root = app.tree().root();
/// app.tree_mut().add(root, button)?;
/// app.press(KeyCode::Tab);                    // focus the button
/// assert!(app.press(KeyCode::Enter));         // accept it
/// assert!(app.render_string()?.contains("OK"));
/// ```
pub struct TestApp {
    tree: ViewTree,
    size: Size,
}

impl TestApp {
    /// A fresh tree on a `width` x `height` screen.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_tree(ViewTree::new(), width, height)
    }

    /// Drive an existing tree.
    pub fn with_tree(tree: ViewTree, width: u16, height: u16) -> Self {
        Self {
            tree,
            size: Size::new(i32::from(width), i32::from(height)),
        }
    }

    /// Shared access for assertions.
    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    /// Mutable access for arranging state.
    pub fn tree_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    /// Hand the tree back.
    pub fn into_tree(self) -> ViewTree {
        self.tree
    }

    /// Current screen size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the screen size; the next input or render lays out again.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = Size::new(i32::from(width), i32::from(height));
    }

    /// Force a full layout pass now.
    pub fn layout(&mut self) -> Result<()> {
        self.tree.layout(self.size)
    }

    /// Press a key with no modifiers. Returns whether it was consumed.
    pub fn press(&mut self, code: KeyCode) -> bool {
        self.press_chord(KeyChord::new(code))
    }

    /// Press a chord. Returns whether it was consumed.
    pub fn press_chord(&mut self, chord: KeyChord) -> bool {
        self.settle();
        self.tree
            .route_key(KeyEvent::new(chord.code, chord.modifiers))
    }

    /// Left-click at screen cell `(column, row)`. Returns whether it was
    /// consumed.
    pub fn click(&mut self, column: u16, row: u16) -> bool {
        self.settle();
        self.tree.route_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        })
    }

    /// Lay out if needed and draw into a fresh buffer.
    pub fn render(&mut self) -> Result<Buffer> {
        self.tree.layout_if_needed(self.size)?;
        let area = ratatui::layout::Rect::new(
            0,
            0,
            self.size.width.clamp(0, i32::from(u16::MAX)) as u16,
            self.size.height.clamp(0, i32::from(u16::MAX)) as u16,
        );
        let mut buf = Buffer::empty(area);
        self.tree.draw(&mut buf)?;
        Ok(buf)
    }

    /// Render and return the screen as text, rows separated by newlines.
    /// Trailing whitespace within each row is kept.
    pub fn render_string(&mut self) -> Result<String> {
        let buf = self.render()?;
        let area = buf.area;
        let mut output = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                output.push_str(buf[(x, y)].symbol());
            }
            if y + 1 < area.bottom() {
                output.push('\n');
            }
        }
        Ok(output)
    }

    // Input arrives between frames; a failing layout leaves the last good
    // frames in place, exactly as in the host loop.
    fn settle(&mut self) {
        if let Err(err) = self.tree.layout_if_needed(self.size) {
            tracing::warn!(error = %err, "layout failed before input");
        }
    }
}
