//! # Hello Example
//!
//! A small dialog demonstrating the trellis core:
//! - Positioning views with `Pos`/`Dim` expressions (centered frame, anchored
//!   buttons, a label sized by its own text)
//! - Focus traversal with `Tab` / `Shift+Tab` and mouse clicks
//! - Widgets reacting through command handlers
//! - A status bar pinned to the bottom row
//!
//! Run with: `cargo run --example hello`
//! Set `TRELLIS_LOG=/tmp/trellis.log` to write tracing output to a file.

use std::cell::Cell;
use std::rc::Rc;

use trellis::ratatui::style::{Color, Style};
use trellis::widgets::button::Button;
use trellis::widgets::checkbox::Checkbox;
use trellis::widgets::frame_view::FrameView;
use trellis::widgets::label::Label;
use trellis::widgets::status_bar::StatusBar;
use trellis::{AppOptions, Application, Command, Dim, Pos, ProgramError, ViewTree};

fn build() -> Result<ViewTree, ProgramError> {
    let mut tree = ViewTree::new();
    let root = tree.root();

    let dialog = FrameView::new(" Hello ").name("dialog").insert(&mut tree);
    tree.set_x(dialog, Pos::center())?;
    tree.set_y(dialog, Pos::center())?;
    tree.set_width(dialog, Dim::percent(50.0))?;
    tree.set_height(dialog, Dim::absolute(8))?;
    tree.add(root, dialog)?;

    let greeting = Label::new("Press the button.")
        .name("greeting")
        .insert(&mut tree);
    tree.set_x(greeting.id(), Pos::center())?;
    tree.add(dialog, greeting.id())?;

    let status = StatusBar::new()
        .left(" trellis")
        .right("Tab: next  Ctrl+Q: quit ")
        .style(Style::default().bg(Color::DarkGray))
        .insert(&mut tree);
    tree.add(root, status.id())?;

    let shout = Checkbox::new("Shout")
        .name("shout")
        .insert(&mut tree)?;
    tree.set_x(shout.id(), Pos::absolute(1))?;
    tree.set_y(shout.id(), Pos::bottom(greeting.id()) + 1)?;
    tree.add(dialog, shout.id())?;

    let clicks = Rc::new(Cell::new(0u32));
    let (label, flag, bar) = (greeting.clone(), shout.clone(), status.clone());
    let hello = Button::new("Hello")
        .name("hello")
        .on_accept(move |tree| {
            clicks.set(clicks.get() + 1);
            let text = if flag.is_checked() {
                "HELLO, WORLD!"
            } else {
                "Hello, world!"
            };
            label.set_text(tree, text);
            bar.set_center(tree, format!("clicked {} time(s)", clicks.get()));
        })
        .insert(&mut tree)?;
    tree.set_x(hello, Pos::absolute(1))?;
    tree.set_y(hello, Pos::anchor_end(0))?;
    tree.add(dialog, hello)?;

    let quit = Button::new("Quit")
        .name("quit")
        .on_accept(|tree| {
            tree.invoke_app_command(Command::Quit);
        })
        .insert(&mut tree)?;
    tree.set_x(quit, Pos::anchor_end(1))?;
    tree.set_y(quit, Pos::top(hello))?;
    tree.add(dialog, quit)?;

    Ok(tree)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ProgramError> {
    let tree = build()?;
    let options = AppOptions {
        mouse_capture: true,
        title: Some("trellis hello".to_string()),
        log_file: std::env::var_os("TRELLIS_LOG").map(Into::into),
        ..Default::default()
    };
    Application::with_options(tree, options)?.run().await?;
    Ok(())
}
