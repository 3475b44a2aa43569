//! Key and mouse routing.
//!
//! Keys start at the focused leaf (or the root when nothing is focused). Each
//! node on the way up consults only its *own* bindings; the first command
//! sequence with a `Handled` outcome consumes the key. Application-scope
//! bindings are tried last. Within a sequence, `NotApplicable` and
//! `NotHandled` both let the next command run.
//!
//! Mouse events go to exactly one node: the deepest visible node under the
//! pointer, searching topmost children first and honoring clipping. A press
//! on a focusable node focuses it before delivery. Mouse events never
//! bubble.

use std::rc::Rc;

use crossterm::event::{KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::trace;

use crate::binding::KeyChord;
use crate::command::{Command, CommandContext, CommandHandler, Outcome};
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::node::NodeId;
use crate::tree::ViewTree;

/// A mouse event translated into a node's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    /// What happened.
    pub kind: MouseEventKind,
    /// Pointer position relative to the node's Frame origin (the same space
    /// the node paints in).
    pub position: Point,
    /// Modifiers held during the event.
    pub modifiers: KeyModifiers,
}

/// Context handed to a node's mouse handler.
pub struct MouseContext<'a> {
    /// The whole tree.
    pub tree: &'a mut ViewTree,
    /// The node under the pointer.
    pub node: NodeId,
    /// The event in node-local coordinates.
    pub event: MouseInput,
}

/// A node's mouse handler. Returns whether it consumed the event.
pub type MouseHandler = Rc<dyn Fn(&mut MouseContext<'_>) -> bool>;

impl ViewTree {
    /// Route a key event. Returns whether anything consumed it.
    ///
    /// Release events are ignored. A panic inside a handler is not caught.
    pub fn route_key(&mut self, event: KeyEvent) -> bool {
        if event.kind == KeyEventKind::Release {
            return false;
        }
        let chord = KeyChord::from(event);
        let start = self.focused().unwrap_or(self.root);

        for id in self.ancestors(start) {
            let commands = match self.nodes.get(id) {
                Some(node) => node.bindings.commands(&chord).to_vec(),
                None => continue,
            };
            if commands.is_empty() {
                continue;
            }
            if self.run_sequence(id, &commands, Some(chord), false) {
                trace!(%chord, node = ?id, "key consumed");
                return true;
            }
        }

        let commands = self.app_bindings.commands(&chord).to_vec();
        if !commands.is_empty() && self.run_sequence(self.root, &commands, Some(chord), true) {
            trace!(%chord, "key consumed at application scope");
            return true;
        }
        trace!(%chord, "key not consumed");
        false
    }

    /// Run `command` against `id`'s own handler.
    ///
    /// A node without a handler for it reports `NotApplicable`.
    pub fn invoke_command(&mut self, id: NodeId, command: Command) -> Result<Outcome> {
        let handler = self.node(id)?.handlers.get(&command).cloned();
        Ok(self.call(handler, id, command, None))
    }

    /// Run an application-scope command handler directly.
    pub fn invoke_app_command(&mut self, command: Command) -> Outcome {
        let handler = self.app_handlers.get(&command).cloned();
        let root = self.root;
        self.call(handler, root, command, None)
    }

    fn run_sequence(
        &mut self,
        id: NodeId,
        commands: &[Command],
        chord: Option<KeyChord>,
        app_scope: bool,
    ) -> bool {
        for command in commands {
            let handler = if app_scope {
                self.app_handlers.get(command).cloned()
            } else {
                match self.nodes.get(id) {
                    Some(node) => node.handlers.get(command).cloned(),
                    None => return false,
                }
            };
            let outcome = self.call(handler, id, *command, chord);
            trace!(?command, node = ?id, ?outcome, "command dispatched");
            if outcome.is_handled() {
                return true;
            }
        }
        false
    }

    fn call(
        &mut self,
        handler: Option<CommandHandler>,
        node: NodeId,
        command: Command,
        chord: Option<KeyChord>,
    ) -> Outcome {
        let Some(handler) = handler else {
            return Outcome::NotApplicable;
        };
        let mut cx = CommandContext {
            tree: self,
            node,
            command,
            chord,
        };
        handler(&mut cx)
    }

    /// The deepest visible node under `point` (screen coordinates),
    /// searching topmost children first and respecting clipping.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        let screen = self.nodes[self.root].frame;
        self.hit(self.root, point, screen, Point::default())
    }

    fn hit(&self, id: NodeId, point: Point, clip: Rect, parent_origin: Point) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        if !node.visible || !node.is_initialized() {
            return None;
        }
        let frame = node.frame.offset(parent_origin);
        let effective = clip.intersection(&frame);
        if !effective.contains(point) {
            return None;
        }
        let child_clip = effective.intersection(&frame.inset(node.padding));
        let origin = frame.origin() + node.content_offset();
        node.children
            .iter()
            .rev()
            .find_map(|child| self.hit(*child, point, child_clip, origin))
            .or(Some(id))
    }

    /// Route a mouse event. Returns whether it was consumed (or moved
    /// focus).
    pub fn route_mouse(&mut self, event: MouseEvent) -> bool {
        let point = Point::new(i32::from(event.column), i32::from(event.row));
        let Some(target) = self.hit_test(point) else {
            return false;
        };

        let mut focused = false;
        if matches!(event.kind, MouseEventKind::Down(_)) && self.focused() != Some(target) {
            focused = self.set_focus(target).unwrap_or(false);
        }

        let Some(handler) = self.nodes.get(target).and_then(|n| n.mouse.clone()) else {
            return focused;
        };
        let origin = self
            .screen_frame(target)
            .map(|f| f.origin())
            .unwrap_or_default();
        let mut cx = MouseContext {
            tree: self,
            node: target,
            event: MouseInput {
                kind: event.kind,
                position: point - origin,
                modifiers: event.modifiers,
            },
        };
        let consumed = handler(&mut cx);
        trace!(node = ?target, kind = ?event.kind, consumed, "mouse delivered");
        consumed || focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::node::View;
    use crossterm::event::{KeyCode, MouseButton};
    use std::cell::{Cell, RefCell};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(col: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: col,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn counting(count: &Rc<Cell<u32>>, outcome: Outcome) -> impl Fn(&mut CommandContext<'_>) -> Outcome {
        let count = count.clone();
        move |_| {
            count.set(count.get() + 1);
            outcome
        }
    }

    fn attach(tree: &mut ViewTree, parent: NodeId, view: View) -> NodeId {
        let id = tree.insert(view);
        tree.add(parent, id).unwrap();
        id
    }

    #[test]
    fn unbound_leaf_bubbles_to_parent_once() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let parent_calls = Rc::new(Cell::new(0));
        let leaf_calls = Rc::new(Cell::new(0));
        let parent = attach(
            &mut tree,
            root,
            View::new("parent")
                .bind(KeyCode::Enter, [Command::Accept])
                .unwrap()
                .on_command(Command::Accept, counting(&parent_calls, Outcome::Handled)),
        );
        let leaf = attach(
            &mut tree,
            parent,
            View::new("leaf")
                .can_focus(true)
                .on_command(Command::Accept, counting(&leaf_calls, Outcome::Handled)),
        );
        tree.set_focus(leaf).unwrap();

        assert!(tree.route_key(key(KeyCode::Enter)));
        assert_eq!(parent_calls.get(), 1);
        assert_eq!(leaf_calls.get(), 0);
    }

    #[test]
    fn sequence_falls_through_not_applicable_and_not_handled() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let second = Rc::new(Cell::new(0));
        let third = Rc::new(Cell::new(0));
        let leaf = attach(
            &mut tree,
            root,
            View::new("leaf")
                .can_focus(true)
                .bind(
                    KeyCode::Char('x'),
                    [Command::Custom("missing"), Command::Up, Command::Down],
                )
                .unwrap()
                .on_command(Command::Up, counting(&second, Outcome::NotHandled))
                .on_command(Command::Down, counting(&third, Outcome::Handled)),
        );
        tree.set_focus(leaf).unwrap();
        assert!(tree.route_key(key(KeyCode::Char('x'))));
        assert_eq!((second.get(), third.get()), (1, 1));
    }

    #[test]
    fn exhausted_sequence_bubbles_to_parent_bindings() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let parent_calls = Rc::new(Cell::new(0));
        let parent = attach(
            &mut tree,
            root,
            View::new("parent")
                .bind(KeyCode::Esc, [Command::Cancel])
                .unwrap()
                .on_command(Command::Cancel, counting(&parent_calls, Outcome::Handled)),
        );
        let leaf = attach(
            &mut tree,
            parent,
            View::new("leaf")
                .can_focus(true)
                .bind(KeyCode::Esc, [Command::Cancel])
                .unwrap(),
        );
        tree.set_focus(leaf).unwrap();
        assert!(tree.route_key(key(KeyCode::Esc)));
        assert_eq!(parent_calls.get(), 1);
    }

    #[test]
    fn parent_handlers_are_not_used_for_leaf_bindings() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let parent_calls = Rc::new(Cell::new(0));
        let parent = attach(
            &mut tree,
            root,
            View::new("parent")
                .on_command(Command::Accept, counting(&parent_calls, Outcome::Handled)),
        );
        let leaf = attach(
            &mut tree,
            parent,
            View::new("leaf")
                .can_focus(true)
                .bind(KeyCode::Enter, [Command::Accept])
                .unwrap(),
        );
        tree.set_focus(leaf).unwrap();
        assert!(!tree.route_key(key(KeyCode::Enter)));
        assert_eq!(parent_calls.get(), 0);
    }

    #[test]
    fn application_scope_is_last() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let app_calls = Rc::new(Cell::new(0));
        let node_calls = Rc::new(Cell::new(0));
        tree.bind_app(KeyCode::F(1), [Command::Custom("help")]).unwrap();
        tree.on_app_command(Command::Custom("help"), counting(&app_calls, Outcome::Handled));
        let leaf = attach(
            &mut tree,
            root,
            View::new("leaf").can_focus(true).bind(KeyCode::F(1), [Command::Custom("help")]).unwrap(),
        );
        tree.on_command(leaf, Command::Custom("help"), counting(&node_calls, Outcome::Handled))
            .unwrap();
        tree.set_focus(leaf).unwrap();

        assert!(tree.route_key(key(KeyCode::F(1))));
        assert_eq!((node_calls.get(), app_calls.get()), (1, 0));

        tree.unbind(leaf, &KeyChord::new(KeyCode::F(1))).unwrap();
        assert!(tree.route_key(key(KeyCode::F(1))));
        assert_eq!((node_calls.get(), app_calls.get()), (1, 1));
    }

    #[test]
    fn unbound_keys_are_not_consumed() {
        let mut tree = ViewTree::new();
        assert!(!tree.route_key(key(KeyCode::Char('z'))));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let calls = Rc::new(Cell::new(0));
        tree.bind(root, KeyCode::Enter, [Command::Accept]).unwrap();
        tree.on_command(root, Command::Accept, counting(&calls, Outcome::Handled))
            .unwrap();
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert!(!tree.route_key(release));
        assert!(tree.route_key(key(KeyCode::Enter)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn tab_moves_focus_through_default_bindings() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let a = attach(&mut tree, root, View::new("a").can_focus(true));
        let b = attach(&mut tree, root, View::new("b").can_focus(true));
        assert!(tree.route_key(key(KeyCode::Tab)));
        assert_eq!(tree.focused(), Some(a));
        assert!(tree.route_key(key(KeyCode::Tab)));
        assert_eq!(tree.focused(), Some(b));
        assert!(tree.route_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)));
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn handler_may_dispose_its_own_node() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let root_calls = Rc::new(Cell::new(0));
        tree.bind(root, KeyCode::Delete, [Command::Custom("close")]).unwrap();
        tree.on_command(root, Command::Custom("close"), counting(&root_calls, Outcome::Handled))
            .unwrap();
        let leaf = attach(
            &mut tree,
            root,
            View::new("leaf")
                .can_focus(true)
                .bind(KeyCode::Delete, [Command::Custom("close"), Command::Accept])
                .unwrap()
                .on_command(Command::Custom("close"), |cx| {
                    let node = cx.node;
                    cx.tree.dispose(node).unwrap();
                    Outcome::NotHandled
                }),
        );
        tree.set_focus(leaf).unwrap();
        assert!(tree.route_key(key(KeyCode::Delete)));
        assert!(tree.is_disposed(leaf));
        assert_eq!(root_calls.get(), 1);
    }

    #[test]
    #[should_panic(expected = "widget bug")]
    fn handler_panics_propagate() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        tree.bind(root, KeyCode::Enter, [Command::Accept]).unwrap();
        tree.on_command(root, Command::Accept, |_| panic!("widget bug"))
            .unwrap();
        tree.route_key(key(KeyCode::Enter));
    }

    #[test]
    fn invoke_command_reports_not_applicable() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        assert_eq!(
            tree.invoke_command(root, Command::Accept),
            Ok(Outcome::NotApplicable)
        );
        tree.on_command(root, Command::Accept, |_| Outcome::Handled)
            .unwrap();
        assert_eq!(tree.invoke_command(root, Command::Accept), Ok(Outcome::Handled));
    }

    #[test]
    fn mouse_goes_to_topmost_deepest_node_with_local_coordinates() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let bottom_seen = seen.clone();
        let top_seen = seen.clone();
        attach(
            &mut tree,
            root,
            View::new("bottom")
                .frame(Rect::new(0, 0, 10, 5))
                .on_mouse(move |cx| {
                    bottom_seen.borrow_mut().push(("bottom", cx.event.position));
                    true
                }),
        );
        attach(
            &mut tree,
            root,
            View::new("top")
                .frame(Rect::new(4, 2, 4, 2))
                .on_mouse(move |cx| {
                    top_seen.borrow_mut().push(("top", cx.event.position));
                    true
                }),
        );
        tree.layout(Size::new(20, 10)).unwrap();

        assert!(tree.route_mouse(click(5, 3)));
        assert!(tree.route_mouse(click(1, 1)));
        assert_eq!(
            seen.borrow().as_slice(),
            &[("top", Point::new(1, 1)), ("bottom", Point::new(1, 1))]
        );
    }

    #[test]
    fn mouse_respects_parent_clipping_and_does_not_bubble() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let parent_calls = Rc::new(Cell::new(0));
        let pc = parent_calls.clone();
        let parent = attach(
            &mut tree,
            root,
            View::new("parent")
                .frame(Rect::new(0, 0, 4, 4))
                .on_mouse(move |_| {
                    pc.set(pc.get() + 1);
                    true
                }),
        );
        let child = attach(&mut tree, parent, View::new("child").frame(Rect::new(2, 2, 10, 10)));
        tree.layout(Size::new(20, 20)).unwrap();

        assert_eq!(tree.hit_test(Point::new(3, 3)), Some(child));
        // Outside the parent: the child's overhang is clipped away.
        assert_eq!(tree.hit_test(Point::new(8, 8)), Some(root));
        // The child has no handler; nothing bubbles to the parent.
        assert!(!tree.route_mouse(click(3, 3)));
        assert_eq!(parent_calls.get(), 0);
    }

    #[test]
    fn press_focuses_focusable_target() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let a = attach(&mut tree, root, View::new("a").frame(Rect::new(0, 0, 3, 1)).can_focus(true));
        tree.layout(Size::new(10, 2)).unwrap();
        assert!(tree.route_mouse(click(1, 0)));
        assert_eq!(tree.focused(), Some(a));
        // Already focused, no handler: nothing left to consume it.
        assert!(!tree.route_mouse(click(1, 0)));
    }

    #[test]
    fn hidden_nodes_are_not_hit() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        attach(&mut tree, root, View::new("ghost").frame(Rect::new(0, 0, 5, 5)).visible(false));
        tree.layout(Size::new(10, 10)).unwrap();
        assert_eq!(tree.hit_test(Point::new(1, 1)), Some(root));
    }
}
