//! Key chords and per-scope key binding tables.
//!
//! A [`KeyBindings`] table maps a [`KeyChord`] to an ordered, non-empty list of
//! abstract [`Command`]s. Every node owns one table; the [`ViewTree`] owns one
//! more at application scope, consulted after the focused node and all of its
//! ancestors have declined a key.
//!
//! [`ViewTree`]: crate::tree::ViewTree

use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::command::Command;
use crate::error::{Error, Result};

/// A single key press with its modifier mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// The base key code.
    pub code: KeyCode,
    /// Modifiers that must be held, matched exactly.
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    /// A chord with no modifiers.
    pub fn new(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::NONE)
    }

    /// A chord with the Ctrl modifier.
    pub fn ctrl(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::CONTROL)
    }

    /// A chord with the Alt modifier.
    pub fn alt(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::ALT)
    }

    /// A chord with the Shift modifier.
    pub fn shift(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::SHIFT)
    }

    /// A chord with an explicit modifier set.
    ///
    /// Shift is dropped for character keys, whose case already encodes it,
    /// so `Shift+'A'` and `'A'` are the same chord.
    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self { code, modifiers }
    }
}

impl From<KeyEvent> for KeyChord {
    fn from(event: KeyEvent) -> Self {
        KeyChord::with_modifiers(event.code, event.modifiers)
    }
}

impl From<KeyCode> for KeyChord {
    fn from(code: KeyCode) -> Self {
        KeyChord::new(code)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Chord-to-commands table for one scope.
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    map: HashMap<KeyChord, Vec<Command>>,
}

impl KeyBindings {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The application-scope defaults: Tab / Shift+Tab move focus.
    pub fn application_defaults() -> Self {
        let mut map = HashMap::new();
        map.insert(KeyChord::new(KeyCode::Tab), vec![Command::NextView]);
        map.insert(KeyChord::new(KeyCode::BackTab), vec![Command::PreviousView]);
        map.insert(KeyChord::shift(KeyCode::BackTab), vec![Command::PreviousView]);
        Self { map }
    }

    /// Bind `chord` to `commands`, replacing any previous binding entirely.
    ///
    /// An empty command list is rejected with [`Error::InvalidBinding`] and
    /// leaves the table untouched.
    pub fn bind(
        &mut self,
        chord: impl Into<KeyChord>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<()> {
        let chord = chord.into();
        let commands: Vec<Command> = commands.into_iter().collect();
        if commands.is_empty() {
            return Err(Error::InvalidBinding { chord });
        }
        self.map.insert(chord, commands);
        Ok(())
    }

    /// Commands bound to `chord`, or an empty slice.
    pub fn commands(&self, chord: &KeyChord) -> &[Command] {
        self.map.get(chord).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove the binding for `chord`, returning what was bound.
    pub fn unbind(&mut self, chord: &KeyChord) -> Option<Vec<Command>> {
        self.map.remove(chord)
    }

    /// Every chord whose sequence contains `command`, for help displays.
    pub fn chords_for(&self, command: Command) -> Vec<KeyChord> {
        let mut chords: Vec<KeyChord> = self
            .map
            .iter()
            .filter(|(_, cmds)| cmds.contains(&command))
            .map(|(chord, _)| *chord)
            .collect();
        chords.sort_by_key(|c| c.to_string());
        chords
    }

    /// Number of bound chords.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyChord, &[Command])> {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_lookup() {
        let mut kb = KeyBindings::new();
        kb.bind(KeyCode::Enter, [Command::Accept]).unwrap();
        assert_eq!(kb.commands(&KeyChord::new(KeyCode::Enter)), &[Command::Accept]);
        assert!(kb.commands(&KeyChord::new(KeyCode::Esc)).is_empty());
    }

    #[test]
    fn rebinding_replaces_without_merge() {
        let mut kb = KeyBindings::new();
        kb.bind(KeyCode::Enter, [Command::Accept, Command::Toggle])
            .unwrap();
        kb.bind(KeyCode::Enter, [Command::Cancel]).unwrap();
        assert_eq!(kb.commands(&KeyChord::new(KeyCode::Enter)), &[Command::Cancel]);
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn empty_sequence_is_rejected_and_not_stored() {
        let mut kb = KeyBindings::new();
        kb.bind(KeyCode::Enter, [Command::Accept]).unwrap();
        let err = kb.bind(KeyCode::Enter, []).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidBinding {
                chord: KeyChord::new(KeyCode::Enter)
            }
        );
        // Prior binding survives the rejected call.
        assert_eq!(kb.commands(&KeyChord::new(KeyCode::Enter)), &[Command::Accept]);
    }

    #[test]
    fn unbind_removes() {
        let mut kb = KeyBindings::new();
        kb.bind(KeyChord::ctrl(KeyCode::Char('s')), [Command::Custom("save")])
            .unwrap();
        let removed = kb.unbind(&KeyChord::ctrl(KeyCode::Char('s')));
        assert_eq!(removed, Some(vec![Command::Custom("save")]));
        assert!(kb.is_empty());
    }

    #[test]
    fn modifiers_match_exactly() {
        let mut kb = KeyBindings::new();
        kb.bind(KeyChord::ctrl(KeyCode::Char('x')), [Command::Cancel])
            .unwrap();
        assert!(kb.commands(&KeyChord::new(KeyCode::Char('x'))).is_empty());
        assert!(kb
            .commands(&KeyChord::with_modifiers(
                KeyCode::Char('x'),
                KeyModifiers::CONTROL | KeyModifiers::ALT
            ))
            .is_empty());
    }

    #[test]
    fn shift_is_folded_into_char_case() {
        let ev = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(KeyChord::from(ev), KeyChord::new(KeyCode::Char('A')));
        let tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(KeyChord::from(tab).modifiers, KeyModifiers::SHIFT);
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(KeyChord::ctrl(KeyCode::Char('q')).to_string(), "Ctrl+q");
        assert_eq!(KeyChord::new(KeyCode::Char(' ')).to_string(), "Space");
        assert_eq!(KeyChord::new(KeyCode::Enter).to_string(), "Enter");
    }

    #[test]
    fn chords_for_finds_all_triggers() {
        let kb = KeyBindings::application_defaults();
        assert_eq!(kb.chords_for(Command::NextView), vec![KeyChord::new(KeyCode::Tab)]);
        assert_eq!(kb.chords_for(Command::PreviousView).len(), 2);
    }
}
