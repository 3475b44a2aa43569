//! Construct any widget by kind.
//!
//! [`WidgetKind::ALL`] lists every kind and [`WidgetKind::create`] matches
//! exhaustively, so adding a widget without a constructor fails to compile.

use std::fmt;
use std::str::FromStr;

use trellis_core::{NodeId, Result, ViewTree};

use crate::button::Button;
use crate::checkbox::Checkbox;
use crate::frame_view::FrameView;
use crate::label::Label;
use crate::status_bar::StatusBar;

/// Every widget this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Label,
    Button,
    Checkbox,
    StatusBar,
    FrameView,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 5] = [
        WidgetKind::Label,
        WidgetKind::Button,
        WidgetKind::Checkbox,
        WidgetKind::StatusBar,
        WidgetKind::FrameView,
    ];

    /// Stable lowercase tag, e.g. `"status-bar"`.
    pub fn tag(self) -> &'static str {
        match self {
            WidgetKind::Label => "label",
            WidgetKind::Button => "button",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::StatusBar => "status-bar",
            WidgetKind::FrameView => "frame",
        }
    }

    /// Look a kind up by its tag.
    pub fn from_tag(tag: &str) -> Option<WidgetKind> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Insert a default-configured, detached instance named after the tag.
    pub fn create(self, tree: &mut ViewTree) -> Result<NodeId> {
        let name = self.tag();
        let id = match self {
            WidgetKind::Label => Label::new(name).name(name).insert(tree).id(),
            WidgetKind::Button => Button::new(name).name(name).insert(tree)?,
            WidgetKind::Checkbox => Checkbox::new(name).name(name).insert(tree)?.id(),
            WidgetKind::StatusBar => StatusBar::new().name(name).insert(tree).id(),
            WidgetKind::FrameView => FrameView::new(name).name(name).insert(tree),
        };
        Ok(id)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when parsing an unknown widget tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown widget kind `{0}`")]
pub struct UnknownWidget(pub String);

impl FromStr for WidgetKind {
    type Err = UnknownWidget;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownWidget(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use trellis_core::TestApp;

    #[test]
    fn every_kind_constructs_attaches_and_draws() {
        let mut app = TestApp::new(40, 10);
        let root = app.tree().root();
        for kind in WidgetKind::ALL {
            let id = kind.create(app.tree_mut()).unwrap();
            assert_eq!(app.tree().name(id), Some(kind.tag()));
            app.tree_mut().add(root, id).unwrap();
            assert!(app.tree().is_initialized(id), "{kind} not initialized");
        }
        app.render().unwrap();
        assert_eq!(app.tree().children(root).len(), WidgetKind::ALL.len());
    }

    #[test]
    fn tags_are_unique_and_round_trip() {
        let tags: HashSet<_> = WidgetKind::ALL.iter().map(|k| k.tag()).collect();
        assert_eq!(tags.len(), WidgetKind::ALL.len());
        for kind in WidgetKind::ALL {
            assert_eq!(kind.tag().parse::<WidgetKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(WidgetKind::from_tag("slider"), None);
        let err = "slider".parse::<WidgetKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown widget kind `slider`");
    }
}
