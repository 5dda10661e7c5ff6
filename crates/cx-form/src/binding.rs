//! Element binding and interaction state
//!
//! Input elements bind to a path by id. The binding count decides whether a
//! path is connected; focus and blur reports drive its interaction flags.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::meta::MetaEntry;
use crate::summary::SummaryEntry;

/// Identifier of a bound input element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Focus history of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InteractionState {
    pub focused: bool,
    pub blurred: bool,
    pub touched: bool,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            focused: false,
            blurred: true,
            touched: false,
        }
    }
}

/// Handle returned by [`Form::register`](crate::Form::register)
///
/// Carries the value an input should display: the last raw value written
/// at the path, or the document value when nothing raw is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub path: String,
    pub value: Option<Value>,
}

/// Combined view of one path for rendering
///
/// Interaction flags are `None` while no element is connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub focused: Option<bool>,
    pub blurred: Option<bool>,
    pub touched: Option<bool>,
    pub original_value: Value,
    pub previous_value: Option<Value>,
    pub current_value: Value,
    pub pristine: bool,
    pub dirty: bool,
    pub meta: MetaEntry,
}

impl FieldState {
    pub(crate) fn compose(
        summary: SummaryEntry,
        meta: MetaEntry,
        interaction: Option<InteractionState>,
    ) -> Self {
        let interaction = if meta.is_connected {
            Some(interaction.unwrap_or_default())
        } else {
            None
        };
        Self {
            focused: interaction.map(|i| i.focused),
            blurred: interaction.map(|i| i.blurred),
            touched: interaction.map(|i| i.touched),
            original_value: summary.original_value,
            previous_value: summary.previous_value,
            current_value: summary.current_value,
            pristine: summary.pristine,
            dirty: summary.dirty,
            meta,
        }
    }
}

/// Element bindings and interaction state per path
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    elements: HashMap<String, BTreeSet<ElementId>>,
    interactions: HashMap<String, InteractionState>,
}

impl Bindings {
    /// Bind an element; `false` when it was already bound
    pub(crate) fn attach(&mut self, path: &str, id: ElementId) -> bool {
        let added = self.elements.entry(path.to_owned()).or_default().insert(id);
        if added {
            let state = self.interactions.entry(path.to_owned()).or_default();
            state.focused = false;
            state.blurred = true;
        }
        added
    }

    /// Unbind an element, returning how many remain bound
    pub(crate) fn detach(&mut self, path: &str, id: ElementId) -> usize {
        let Some(bound) = self.elements.get_mut(path) else {
            return 0;
        };
        bound.remove(&id);
        let remaining = bound.len();
        if remaining == 0 {
            self.elements.remove(path);
        }
        remaining
    }

    pub(crate) fn bound_count(&self, path: &str) -> usize {
        self.elements.get(path).map_or(0, BTreeSet::len)
    }

    /// Interaction state of a path with at least one bound element
    fn bound_interaction(&mut self, path: &str) -> Option<&mut InteractionState> {
        if self.bound_count(path) == 0 {
            return None;
        }
        Some(self.interactions.entry(path.to_owned()).or_default())
    }

    /// Record focus; unbound paths are ignored
    pub(crate) fn focus(&mut self, path: &str) {
        if let Some(state) = self.bound_interaction(path) {
            state.focused = true;
            state.blurred = false;
        }
    }

    /// Record blur, marking the path touched; unbound paths are ignored
    pub(crate) fn blur(&mut self, path: &str) {
        if let Some(state) = self.bound_interaction(path) {
            state.focused = false;
            state.blurred = true;
            state.touched = true;
        }
    }

    pub(crate) fn interaction(&self, path: &str) -> Option<InteractionState> {
        self.interactions.get(path).copied()
    }

    pub(crate) fn forget(&mut self, path: &str) {
        self.interactions.remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cx_schema::FormKey;

    #[test]
    fn attach_is_idempotent_per_element() {
        let mut bindings = Bindings::default();
        assert!(bindings.attach("name", ElementId(1)));
        assert!(!bindings.attach("name", ElementId(1)));
        assert!(bindings.attach("name", ElementId(2)));
        assert_eq!(bindings.bound_count("name"), 2);
    }

    #[test]
    fn detach_counts_remaining() {
        let mut bindings = Bindings::default();
        bindings.attach("name", ElementId(1));
        bindings.attach("name", ElementId(2));
        assert_eq!(bindings.detach("name", ElementId(1)), 1);
        assert_eq!(bindings.detach("name", ElementId(2)), 0);
        assert_eq!(bindings.detach("name", ElementId(3)), 0);
        assert_eq!(bindings.bound_count("name"), 0);
    }

    #[test]
    fn blur_marks_touched() {
        let mut bindings = Bindings::default();
        bindings.attach("name", ElementId(1));
        bindings.focus("name");
        assert!(bindings.interaction("name").unwrap().focused);
        bindings.blur("name");
        let state = bindings.interaction("name").unwrap();
        assert!(!state.focused && state.blurred && state.touched);
    }

    #[test]
    fn unbound_paths_record_no_interaction() {
        let mut bindings = Bindings::default();
        bindings.focus("ghost");
        bindings.blur("ghost");
        assert_eq!(bindings.interaction("ghost"), None);
        assert!(bindings.interactions.is_empty());

        bindings.attach("name", ElementId(1));
        bindings.detach("name", ElementId(1));
        bindings.blur("name");
        assert!(!bindings.interaction("name").is_some_and(|s| s.touched));
    }

    #[test]
    fn field_state_hides_interaction_when_disconnected() {
        let meta = MetaEntry::blank(FormKey::new("f"), "name");
        let state = FieldState::compose(SummaryEntry::default(), meta.clone(), None);
        assert_eq!(state.touched, None);

        let connected = MetaEntry {
            is_connected: true,
            ..meta
        };
        let state = FieldState::compose(SummaryEntry::default(), connected, None);
        assert_eq!(state.focused, Some(false));
        assert_eq!(state.blurred, Some(true));
        assert_eq!(state.touched, Some(false));
    }
}
