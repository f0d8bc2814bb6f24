//! Input Bindings Module
//!
//! Maps physical keys to logical viewer actions. Walking keys (WASD, Shift,
//! Space) are held-state and live in [`MovementKeys`](super::MovementKeys);
//! everything here fires once per press.
//!
//! In a config file bindings are a map of action to key. Entries override the
//! defaults one by one, so a file naming only `interact` keeps every other
//! default binding.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::KeyCode;

/// Logical actions that can be bound to physical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    /// Select from crosshair (first person) or build primary action (default: E)
    Interact,
    /// Toggle build mode (default: B)
    ToggleBuild,
    /// Toggle first-person walking (default: V)
    ToggleFirstPerson,
    /// Toggle auto-orbit (default: O)
    ToggleAutoOrbit,
    /// Rotate the build preview by one step (default: R)
    RotatePreview,
    /// Cycle the build object kind (default: Tab)
    CycleObject,
    /// Switch between place and remove (default: X)
    TogglePlacement,
    /// Clear selection / leave build mode (default: Escape)
    Escape,
    /// Re-fetch records (default: F5)
    Refresh,
}

/// Bidirectional key/action map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<InputAction, KeyCode>", into = "BTreeMap<InputAction, KeyCode>")]
pub struct InputBindings {
    key_to_action: HashMap<KeyCode, InputAction>,
    action_to_key: HashMap<InputAction, KeyCode>,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBindings {
    /// Default bindings:
    /// - E = Interact
    /// - B = ToggleBuild
    /// - V = ToggleFirstPerson
    /// - O = ToggleAutoOrbit
    /// - R = RotatePreview
    /// - Tab = CycleObject
    /// - X = TogglePlacement
    /// - Escape = Escape
    /// - F5 = Refresh
    pub fn new() -> Self {
        let mut bindings = Self {
            key_to_action: HashMap::new(),
            action_to_key: HashMap::new(),
        };

        bindings.bind(KeyCode::E, InputAction::Interact);
        bindings.bind(KeyCode::B, InputAction::ToggleBuild);
        bindings.bind(KeyCode::V, InputAction::ToggleFirstPerson);
        bindings.bind(KeyCode::O, InputAction::ToggleAutoOrbit);
        bindings.bind(KeyCode::R, InputAction::RotatePreview);
        bindings.bind(KeyCode::Tab, InputAction::CycleObject);
        bindings.bind(KeyCode::X, InputAction::TogglePlacement);
        bindings.bind(KeyCode::Escape, InputAction::Escape);
        bindings.bind(KeyCode::F5, InputAction::Refresh);

        bindings
    }

    /// Bind a physical key to a logical action.
    ///
    /// Any previous binding of either the key or the action is removed.
    pub fn bind(&mut self, key: KeyCode, action: InputAction) {
        if let Some(old_action) = self.key_to_action.remove(&key) {
            self.action_to_key.remove(&old_action);
        }
        if let Some(old_key) = self.action_to_key.remove(&action) {
            self.key_to_action.remove(&old_key);
        }
        self.key_to_action.insert(key, action);
        self.action_to_key.insert(action, key);
    }

    pub fn unbind_action(&mut self, action: InputAction) {
        if let Some(key) = self.action_to_key.remove(&action) {
            self.key_to_action.remove(&key);
        }
    }

    pub fn action(&self, key: KeyCode) -> Option<InputAction> {
        self.key_to_action.get(&key).copied()
    }

    pub fn key(&self, action: InputAction) -> Option<KeyCode> {
        self.action_to_key.get(&action).copied()
    }
}

impl From<BTreeMap<InputAction, KeyCode>> for InputBindings {
    fn from(overrides: BTreeMap<InputAction, KeyCode>) -> Self {
        let mut bindings = Self::new();
        for (action, key) in overrides {
            bindings.bind(key, action);
        }
        bindings
    }
}

impl From<InputBindings> for BTreeMap<InputAction, KeyCode> {
    fn from(bindings: InputBindings) -> Self {
        bindings.action_to_key.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = InputBindings::new();
        assert_eq!(bindings.action(KeyCode::E), Some(InputAction::Interact));
        assert_eq!(bindings.action(KeyCode::B), Some(InputAction::ToggleBuild));
        assert_eq!(bindings.action(KeyCode::V), Some(InputAction::ToggleFirstPerson));
        assert_eq!(bindings.action(KeyCode::Tab), Some(InputAction::CycleObject));
        assert_eq!(bindings.key(InputAction::Refresh), Some(KeyCode::F5));
        assert_eq!(bindings.action(KeyCode::W), None);
    }

    #[test]
    fn test_rebind_removes_old_key() {
        let mut bindings = InputBindings::new();
        bindings.bind(KeyCode::F, InputAction::Interact);
        assert_eq!(bindings.action(KeyCode::E), None);
        assert_eq!(bindings.key(InputAction::Interact), Some(KeyCode::F));
    }

    #[test]
    fn test_rebind_steals_key_from_other_action() {
        let mut bindings = InputBindings::new();
        bindings.bind(KeyCode::B, InputAction::Interact);
        assert_eq!(bindings.action(KeyCode::B), Some(InputAction::Interact));
        assert_eq!(bindings.key(InputAction::ToggleBuild), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let bindings: InputBindings = serde_json::from_str(r#"{ "interact": "F" }"#).unwrap();
        assert_eq!(bindings.key(InputAction::Interact), Some(KeyCode::F));
        assert_eq!(bindings.key(InputAction::ToggleBuild), Some(KeyCode::B));
    }

    #[test]
    fn test_unbind_action() {
        let mut bindings = InputBindings::new();
        bindings.unbind_action(InputAction::Escape);
        assert_eq!(bindings.action(KeyCode::Escape), None);
    }
}
