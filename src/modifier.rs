//! Modifier stack elements and the edits the command interpreter applies to them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::EffectKind;
use crate::command::CommandError;

/// Opaque element identifier. Fresh ids are UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierId(String);

impl ModifierId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModifierId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ModifierId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four corner cursors of a perspective modifier, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    pub top_left: [f64; 2],
    pub top_right: [f64; 2],
    pub bottom_left: [f64; 2],
    pub bottom_right: [f64; 2],
}

/// A config value: a number, a number pair or a corner set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(f64),
    Pair([f64; 2]),
    Corners(Corners),
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Scalar(value)
    }
}

impl From<[f64; 2]> for ConfigValue {
    fn from(value: [f64; 2]) -> Self {
        ConfigValue::Pair(value)
    }
}

/// Parameter name → value, in insertion order.
pub type Config = IndexMap<String, ConfigValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierElement {
    pub id: ModifierId,
    pub name: String,
    #[serde(default)]
    pub needs_update: bool,
    pub config: Config,
}

impl ModifierElement {
    /// A new element of `kind` with a fresh id and the kind's default config.
    pub fn new(kind: EffectKind) -> Self {
        Self {
            id: ModifierId::generate(),
            name: kind.display_name().to_string(),
            needs_update: false,
            config: kind.default_config(),
        }
    }

    pub fn kind(&self) -> Option<EffectKind> {
        EffectKind::from_name(&self.name)
    }

    pub fn with_value(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }
}

/// Ordered modifier elements. Order is pass execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierStack {
    elements: Vec<ModifierElement>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<ModifierElement>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[ModifierElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModifierElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModifierElement> {
        self.elements.get(index)
    }

    pub fn find(&self, id: &ModifierId) -> Option<&ModifierElement> {
        self.elements.iter().find(|element| &element.id == id)
    }

    /// Appends a default element of `kind` and returns it.
    pub fn add(&mut self, kind: EffectKind) -> &ModifierElement {
        self.elements.push(ModifierElement::new(kind));
        &self.elements[self.elements.len() - 1]
    }

    pub fn push(&mut self, element: ModifierElement) {
        self.elements.push(element);
    }

    /// Removes every element with `id`. Returns how many were removed.
    pub fn delete(&mut self, id: &ModifierId) -> usize {
        let before = self.elements.len();
        self.elements.retain(|element| &element.id != id);
        before - self.elements.len()
    }

    /// Sets `key` on the first element with `id`. The key must already exist.
    pub fn update(
        &mut self,
        id: &ModifierId,
        key: &str,
        value: ConfigValue,
    ) -> Result<(), CommandError> {
        let element = self
            .elements
            .iter_mut()
            .find(|element| &element.id == id)
            .ok_or_else(|| CommandError::UnknownElement(id.clone()))?;
        let slot = element
            .config
            .get_mut(key)
            .ok_or_else(|| CommandError::UnknownProperty {
                id: id.clone(),
                key: key.to_string(),
            })?;
        *slot = value;
        Ok(())
    }

    /// Swaps the elements at `first` and `second`.
    pub fn switch(&mut self, first: usize, second: usize) -> Result<(), CommandError> {
        let len = self.elements.len();
        for index in [first, second] {
            if index >= len {
                return Err(CommandError::IndexOutOfRange { index, len });
            }
        }
        self.elements.swap(first, second);
        Ok(())
    }

    /// Replaces the whole stack without validation.
    pub fn replace(&mut self, other: ModifierStack) {
        *self = other;
    }
}

impl<'s> IntoIterator for &'s ModifierStack {
    type Item = &'s ModifierElement;
    type IntoIter = std::slice::Iter<'s, ModifierElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: &str, kind: EffectKind) -> ModifierElement {
        ModifierElement {
            id: ModifierId::from(id),
            ..ModifierElement::new(kind)
        }
    }

    fn stack_of(ids: &[&str]) -> ModifierStack {
        ModifierStack::from_elements(
            ids.iter()
                .map(|id| element(id, EffectKind::Sepia))
                .collect(),
        )
    }

    fn ids(stack: &ModifierStack) -> Vec<&str> {
        stack.iter().map(|element| element.id.as_str()).collect()
    }

    #[test]
    fn add_appends_default_element_with_fresh_id() {
        let mut stack = ModifierStack::new();
        let first = stack.add(EffectKind::Sepia).id.clone();
        let second = stack.add(EffectKind::Sepia).id.clone();

        assert_ne!(first, second);
        assert_eq!(stack.len(), 2);
        let added = &stack.elements()[0];
        assert_eq!(added.name, "Sepia");
        assert!(!added.needs_update);
        assert_eq!(added.config["amount"], ConfigValue::Scalar(0.0));
        assert_eq!(added.config.len(), 1);
    }

    #[test]
    fn delete_removes_every_match() {
        let mut stack = stack_of(&["a", "b", "a", "c"]);
        assert_eq!(stack.delete(&ModifierId::from("a")), 2);
        assert_eq!(ids(&stack), ["b", "c"]);
        assert_eq!(stack.delete(&ModifierId::from("missing")), 0);
        assert_eq!(ids(&stack), ["b", "c"]);
    }

    #[test]
    fn update_sets_existing_keys_only() {
        let mut stack = stack_of(&["a"]);
        let id = ModifierId::from("a");

        stack.update(&id, "amount", ConfigValue::Scalar(0.5)).unwrap();
        assert_eq!(stack.elements()[0].config["amount"], ConfigValue::Scalar(0.5));

        let error = stack
            .update(&id, "bogus", ConfigValue::Scalar(0.5))
            .unwrap_err();
        assert!(matches!(error, CommandError::UnknownProperty { .. }));
        assert_eq!(stack.elements()[0].config.len(), 1);
        assert_eq!(stack.elements()[0].config["amount"], ConfigValue::Scalar(0.5));
    }

    #[test]
    fn update_of_unknown_id_is_rejected() {
        let mut stack = stack_of(&["a"]);
        let error = stack
            .update(&ModifierId::from("z"), "amount", ConfigValue::Scalar(1.0))
            .unwrap_err();
        assert!(matches!(error, CommandError::UnknownElement(_)));
    }

    #[test]
    fn switch_reorders_and_is_self_inverse() {
        let mut stack = stack_of(&["a", "b", "c"]);
        stack.switch(0, 2).unwrap();
        assert_eq!(ids(&stack), ["c", "b", "a"]);
        stack.switch(0, 2).unwrap();
        assert_eq!(ids(&stack), ["a", "b", "c"]);
        stack.switch(1, 1).unwrap();
        assert_eq!(ids(&stack), ["a", "b", "c"]);
    }

    #[test]
    fn switch_out_of_range_leaves_stack_untouched() {
        let mut stack = stack_of(&["a", "b"]);
        let error = stack.switch(0, 5).unwrap_err();
        assert!(matches!(
            error,
            CommandError::IndexOutOfRange { index: 5, len: 2 }
        ));
        assert_eq!(ids(&stack), ["a", "b"]);
    }

    #[test]
    fn elements_use_camel_case_wire_format() {
        let element = element("x", EffectKind::Perspective);
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["needsUpdate"], serde_json::json!(false));
        assert_eq!(
            json["config"]["cursorsAt"]["bottomRight"],
            serde_json::json!([0.0, 0.0])
        );
    }

    #[test]
    fn untagged_values_parse_by_shape() {
        let scalar: ConfigValue = serde_json::from_str("0.5").unwrap();
        let pair: ConfigValue = serde_json::from_str("[10, 20]").unwrap();
        let corners: ConfigValue = serde_json::from_str(
            r#"{"topLeft":[0,0],"topRight":[1,0],"bottomLeft":[0,1],"bottomRight":[1,1]}"#,
        )
        .unwrap();

        assert_eq!(scalar, ConfigValue::Scalar(0.5));
        assert_eq!(pair, ConfigValue::Pair([10.0, 20.0]));
        assert!(matches!(corners, ConfigValue::Corners(c) if c.bottom_right == [1.0, 1.0]));
    }

    #[test]
    fn config_order_survives_serialization() {
        let stack = ModifierStack::from_elements(vec![element("t", EffectKind::TiltShiftBlur)]);
        let json = serde_json::to_string(&stack).unwrap();
        let parsed: ModifierStack = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stack);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }
}
