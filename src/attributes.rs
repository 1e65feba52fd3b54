use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const NUM_ATTRIBUTES: usize = 5;

/// Ordered rename migrations for retired attribute names. Applied once on
/// load, in order, so future renames compose instead of stacking ad hoc
/// conditionals.
pub const ATTRIBUTE_MIGRATIONS: [(&str, &str); 3] = [
    ("mindfulness", "mindset"),
    ("spiritual", "spirituality"),
    ("healthAndWellness", "healthWellness"),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttributeType {
    Mindset,
    HealthWellness,
    Charisma,
    Education,
    Spirituality,
}

impl AttributeType {
    pub fn all() -> [AttributeType; NUM_ATTRIBUTES] {
        [
            AttributeType::Mindset,
            AttributeType::HealthWellness,
            AttributeType::Charisma,
            AttributeType::Education,
            AttributeType::Spirituality,
        ]
    }

    /// The key used for this attribute in documents and quest stat maps.
    pub fn key(&self) -> &'static str {
        match self {
            AttributeType::Mindset => "mindset",
            AttributeType::HealthWellness => "healthWellness",
            AttributeType::Charisma => "charisma",
            AttributeType::Education => "education",
            AttributeType::Spirituality => "spirituality",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AttributeType::Mindset => 0,
            AttributeType::HealthWellness => 1,
            AttributeType::Charisma => 2,
            AttributeType::Education => 3,
            AttributeType::Spirituality => 4,
        }
    }

    /// Resolves an attribute name to its current type, following rename
    /// migrations for retired names. Unknown names resolve to `None`.
    pub fn resolve(name: &str) -> Option<AttributeType> {
        let mut current = name;
        for (old, new) in ATTRIBUTE_MIGRATIONS {
            if current == old {
                current = new;
            }
        }
        AttributeType::all().into_iter().find(|a| a.key() == current)
    }
}

/// Per-category counters grown by quest completion. All values start at 0
/// and are floor-clamped at 0 on reversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes {
    values: [u32; NUM_ATTRIBUTES],
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: AttributeType) -> u32 {
        self.values[attr.index()]
    }

    pub fn set(&mut self, attr: AttributeType, value: u32) {
        self.values[attr.index()] = value;
    }

    /// Adds points to the attribute named by `name`. Retired names are
    /// migrated; unknown names are ignored.
    pub fn gain(&mut self, name: &str, amount: u32) {
        if let Some(attr) = AttributeType::resolve(name) {
            let idx = attr.index();
            self.values[idx] = self.values[idx].saturating_add(amount);
        }
    }

    /// Removes points from the attribute named by `name`, clamping at 0.
    /// Once clamped, a later re-gain/re-spend pair cannot restore the
    /// clamped amount.
    pub fn spend(&mut self, name: &str, amount: u32) {
        if let Some(attr) = AttributeType::resolve(name) {
            let idx = attr.index();
            self.values[idx] = self.values[idx].saturating_sub(amount);
        }
    }

    /// Builds attributes from a stored name→value map, applying rename
    /// migrations. Attributes absent from the map default to 0; keys that
    /// resolve to no current attribute are dropped.
    pub fn from_map(map: &BTreeMap<String, u32>) -> Self {
        let mut attrs = Self::new();
        for (name, value) in map {
            if let Some(attr) = AttributeType::resolve(name) {
                let idx = attr.index();
                attrs.values[idx] = attrs.values[idx].saturating_add(*value);
            }
        }
        attrs
    }

    /// Serializes to the document map shape, emitting every current
    /// attribute so newly introduced ones persist as explicit zeros.
    pub fn to_map(&self) -> BTreeMap<String, u32> {
        AttributeType::all()
            .into_iter()
            .map(|a| (a.key().to_string(), self.get(a)))
            .collect()
    }
}
