//! Logical controls and the binding set.
//!
//! A [`BindingSet`] maps each of the twelve logical controls to exactly one
//! physical key, and keeps a reverse index (physical key -> control) so event
//! resolution is a single lookup. Both indexes are maintained together inside
//! `rebind`; they are never transiently inconsistent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use shelf_core::types::{KeymapEntry, KeymapTable};

use crate::PlayerError;

/// The closed set of logical controls a virtual pad exposes.
///
/// These are the buttons games understand, independent of the physical
/// device asserting them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum LogicalControl {
    Up,
    Down,
    Left,
    Right,
    #[serde(rename = "A Button")]
    A,
    #[serde(rename = "B Button")]
    B,
    #[serde(rename = "X Button")]
    X,
    #[serde(rename = "Y Button")]
    Y,
    #[serde(rename = "L Button")]
    L,
    #[serde(rename = "R Button")]
    R,
    Start,
    Select,
}

impl LogicalControl {
    /// All controls, in the order bindings are listed and persisted.
    pub const ALL: [LogicalControl; 12] = [
        LogicalControl::Up,
        LogicalControl::Down,
        LogicalControl::Left,
        LogicalControl::Right,
        LogicalControl::A,
        LogicalControl::B,
        LogicalControl::X,
        LogicalControl::Y,
        LogicalControl::L,
        LogicalControl::R,
        LogicalControl::Start,
        LogicalControl::Select,
    ];

    /// Display name, also used as the persisted map key.
    pub fn name(self) -> &'static str {
        match self {
            LogicalControl::Up => "Up",
            LogicalControl::Down => "Down",
            LogicalControl::Left => "Left",
            LogicalControl::Right => "Right",
            LogicalControl::A => "A Button",
            LogicalControl::B => "B Button",
            LogicalControl::X => "X Button",
            LogicalControl::Y => "Y Button",
            LogicalControl::L => "L Button",
            LogicalControl::R => "R Button",
            LogicalControl::Start => "Start",
            LogicalControl::Select => "Select",
        }
    }

    /// Inverse of [`name`](Self::name). Unknown names are rejected; the
    /// control set is closed.
    pub fn from_name(name: &str) -> Option<Self> {
        LogicalControl::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Button ID the emulation runtime understands, in the standard
    /// joypad order (B=0, Y=1, Select=2, Start=3, directions 4-7, A=8,
    /// X=9, shoulders 10-11).
    pub fn button_id(self) -> u32 {
        match self {
            LogicalControl::B => 0,
            LogicalControl::Y => 1,
            LogicalControl::Select => 2,
            LogicalControl::Start => 3,
            LogicalControl::Up => 4,
            LogicalControl::Down => 5,
            LogicalControl::Left => 6,
            LogicalControl::Right => 7,
            LogicalControl::A => 8,
            LogicalControl::X => 9,
            LogicalControl::L => 10,
            LogicalControl::R => 11,
        }
    }

    /// Default physical key (browser `KeyboardEvent.key` identifier).
    pub fn default_key(self) -> &'static str {
        match self {
            LogicalControl::Up => "ArrowUp",
            LogicalControl::Down => "ArrowDown",
            LogicalControl::Left => "ArrowLeft",
            LogicalControl::Right => "ArrowRight",
            LogicalControl::A => "x",
            LogicalControl::B => "z",
            LogicalControl::X => "s",
            LogicalControl::Y => "a",
            LogicalControl::L => "q",
            LogicalControl::R => "w",
            LogicalControl::Start => "Enter",
            LogicalControl::Select => "Shift",
        }
    }
}

/// One active binding: a logical control and the physical key plus controller
/// coordinates it is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub control: LogicalControl,
    pub physical_key: String,
    pub port: u32,
    pub index: u32,
    pub button_id: u32,
}

impl KeyBinding {
    fn default_for(control: LogicalControl) -> Self {
        Self {
            control,
            physical_key: control.default_key().to_string(),
            port: 0,
            index: 0,
            button_id: control.button_id(),
        }
    }
}

/// The full set of active bindings, forward- and reverse-indexed.
///
/// Every logical control is always bound (defaults fill gaps). Physical keys
/// need not be unique: when two controls share a key, the reverse index
/// resolves to the most recently bound one (last-write-wins).
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSet {
    forward: BTreeMap<LogicalControl, KeyBinding>,
    reverse: HashMap<String, LogicalControl>,
}

impl BindingSet {
    /// The built-in default layout for all twelve controls.
    pub fn defaults() -> Self {
        let mut set = Self {
            forward: BTreeMap::new(),
            reverse: HashMap::new(),
        };
        for control in LogicalControl::ALL {
            set.insert(KeyBinding::default_for(control));
        }
        set
    }

    /// Build a set from persisted bindings; controls missing from `stored`
    /// keep their defaults.
    pub fn from_stored(stored: impl IntoIterator<Item = KeyBinding>) -> Self {
        let mut set = Self::defaults();
        for binding in stored {
            set.insert(binding);
        }
        set
    }

    fn insert(&mut self, binding: KeyBinding) {
        let control = binding.control;
        if let Some(old) = self.forward.get(&control) {
            // Drop the stale reverse entry only if it still points at us;
            // a later rebind of another control may have claimed the key.
            if self.reverse.get(&old.physical_key) == Some(&control) {
                self.reverse.remove(&old.physical_key);
            }
        }
        self.reverse.insert(binding.physical_key.clone(), control);
        self.forward.insert(control, binding);
    }

    pub fn get(&self, control: LogicalControl) -> &KeyBinding {
        // Construction guarantees every control is present.
        &self.forward[&control]
    }

    /// Resolve a physical key through the reverse index.
    pub fn resolve(&self, physical_key: &str) -> Option<&KeyBinding> {
        let control = self.reverse.get(physical_key)?;
        self.forward.get(control)
    }

    /// Point `control` at a new physical key, keeping its controller
    /// coordinates. Both indexes are updated together.
    pub fn rebind(&mut self, control: LogicalControl, new_key: impl Into<String>) {
        let mut binding = self.forward[&control].clone();
        binding.physical_key = new_key.into();
        self.insert(binding);
    }

    /// String-named variant of [`rebind`](Self::rebind) for callers holding
    /// user input. Fails without mutating anything if the name is unknown.
    pub fn rebind_named(&mut self, name: &str, new_key: &str) -> Result<(), PlayerError> {
        let control = LogicalControl::from_name(name)
            .ok_or_else(|| PlayerError::InvalidControlName(name.to_string()))?;
        self.rebind(control, new_key);
        Ok(())
    }

    /// Bindings in the fixed control order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.forward.values()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Flatten into the table shape the runtime's `setKeymap` consumes.
    pub fn to_keymap(&self) -> KeymapTable {
        self.iter()
            .map(|b| KeymapEntry {
                control: b.control.name().to_string(),
                physical_key: b.physical_key.clone(),
                port: b.port,
                index: b.index,
                button_id: b.button_id,
            })
            .collect()
    }
}

impl Default for BindingSet {
    fn default() -> Self {
        Self::defaults()
    }
}
