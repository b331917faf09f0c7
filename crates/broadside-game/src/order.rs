//! The two player seats.

/// Ordered pair of player seats. Slot `0` moves first in every match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerOrder {
    slots: [Option<String>; 2],
}

impl PlayerOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats `name` in the lowest free slot.
    ///
    /// An already seated name keeps its slot. Returns `None` when both
    /// seats belong to other names.
    pub fn seat(&mut self, name: &str) -> Option<usize> {
        if let Some(slot) = self.slot_of(name) {
            return Some(slot);
        }
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(name.to_string());
        Some(slot)
    }

    /// Frees the seat held by `name`. Returns the slot it held.
    pub fn vacate(&mut self, name: &str) -> Option<usize> {
        let slot = self.slot_of(name)?;
        self.slots[slot] = None;
        Some(slot)
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.as_deref() == Some(name))
    }

    /// The name in `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot)?.as_deref()
    }

    /// The name in the other seat.
    pub fn opponent_of(&self, name: &str) -> Option<&str> {
        let slot = self.slot_of(name)?;
        self.get(1 - slot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slot_of(name).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Seated names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.as_deref())
    }

    pub fn to_array(&self) -> [Option<String>; 2] {
        self.slots.clone()
    }
}
