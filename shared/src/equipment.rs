use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Head,
    Chest,
    Legs,
    Feet,
}

impl EquipmentSlot {
    pub const HANDS: [EquipmentSlot; 2] = [EquipmentSlot::MainHand, EquipmentSlot::OffHand];
    pub const ARMOR: [EquipmentSlot; 4] = [
        EquipmentSlot::Head,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u8,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, count: u8) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}

/// Items held per slot. Empty slots are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, ItemStack>,
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlot) -> Option<&ItemStack> {
        self.slots.get(&slot)
    }

    /// Puts `stack` into `slot`, or empties it for `None`.
    pub fn set(&mut self, slot: EquipmentSlot, stack: Option<ItemStack>) {
        match stack {
            Some(stack) if stack.count > 0 => {
                self.slots.insert(slot, stack);
            }
            _ => {
                self.slots.remove(&slot);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlot, &ItemStack)> {
        self.slots.iter().map(|(slot, stack)| (*slot, stack))
    }
}
