//! The shadow: a constructed-but-not-simulated archetype instance.
//!
//! A shadow is exclusively owned by one [`crate::IdentityState`]. It never runs AI,
//! physics or collision; every field is written by the sync engine from the primary
//! actor, and the whole state round-trips through the persisted `EntityData` blob.

use crate::{
    actor::{Arm, Hand, HandSwing, LimbAnimation, Pose, VehicleRef},
    archetype::{ArchetypeId, ArchetypeInfo, Capability},
    bitmask_flags::BitmaskFlags,
    define_bitmask_flags,
    equipment::Equipment,
};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

define_bitmask_flags!(
    /// Render/gameplay state bits of a shadow.
    ShadowFlag, u32, {
        Jumping,
        Sprinting,
        Sneaking,
        Swimming,
        FallFlying,
        TouchingWater,
        UsingItem,
        Invulnerable,
        NoGravity,
        Attacking,
        Sitting,
        InSittingPose,
        /// Wing-flap animation for flying archetypes while airborne.
        Flapping,
    }
);

/// Every mirrored field of a shadow. This is exactly what `EntityData` stores.
///
/// Missing fields deserialize to their defaults so older or partial blobs still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShadowState {
    pub position: Point3<f32>,
    pub head_yaw: f32,
    pub prev_head_yaw: f32,
    pub body_yaw: f32,
    pub prev_body_yaw: f32,
    pub pitch: f32,
    pub prev_pitch: f32,
    pub limbs: LimbAnimation,
    pub hand_swing: HandSwing,
    pub age: u32,
    pub preferred_arm: Arm,
    pub active_hand: Hand,
    pub pose: Pose,
    pub flags: BitmaskFlags<u32>,
    pub fire_ticks: i32,
    pub stuck_arrows: u8,
    pub equipment: Equipment,
    pub vehicle: Option<VehicleRef>,
    pub item_use_ticks: u32,
    pub health: f32,
}

impl Default for ShadowState {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            head_yaw: 0.0,
            prev_head_yaw: 0.0,
            body_yaw: 0.0,
            prev_body_yaw: 0.0,
            pitch: 0.0,
            prev_pitch: 0.0,
            limbs: LimbAnimation::default(),
            hand_swing: HandSwing::default(),
            age: 0,
            preferred_arm: Arm::default(),
            active_hand: Hand::default(),
            pose: Pose::default(),
            flags: BitmaskFlags::default(),
            fire_ticks: 0,
            stuck_arrows: 0,
            equipment: Equipment::default(),
            vehicle: None,
            item_use_ticks: 0,
            health: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    archetype: ArchetypeId,
    capabilities: BitmaskFlags<u8>,
    pub state: ShadowState,
}

impl Shadow {
    /// A default-state shadow of `info`. Use [`crate::ArchetypeRegistry::construct`]
    /// to honor summonability and world rules.
    pub(crate) fn new(info: &ArchetypeInfo) -> Self {
        Self {
            archetype: info.id.clone(),
            capabilities: info.capabilities,
            state: ShadowState {
                health: info.max_health,
                ..ShadowState::default()
            },
        }
    }

    pub fn archetype(&self) -> &ArchetypeId {
        &self.archetype
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    pub fn flag(&self, flag: ShadowFlag) -> bool {
        self.state.flags.has(flag)
    }

    pub fn set_flag(&mut self, flag: ShadowFlag, enabled: bool) {
        self.state.flags.set(flag, enabled);
    }

    /// Advances the held-item use counter while the shadow is using an item.
    pub fn tick_active_item(&mut self) {
        if self.flag(ShadowFlag::UsingItem) {
            self.state.item_use_ticks = self.state.item_use_ticks.saturating_add(1);
        } else {
            self.state.item_use_ticks = 0;
        }
    }

    /// Serialized `EntityData` payload.
    pub fn entity_data(&self) -> serde_json::Value {
        // A plain struct of numbers, enums and string-keyed maps always serializes.
        serde_json::to_value(&self.state).unwrap_or_else(|err| {
            log::error!("Failed to serialize shadow `{}`: {err}", self.archetype);
            serde_json::Value::Object(serde_json::Map::new())
        })
    }

    /// Overwrites the state from an `EntityData` payload.
    ///
    /// On error the shadow is left unchanged. `null` loads as the default state.
    pub fn load_entity_data(&mut self, data: &serde_json::Value) -> Result<(), serde_json::Error> {
        let state = if data.is_null() {
            ShadowState {
                health: self.state.health,
                ..ShadowState::default()
            }
        } else {
            ShadowState::deserialize(data)?
        };
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archetype::{ArchetypeRegistry, OpenWorld},
        equipment::{EquipmentSlot, ItemStack},
    };

    fn zombie() -> Shadow {
        ArchetypeRegistry::vanilla()
            .construct(&"zombie".into(), &OpenWorld)
            .unwrap()
    }

    #[test]
    fn entity_data_round_trips_field_for_field() {
        let mut shadow = zombie();
        shadow.state.position = Point3::new(1.5, 64.0, -3.25);
        shadow.state.pitch = -12.5;
        shadow.state.pose = Pose::Crouching;
        shadow.set_flag(ShadowFlag::Attacking, true);
        shadow
            .state
            .equipment
            .set(EquipmentSlot::MainHand, Some(ItemStack::new("iron_sword", 1)));

        let data = shadow.entity_data();
        let mut restored = zombie();
        restored.load_entity_data(&data).unwrap();
        assert_eq!(restored, shadow);
    }

    #[test]
    fn corrupt_entity_data_leaves_state_untouched() {
        let mut shadow = zombie();
        shadow.state.age = 42;
        let err = shadow.load_entity_data(&serde_json::json!({ "age": "old" }));
        assert!(err.is_err());
        assert_eq!(shadow.state.age, 42);
    }

    #[test]
    fn partial_entity_data_fills_defaults() {
        let mut shadow = zombie();
        shadow
            .load_entity_data(&serde_json::json!({ "age": 7 }))
            .unwrap();
        assert_eq!(shadow.state.age, 7);
        assert_eq!(shadow.state.pose, Pose::Standing);
    }

    #[test]
    fn active_item_counter_resets_when_not_using() {
        let mut shadow = zombie();
        shadow.set_flag(ShadowFlag::UsingItem, true);
        shadow.tick_active_item();
        shadow.tick_active_item();
        assert_eq!(shadow.state.item_use_ticks, 2);

        shadow.set_flag(ShadowFlag::UsingItem, false);
        shadow.tick_active_item();
        assert_eq!(shadow.state.item_use_ticks, 0);
    }
}
