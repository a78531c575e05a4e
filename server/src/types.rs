use nalgebra as na;
use shared::{
    ArchetypeId, Arm, EquipmentSlot, Hand, HandSwing, ItemStack, LimbAnimation, Pose,
};
use spacetimedb::SpacetimeType;

/// A 3D vector in world space (meters).
#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq)]
pub struct DbVec3 {
    /// X axis (east-west)
    pub x: f32,
    /// Y axis (up-down)
    pub y: f32,
    /// Z axis (north-south)
    pub z: f32,
}

impl Default for DbVec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl DbVec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<DbVec3> for na::Point3<f32> {
    fn from(v: DbVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<na::Point3<f32>> for DbVec3 {
    fn from(p: na::Point3<f32>) -> Self {
        DbVec3::new(p.x, p.y, p.z)
    }
}

#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq)]
pub enum DbPose {
    Standing,
    Crouching,
    Swimming,
    FallFlying,
    Sleeping,
    Dying,
}

impl Default for DbPose {
    fn default() -> Self {
        DbPose::Standing
    }
}

impl From<DbPose> for Pose {
    fn from(pose: DbPose) -> Self {
        match pose {
            DbPose::Standing => Pose::Standing,
            DbPose::Crouching => Pose::Crouching,
            DbPose::Swimming => Pose::Swimming,
            DbPose::FallFlying => Pose::FallFlying,
            DbPose::Sleeping => Pose::Sleeping,
            DbPose::Dying => Pose::Dying,
        }
    }
}

impl From<Pose> for DbPose {
    fn from(pose: Pose) -> Self {
        match pose {
            Pose::Standing => DbPose::Standing,
            Pose::Crouching => DbPose::Crouching,
            Pose::Swimming => DbPose::Swimming,
            Pose::FallFlying => DbPose::FallFlying,
            Pose::Sleeping => DbPose::Sleeping,
            Pose::Dying => DbPose::Dying,
        }
    }
}

#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq)]
pub enum DbHand {
    MainHand,
    OffHand,
}

impl From<DbHand> for Hand {
    fn from(hand: DbHand) -> Self {
        match hand {
            DbHand::MainHand => Hand::MainHand,
            DbHand::OffHand => Hand::OffHand,
        }
    }
}

impl From<Hand> for DbHand {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::MainHand => DbHand::MainHand,
            Hand::OffHand => DbHand::OffHand,
        }
    }
}

pub fn arm_from_flag(left_handed: bool) -> Arm {
    if left_handed { Arm::Left } else { Arm::Right }
}

#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq, Default)]
pub struct DbLimbs {
    pub last_distance: f32,
    pub distance: f32,
    pub angle: f32,
}

impl From<DbLimbs> for LimbAnimation {
    fn from(limbs: DbLimbs) -> Self {
        Self {
            last_distance: limbs.last_distance,
            distance: limbs.distance,
            angle: limbs.angle,
        }
    }
}

#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq, Default)]
pub struct DbHandSwing {
    pub swinging: bool,
    pub ticks: i32,
    pub progress: f32,
}

impl From<DbHandSwing> for HandSwing {
    fn from(swing: DbHandSwing) -> Self {
        Self {
            swinging: swing.swinging,
            ticks: swing.ticks,
            last_progress: swing.progress,
            progress: swing.progress,
        }
    }
}

#[derive(SpacetimeType, Debug, Clone, Copy, PartialEq)]
pub enum DbEquipmentSlot {
    MainHand,
    OffHand,
    Head,
    Chest,
    Legs,
    Feet,
}

impl From<DbEquipmentSlot> for EquipmentSlot {
    fn from(slot: DbEquipmentSlot) -> Self {
        match slot {
            DbEquipmentSlot::MainHand => EquipmentSlot::MainHand,
            DbEquipmentSlot::OffHand => EquipmentSlot::OffHand,
            DbEquipmentSlot::Head => EquipmentSlot::Head,
            DbEquipmentSlot::Chest => EquipmentSlot::Chest,
            DbEquipmentSlot::Legs => EquipmentSlot::Legs,
            DbEquipmentSlot::Feet => EquipmentSlot::Feet,
        }
    }
}

#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub struct DbItemStack {
    pub slot: DbEquipmentSlot,
    pub item: String,
    pub count: u8,
}

impl DbItemStack {
    pub fn stack(&self) -> ItemStack {
        ItemStack::new(self.item.clone(), self.count)
    }
}

/// Vehicle archetype and the rider archetypes allowed on it.
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub struct DbMountRule {
    pub vehicle: String,
    pub riders: Vec<String>,
}

impl DbMountRule {
    pub fn vehicle_id(&self) -> ArchetypeId {
        ArchetypeId::new(&self.vehicle)
    }
}

/// Client-owned fields of a player's actor, sent with `report_actor_state`.
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub struct ActorReport {
    pub translation: DbVec3,
    pub head_yaw: f32,
    pub body_yaw: f32,
    pub pitch: f32,
    pub limbs: DbLimbs,
    pub hand_swing: DbHandSwing,
    pub left_handed: bool,
    pub active_hand: Option<DbHand>,
    pub pose: DbPose,
    pub flags: u32,
    pub equipment: Vec<DbItemStack>,
}

impl ActorReport {
    /// Whether every float in the report can be persisted.
    pub fn is_finite(&self) -> bool {
        let DbVec3 { x, y, z } = self.translation;
        [x, y, z, self.head_yaw, self.body_yaw, self.pitch]
            .iter()
            .all(|value| value.is_finite())
            && LimbAnimation::from(self.limbs).is_finite()
            && HandSwing::from(self.hand_swing).is_finite()
    }
}
