//! Adapter traits over the primary actor.
//!
//! The mirroring core never owns an actor. Engine integrations implement the
//! read-side traits ([`TransformSource`], [`AnimationSource`], [`PoseSource`],
//! [`EquipmentSource`]) over their own actor type, and [`ActorHost`] for the few
//! writes an identity change performs (health, envelope, dismount).
//!
//! [`ActorState`] is a plain-data actor that implements all of them; the client keeps
//! one per observed actor and tests use it directly.

use crate::{
    archetype::ArchetypeId,
    bitmask_flags::BitmaskFlags,
    constants::DEFAULT_BASELINE_MAX_HEALTH,
    define_bitmask_flags,
    dimensions::EntityDimensions,
    equipment::{Equipment, EquipmentSlot, ItemStack},
};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Stable id of an actor in the simulation.
pub type ActorId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Standing,
    Crouching,
    Swimming,
    FallFlying,
    Sleeping,
    Dying,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[default]
    MainHand,
    OffHand,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arm {
    Left,
    #[default]
    Right,
}

/// Walk-cycle counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LimbAnimation {
    pub last_distance: f32,
    pub distance: f32,
    pub angle: f32,
}

impl LimbAnimation {
    pub fn is_finite(&self) -> bool {
        self.last_distance.is_finite() && self.distance.is_finite() && self.angle.is_finite()
    }
}

/// Arm-swing counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandSwing {
    pub swinging: bool,
    pub ticks: i32,
    pub last_progress: f32,
    pub progress: f32,
}

impl HandSwing {
    pub fn is_finite(&self) -> bool {
        self.last_progress.is_finite() && self.progress.is_finite()
    }
}

/// The entity an actor is riding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRef {
    pub actor_id: ActorId,
    pub archetype: ArchetypeId,
}

define_bitmask_flags!(
    /// Movement and interaction state bits of a primary actor.
    ActorFlag, u32, {
        Jumping,
        Sprinting,
        Sneaking,
        Swimming,
        FallFlying,
        TouchingWater,
        UsingItem,
        OnGround,
        /// Sitting on command (tamable actors only).
        Sitting,
    }
);

pub trait TransformSource {
    fn position(&self) -> Point3<f32>;
    fn head_yaw(&self) -> f32;
    fn prev_head_yaw(&self) -> f32;
    fn body_yaw(&self) -> f32;
    fn prev_body_yaw(&self) -> f32;
    fn pitch(&self) -> f32;
    fn prev_pitch(&self) -> f32;
}

pub trait AnimationSource {
    fn limbs(&self) -> LimbAnimation;
    fn hand_swing(&self) -> HandSwing;
    fn age(&self) -> u32;
    fn preferred_arm(&self) -> Arm;
    fn active_hand(&self) -> Option<Hand>;
}

pub trait PoseSource {
    fn native_archetype(&self) -> &ArchetypeId;
    fn pose(&self) -> Pose;
    fn flags(&self) -> BitmaskFlags<u32>;
    fn fire_ticks(&self) -> i32;
    fn stuck_arrows(&self) -> u8;
    fn vehicle(&self) -> Option<&VehicleRef>;

    fn is(&self, flag: ActorFlag) -> bool {
        self.flags().has(flag)
    }
}

pub trait EquipmentSource {
    fn equipped(&self, slot: EquipmentSlot) -> Option<&ItemStack>;
}

/// Everything the sync engine reads from a primary actor.
pub trait PrimaryActor: TransformSource + AnimationSource + PoseSource + EquipmentSource {}

impl<T> PrimaryActor for T where
    T: TransformSource + AnimationSource + PoseSource + EquipmentSource + ?Sized
{
}

/// Writes an identity change performs on the primary actor.
pub trait ActorHost: PoseSource {
    fn health(&self) -> f32;
    fn set_health(&mut self, health: f32);
    fn max_health_base(&self) -> f32;
    fn set_max_health_base(&mut self, value: f32);
    fn dismount(&mut self);
    fn set_dimensions(&mut self, dimensions: EntityDimensions);
}

/// Plain-data primary actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub archetype: ArchetypeId,
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
    pub active_hand: Option<Hand>,
    pub pose: Pose,
    pub flags: BitmaskFlags<u32>,
    pub fire_ticks: i32,
    pub stuck_arrows: u8,
    pub vehicle: Option<VehicleRef>,
    pub equipment: Equipment,
    pub health: f32,
    pub max_health_base: f32,
    pub dimensions: EntityDimensions,
}

impl ActorState {
    /// A standing player with full baseline health.
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            archetype: ArchetypeId::player(),
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
            preferred_arm: Arm::Right,
            active_hand: None,
            pose: Pose::Standing,
            flags: BitmaskFlags::default(),
            fire_ticks: 0,
            stuck_arrows: 0,
            vehicle: None,
            equipment: Equipment::default(),
            health: DEFAULT_BASELINE_MAX_HEALTH,
            max_health_base: DEFAULT_BASELINE_MAX_HEALTH,
            dimensions: EntityDimensions::default(),
        }
    }

    pub fn with_archetype(mut self, archetype: impl Into<ArchetypeId>) -> Self {
        self.archetype = archetype.into();
        self
    }

    pub fn set_flag(&mut self, flag: ActorFlag, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Advances the per-frame history fields (previous yaw/pitch/limb distance).
    pub fn begin_frame(&mut self) {
        self.prev_head_yaw = self.head_yaw;
        self.prev_body_yaw = self.body_yaw;
        self.prev_pitch = self.pitch;
        self.limbs.last_distance = self.limbs.distance;
        self.hand_swing.last_progress = self.hand_swing.progress;
    }
}

impl TransformSource for ActorState {
    fn position(&self) -> Point3<f32> {
        self.position
    }
    fn head_yaw(&self) -> f32 {
        self.head_yaw
    }
    fn prev_head_yaw(&self) -> f32 {
        self.prev_head_yaw
    }
    fn body_yaw(&self) -> f32 {
        self.body_yaw
    }
    fn prev_body_yaw(&self) -> f32 {
        self.prev_body_yaw
    }
    fn pitch(&self) -> f32 {
        self.pitch
    }
    fn prev_pitch(&self) -> f32 {
        self.prev_pitch
    }
}

impl AnimationSource for ActorState {
    fn limbs(&self) -> LimbAnimation {
        self.limbs
    }
    fn hand_swing(&self) -> HandSwing {
        self.hand_swing
    }
    fn age(&self) -> u32 {
        self.age
    }
    fn preferred_arm(&self) -> Arm {
        self.preferred_arm
    }
    fn active_hand(&self) -> Option<Hand> {
        self.active_hand
    }
}

impl PoseSource for ActorState {
    fn native_archetype(&self) -> &ArchetypeId {
        &self.archetype
    }
    fn pose(&self) -> Pose {
        self.pose
    }
    fn flags(&self) -> BitmaskFlags<u32> {
        self.flags
    }
    fn fire_ticks(&self) -> i32 {
        self.fire_ticks
    }
    fn stuck_arrows(&self) -> u8 {
        self.stuck_arrows
    }
    fn vehicle(&self) -> Option<&VehicleRef> {
        self.vehicle.as_ref()
    }
}

impl EquipmentSource for ActorState {
    fn equipped(&self, slot: EquipmentSlot) -> Option<&ItemStack> {
        self.equipment.get(slot)
    }
}

impl ActorHost for ActorState {
    fn health(&self) -> f32 {
        self.health
    }
    fn set_health(&mut self, health: f32) {
        self.health = health;
    }
    fn max_health_base(&self) -> f32 {
        self.max_health_base
    }
    fn set_max_health_base(&mut self, value: f32) {
        self.max_health_base = value;
        self.health = self.health.min(value);
    }
    fn dismount(&mut self) {
        self.vehicle = None;
    }
    fn set_dimensions(&mut self, dimensions: EntityDimensions) {
        self.dimensions = dimensions;
    }
}
