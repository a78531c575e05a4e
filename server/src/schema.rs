use crate::types::*;
use spacetimedb::*;

/// Player account data persisted across sessions.
///
/// The live `Actor` is created by `enter_world` and removed by `leave_world` (or on
/// disconnect). While the player is out of the world, the last actor position and
/// the serialized identity record are kept here so they survive a rejoin.
#[table(name = player, public)]
pub struct Player {
    /// Unique identity (primary key).
    #[primary_key]
    pub identity: Identity,

    /// Name used by command selectors. Unique, case-insensitive.
    #[unique]
    pub name: String,

    /// Permission level for the `identity` command (0 = none, 4 = owner).
    pub permission_level: u8,

    /// Optional live actor id. None if not currently in-world.
    #[index(btree)]
    pub actor_id: Option<u64>,

    /// Last known position, restored on `enter_world`.
    pub translation: DbVec3,
    pub body_yaw: f32,

    /// Persisted identity record (`{"id": ..., "EntityData": ...}`).
    pub identity_record: String,
}

/// Live actor entity.
///
/// Players own the transform/animation fields (via `report_actor_state`); the module
/// owns health, collision envelope and vehicle. Non-player actors are spawned by
/// operators and never hold an identity.
#[table(name = actor, public)]
pub struct Actor {
    /// Auto-incremented unique id (primary key).
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// An optional player identity when this actor is controlled, NOT a server actor.
    pub identity: Option<Identity>,
    /// Used alongside identity for faster btree lookups
    #[index(btree)]
    pub is_player: bool,

    /// Native archetype (e.g. "player", "ravager").
    pub archetype: String,

    pub translation: DbVec3,
    pub head_yaw: f32,
    pub body_yaw: f32,
    pub pitch: f32,
    pub limbs: DbLimbs,
    pub hand_swing: DbHandSwing,
    pub age: u32,
    pub left_handed: bool,
    pub active_hand: Option<DbHand>,
    pub pose: DbPose,
    /// `shared::ActorFlag` bits.
    pub flags: u32,
    pub fire_ticks: i32,
    pub stuck_arrows: u8,
    pub equipment: Vec<DbItemStack>,

    /// Actor being ridden, if any.
    #[index(btree)]
    pub vehicle_id: Option<u64>,

    pub health: f32,
    pub max_health_base: f32,

    /// Collision envelope (meters) for the effective archetype and pose.
    pub width: f32,
    pub height: f32,
    pub eye_height: f32,

    /// Capsule collider parameters (meters), derived from the envelope.
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
}

/// Replicated identity of each live primary actor.
///
/// Observers subscribe to this table; every row update is a full-state replication
/// message. `version` increases on every change so out-of-order deliveries can be
/// dropped client side.
#[table(name = identity_record, public)]
pub struct IdentityRecordRow {
    #[primary_key]
    pub actor_id: u64,

    /// Archetype id, or `"empty"`.
    pub archetype: String,

    /// Serialized shadow state (JSON). `{}` when empty.
    pub entity_data: String,

    pub version: u64,
}

/// Archetypes a player has unlocked for self-service equip.
#[table(name = unlocked_identity)]
pub struct UnlockedIdentity {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub owner: Identity,

    pub archetype: String,
}

/// Identity settings shared by the module and clients.
///
/// This is intended to be a single-row table (`id = 1`), seeded by `init` and
/// changed through `update_identity_settings`.
#[table(name = identity_settings, public)]
pub struct IdentitySettings {
    /// Unique id (primary key). Use a single row with `id = 1`.
    #[primary_key]
    pub id: u32,

    /// Identity that published the module; always gets the owner permission level.
    pub owner: Identity,

    pub scaling_health: bool,
    pub max_health: f32,
    pub identities_equip_items: bool,
    pub identities_equip_armor: bool,
    pub log_commands: bool,
    pub baseline_max_health: f32,
    pub command_permission_level: u8,
    pub mount_restrictions: Vec<DbMountRule>,
}

/// One executed `identity` command line.
#[table(name = command_receipt, public)]
pub struct CommandReceipt {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub issuer: Identity,

    pub line: String,
    pub exit_code: i32,
    pub issued_at: Timestamp,
}

/// Confirmation lines produced by a command, addressed to a player.
#[table(name = command_feedback, public)]
pub struct CommandFeedback {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub receipt_id: u64,

    #[index(btree)]
    pub recipient: Identity,

    /// Translation key, e.g. `identity.grant_success`.
    pub key: String,
    pub text: String,
}
