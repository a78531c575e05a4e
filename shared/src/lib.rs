pub mod actor;
pub mod archetype;
pub mod bitmask_flags;
pub mod command;
pub mod config;
pub mod constants;
pub mod dimensions;
pub mod equipment;
pub mod error;
pub mod identity;
pub mod local;
pub mod record;
pub mod replication;
pub mod services;
pub mod shadow;
pub mod sync;
pub mod unlock;
pub mod updater;

pub use actor::{
    ActorFlag, ActorHost, ActorId, ActorState, AnimationSource, Arm, EquipmentSource, Hand,
    HandSwing, LimbAnimation, Pose, PoseSource, PrimaryActor, TransformSource, VehicleRef,
};
pub use archetype::{
    ArchetypeId, ArchetypeInfo, ArchetypeRegistry, Capability, OpenWorld, WorldContext,
};
pub use bitmask_flags::{BitmaskFlags, FlagBitmask};
pub use command::{
    AuthorizationService, CommandOutcome, CommandSource, Feedback, IdentityCommand,
    IdentityEntry, IdentityHost, Recipient, Selector, TargetKind,
};
pub use config::IdentityConfig;
pub use constants::{EMPTY_IDENTITY_ID, IDENTITY_TICK_HZ};
pub use dimensions::{CapsuleDimensions, DimensionAdapter, EntityDimensions};
pub use equipment::{Equipment, EquipmentSlot, ItemStack};
pub use error::{
    CommandError, ConfigError, ConstructionError, DeserializeError, EquipError, UpdaterError,
};
pub use identity::{IdentityChange, IdentitySlot, IdentityState};
pub use local::{LocalActor, LocalWorld};
pub use record::IdentityRecord;
pub use replication::{IdentityReplica, ReplicaUpdate, ReplicationMessage};
pub use services::IdentityServices;
pub use shadow::{Shadow, ShadowFlag, ShadowState};
pub use sync::{RenderDirective, SyncEngine};
pub use unlock::{UnlockedSet, equip_unlocked};
pub use updater::{Updater, UpdaterRegistry};
