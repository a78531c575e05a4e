//! Per-actor identity state and its transitions.
//!
//! ```text
//! EMPTY --Some(a)--> EQUIPPED(a) --Some(b)--> EQUIPPED(b)
//!   ^                    |   \--Some(a)--> (no-op)
//!   +-------None---------+
//! ```
//!
//! Every real transition runs the same ordered side effects on the owning actor:
//! dimension refresh, health scaling, mount compatibility, then replication.

use crate::{
    actor::{ActorHost, ActorId},
    archetype::{ArchetypeId, ArchetypeInfo, WorldContext},
    error::{ConstructionError, DeserializeError},
    record::IdentityRecord,
    replication::ReplicationMessage,
    services::IdentityServices,
    shadow::Shadow,
};

/// Whether an actor currently projects a shadow.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum IdentitySlot {
    #[default]
    Empty,
    Equipped(Shadow),
}

impl IdentitySlot {
    pub fn shadow(&self) -> Option<&Shadow> {
        match self {
            IdentitySlot::Empty => None,
            IdentitySlot::Equipped(shadow) => Some(shadow),
        }
    }

    pub fn shadow_mut(&mut self) -> Option<&mut Shadow> {
        match self {
            IdentitySlot::Empty => None,
            IdentitySlot::Equipped(shadow) => Some(shadow),
        }
    }
}

/// Outcome of [`IdentityState::set_identity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityChange {
    /// Re-equip of the current archetype; nothing ran.
    Unchanged,
    Equipped {
        previous: Option<ArchetypeId>,
        current: ArchetypeId,
    },
    Cleared {
        previous: Option<ArchetypeId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct IdentityState {
    owner: ActorId,
    slot: IdentitySlot,
    version: u64,
    outbox: Vec<ReplicationMessage>,
}

impl IdentityState {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            slot: IdentitySlot::Empty,
            version: 0,
            outbox: Vec::new(),
        }
    }

    /// A state that continues from an already published `version`.
    pub fn with_version(owner: ActorId, version: u64) -> Self {
        Self {
            version,
            ..Self::new(owner)
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn slot(&self) -> &IdentitySlot {
        &self.slot
    }

    pub fn identity(&self) -> Option<&Shadow> {
        self.slot.shadow()
    }

    pub fn identity_mut(&mut self) -> Option<&mut Shadow> {
        self.slot.shadow_mut()
    }

    pub fn archetype(&self) -> Option<&ArchetypeId> {
        self.identity().map(Shadow::archetype)
    }

    pub fn is_equipped_with(&self, archetype: &ArchetypeId) -> bool {
        self.archetype() == Some(archetype)
    }

    /// Equips `archetype`, or clears the identity for `None`.
    ///
    /// Construction failures leave the state and the actor untouched.
    pub fn set_identity(
        &mut self,
        archetype: Option<&ArchetypeId>,
        services: &IdentityServices,
        world: &dyn WorldContext,
        actor: &mut dyn ActorHost,
    ) -> Result<IdentityChange, ConstructionError> {
        let previous = self.archetype().cloned();

        let change = match archetype {
            Some(archetype) if self.is_equipped_with(archetype) => return Ok(IdentityChange::Unchanged),
            Some(archetype) => {
                let shadow = services.archetypes.construct(archetype, world)?;
                self.slot = IdentitySlot::Equipped(shadow);
                IdentityChange::Equipped {
                    previous,
                    current: archetype.clone(),
                }
            }
            None => {
                self.slot = IdentitySlot::Empty;
                IdentityChange::Cleared { previous }
            }
        };

        let info = self
            .archetype()
            .and_then(|archetype| services.archetypes.get(archetype));

        self.refresh_dimensions(services, actor);
        Self::apply_health_scaling(info, services, actor);
        self.enforce_mount_compatibility(services, actor);
        self.enqueue_replication();

        log::debug!("Actor {} identity: {change:?}", self.owner);
        Ok(change)
    }

    fn refresh_dimensions(&self, services: &IdentityServices, actor: &mut dyn ActorHost) {
        services.dimension_adapter().refresh(actor, self.archetype());
    }

    fn apply_health_scaling(
        info: Option<&ArchetypeInfo>,
        services: &IdentityServices,
        actor: &mut dyn ActorHost,
    ) {
        let config = &services.config;
        match info {
            // Restored even with scaling off.
            None => actor.set_max_health_base(config.baseline_max_health),
            Some(_) if !config.scaling_health => {}
            Some(info) => {
                actor.set_health(actor.health().min(info.max_health));
                actor.set_max_health_base(config.max_health.min(info.max_health));
            }
        }
    }

    fn enforce_mount_compatibility(&self, services: &IdentityServices, actor: &mut dyn ActorHost) {
        let rider = self
            .archetype()
            .cloned()
            .unwrap_or_else(|| actor.native_archetype().clone());

        let incompatible = actor
            .vehicle()
            .is_some_and(|vehicle| !services.config.may_ride(&vehicle.archetype, &rider));

        if incompatible {
            log::debug!("Actor {} dismounted: `{rider}` may not ride its vehicle", self.owner);
            actor.dismount();
        }
    }

    fn enqueue_replication(&mut self) {
        self.version += 1;
        let message = self.replication_message();
        self.outbox.push(message);
    }

    /// Re-sends the current state unchanged, for drift correction.
    pub fn enqueue_snapshot(&mut self) {
        self.enqueue_replication();
    }

    /// Full-state message for the current version.
    pub fn replication_message(&self) -> ReplicationMessage {
        ReplicationMessage {
            actor_id: self.owner,
            archetype: self.archetype().cloned(),
            snapshot: self
                .identity()
                .map(Shadow::entity_data)
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
            version: self.version,
        }
    }

    /// Takes every message enqueued since the last drain, oldest first.
    pub fn drain_replication(&mut self) -> Vec<ReplicationMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn serialize(&self) -> IdentityRecord {
        match &self.slot {
            IdentitySlot::Empty => IdentityRecord::empty(),
            IdentitySlot::Equipped(shadow) => {
                IdentityRecord::equipped(shadow.archetype(), shadow.entity_data())
            }
        }
    }

    /// Loads a persisted record, refreshing the actor's envelope if the archetype changed.
    ///
    /// Errors are reported after the state has been normalized to empty.
    pub fn deserialize(
        &mut self,
        record: &IdentityRecord,
        services: &IdentityServices,
        world: &dyn WorldContext,
        actor: &mut dyn ActorHost,
    ) -> Result<(), DeserializeError> {
        let before = self.archetype().cloned();
        let result = self.restore(record, services, world);
        if self.archetype() != before.as_ref() {
            self.refresh_dimensions(services, actor);
        }
        result
    }

    /// Overwrites the observed state with a replicated one at `version`.
    pub(crate) fn overwrite(
        &mut self,
        message: &ReplicationMessage,
        services: &IdentityServices,
        world: &dyn WorldContext,
        actor: &mut dyn ActorHost,
    ) -> Result<(), DeserializeError> {
        self.version = message.version;
        self.deserialize(&message.record(), services, world, actor)
    }

    /// Loads a stored record without touching the actor.
    ///
    /// For callers whose actor envelope is already current, such as the authoritative
    /// tick reloading a state it persisted itself. Errors leave the state empty.
    pub fn restore(
        &mut self,
        record: &IdentityRecord,
        services: &IdentityServices,
        world: &dyn WorldContext,
    ) -> Result<(), DeserializeError> {
        let current = std::mem::take(&mut self.slot);
        let Some(archetype) = record.archetype() else {
            return Ok(());
        };
        if !services.archetypes.contains(&archetype) {
            return Err(DeserializeError::UnknownArchetype(record.id.clone()));
        }

        let mut shadow = match current {
            IdentitySlot::Equipped(shadow) if shadow.archetype() == &archetype => shadow,
            _ => services
                .archetypes
                .construct(&archetype, world)
                .map_err(|source| DeserializeError::Unconstructible {
                    archetype: archetype.clone(),
                    source,
                })?,
        };

        shadow
            .load_entity_data(&record.entity_data)
            .map_err(|source| DeserializeError::CorruptEntityData { archetype, source })?;
        self.slot = IdentitySlot::Equipped(shadow);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actor::{ActorState, PoseSource, VehicleRef},
        archetype::OpenWorld,
        config::IdentityConfig,
        dimensions::EntityDimensions,
        shadow::ShadowFlag,
        BitmaskFlags,
    };
    use nalgebra::Point3;

    /// Counts envelope writes on top of a plain actor.
    struct CountingHost {
        actor: ActorState,
        refreshes: usize,
    }

    impl PoseSource for CountingHost {
        fn native_archetype(&self) -> &ArchetypeId {
            self.actor.native_archetype()
        }
        fn pose(&self) -> crate::actor::Pose {
            self.actor.pose()
        }
        fn flags(&self) -> BitmaskFlags<u32> {
            self.actor.flags()
        }
        fn fire_ticks(&self) -> i32 {
            self.actor.fire_ticks()
        }
        fn stuck_arrows(&self) -> u8 {
            self.actor.stuck_arrows()
        }
        fn vehicle(&self) -> Option<&VehicleRef> {
            self.actor.vehicle()
        }
    }

    impl ActorHost for CountingHost {
        fn health(&self) -> f32 {
            self.actor.health()
        }
        fn set_health(&mut self, health: f32) {
            self.actor.set_health(health);
        }
        fn max_health_base(&self) -> f32 {
            self.actor.max_health_base()
        }
        fn set_max_health_base(&mut self, value: f32) {
            self.actor.set_max_health_base(value);
        }
        fn dismount(&mut self) {
            self.actor.dismount();
        }
        fn set_dimensions(&mut self, dimensions: EntityDimensions) {
            self.refreshes += 1;
            self.actor.set_dimensions(dimensions);
        }
    }

    fn services() -> IdentityServices {
        IdentityServices::vanilla(IdentityConfig::default())
    }

    fn zombie() -> ArchetypeId {
        ArchetypeId::new("zombie")
    }

    #[test]
    fn clear_then_double_equip_refreshes_twice() {
        let services = services();
        let mut host = CountingHost {
            actor: ActorState::new(1),
            refreshes: 0,
        };
        let mut state = IdentityState::new(1);

        state.set_identity(None, &services, &OpenWorld, &mut host).unwrap();
        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut host)
            .unwrap();
        let change = state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut host)
            .unwrap();

        assert_eq!(change, IdentityChange::Unchanged);
        assert_eq!(host.refreshes, 2);
        assert_eq!(state.version(), 2);
    }

    #[test]
    fn same_archetype_reequip_keeps_shadow_state() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut actor)
            .unwrap();
        state.identity_mut().unwrap().state.age = 314;
        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut actor)
            .unwrap();

        assert_eq!(state.identity().unwrap().state.age, 314);
    }

    #[test]
    fn failed_construction_leaves_prior_identity() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut actor)
            .unwrap();

        let err = state
            .set_identity(Some(&"boat".into()), &services, &OpenWorld, &mut actor)
            .unwrap_err();

        assert_eq!(err, ConstructionError::NotLiving("boat".into()));
        assert!(state.is_equipped_with(&zombie()));
        assert_eq!(state.drain_replication().len(), 1);
    }

    #[test]
    fn equip_resizes_the_actor() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&"spider".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(actor.dimensions.width, 1.4);

        state.set_identity(None, &services, &OpenWorld, &mut actor).unwrap();
        assert_eq!(actor.dimensions, EntityDimensions::default());
    }

    #[test]
    fn health_scaling_caps_to_config() {
        let services = IdentityServices::vanilla(IdentityConfig {
            scaling_health: true,
            max_health: 30.0,
            ..IdentityConfig::default()
        });
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&"enderman".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(actor.max_health_base, 30.0);

        state
            .set_identity(Some(&"chicken".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(actor.max_health_base, 4.0);
        assert_eq!(actor.health, 4.0);

        state.set_identity(None, &services, &OpenWorld, &mut actor).unwrap();
        assert_eq!(actor.max_health_base, 20.0);
    }

    #[test]
    fn clearing_resets_health_after_scaling_is_turned_off() {
        let scaled = IdentityServices::vanilla(IdentityConfig {
            scaling_health: true,
            ..IdentityConfig::default()
        });
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&"chicken".into()), &scaled, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(actor.max_health_base, 4.0);

        state.set_identity(None, &services(), &OpenWorld, &mut actor).unwrap();
        assert_eq!(actor.max_health_base, 20.0);
        assert_eq!(actor.health, 4.0);
    }

    /// Records the order of health writes.
    struct HealthLog {
        actor: ActorState,
        writes: Vec<&'static str>,
    }

    impl PoseSource for HealthLog {
        fn native_archetype(&self) -> &ArchetypeId {
            self.actor.native_archetype()
        }
        fn pose(&self) -> crate::actor::Pose {
            self.actor.pose()
        }
        fn flags(&self) -> BitmaskFlags<u32> {
            self.actor.flags()
        }
        fn fire_ticks(&self) -> i32 {
            self.actor.fire_ticks()
        }
        fn stuck_arrows(&self) -> u8 {
            self.actor.stuck_arrows()
        }
        fn vehicle(&self) -> Option<&VehicleRef> {
            self.actor.vehicle()
        }
    }

    impl ActorHost for HealthLog {
        fn health(&self) -> f32 {
            self.actor.health
        }
        fn set_health(&mut self, health: f32) {
            self.writes.push("health");
            self.actor.health = health;
        }
        fn max_health_base(&self) -> f32 {
            self.actor.max_health_base
        }
        fn set_max_health_base(&mut self, value: f32) {
            self.writes.push("max_health_base");
            self.actor.max_health_base = value;
        }
        fn dismount(&mut self) {
            self.actor.dismount();
        }
        fn set_dimensions(&mut self, dimensions: EntityDimensions) {
            self.actor.set_dimensions(dimensions);
        }
    }

    #[test]
    fn scaling_clamps_health_before_lowering_the_base() {
        let services = IdentityServices::vanilla(IdentityConfig {
            scaling_health: true,
            ..IdentityConfig::default()
        });
        let mut host = HealthLog {
            actor: ActorState::new(1),
            writes: Vec::new(),
        };
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&"chicken".into()), &services, &OpenWorld, &mut host)
            .unwrap();

        assert_eq!(host.writes, ["health", "max_health_base"]);
        assert_eq!(host.actor.health, 4.0);
    }

    #[test]
    fn health_is_untouched_without_scaling() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&"chicken".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(actor.max_health_base, 20.0);
        assert_eq!(actor.health, 20.0);
    }

    #[test]
    fn incompatible_rider_is_dismounted_in_the_same_call() {
        let services = services();
        let mut actor = ActorState::new(1);
        actor.vehicle = Some(VehicleRef {
            actor_id: 9,
            archetype: "ravager".into(),
        });
        let mut state = IdentityState::new(1);

        state
            .set_identity(Some(&"pillager".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert!(actor.vehicle.is_some());

        state
            .set_identity(Some(&"cow".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert!(actor.vehicle.is_none());
    }

    #[test]
    fn clearing_checks_the_native_archetype() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&"pillager".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        actor.vehicle = Some(VehicleRef {
            actor_id: 9,
            archetype: "ravager".into(),
        });

        state.set_identity(None, &services, &OpenWorld, &mut actor).unwrap();
        assert!(actor.vehicle.is_none());
    }

    #[test]
    fn record_round_trip() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&"phantom".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        {
            let shadow = state.identity_mut().unwrap();
            shadow.state.position = Point3::new(4.0, 80.0, 4.0);
            shadow.set_flag(ShadowFlag::Attacking, true);
        }

        let record = state.serialize();
        assert_eq!(record.id, "phantom");

        let mut restored = IdentityState::new(1);
        restored
            .deserialize(&record, &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(restored.identity(), state.identity());
    }

    #[test]
    fn empty_sentinel_round_trip() {
        let services = services();
        let mut actor = ActorState::new(1);
        let state = IdentityState::new(1);

        let record = state.serialize();
        assert_eq!(record, IdentityRecord::empty());

        let mut restored = IdentityState::new(1);
        restored
            .deserialize(&record, &services, &OpenWorld, &mut actor)
            .unwrap();
        assert_eq!(restored.slot(), &IdentitySlot::Empty);
    }

    #[test]
    fn unknown_archetype_normalizes_to_empty() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut actor)
            .unwrap();

        let record = IdentityRecord {
            id: "minecraft:unicorn".into(),
            entity_data: serde_json::json!({}),
        };
        let err = state
            .deserialize(&record, &services, &OpenWorld, &mut actor)
            .unwrap_err();

        assert!(matches!(err, DeserializeError::UnknownArchetype(id) if id == "minecraft:unicorn"));
        assert_eq!(state.slot(), &IdentitySlot::Empty);
        assert_eq!(actor.dimensions, EntityDimensions::default());
    }

    #[test]
    fn corrupt_snapshot_normalizes_to_empty() {
        let services = services();
        let mut actor = ActorState::new(1);
        let mut state = IdentityState::new(1);

        let record = IdentityRecord {
            id: "zombie".into(),
            entity_data: serde_json::json!({ "pose": 12 }),
        };
        let err = state
            .deserialize(&record, &services, &OpenWorld, &mut actor)
            .unwrap_err();

        assert!(matches!(err, DeserializeError::CorruptEntityData { .. }));
        assert!(state.identity().is_none());
    }

    #[test]
    fn deserialize_reuses_a_matching_shadow() {
        let services = services();
        let mut host = CountingHost {
            actor: ActorState::new(1),
            refreshes: 0,
        };
        let mut state = IdentityState::new(1);
        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut host)
            .unwrap();
        let record = IdentityRecord::equipped(&zombie(), serde_json::json!({ "age": 5 }));

        state
            .deserialize(&record, &services, &OpenWorld, &mut host)
            .unwrap();

        assert_eq!(state.identity().unwrap().state.age, 5);
        assert_eq!(host.refreshes, 1);
    }

    #[test]
    fn restore_continues_the_published_version() {
        let services = services();
        let record = IdentityRecord::equipped(&zombie(), serde_json::json!({ "fireTicks": 8 }));

        let mut state = IdentityState::with_version(4, 17);
        state.restore(&record, &services, &OpenWorld).unwrap();
        state.enqueue_snapshot();

        assert_eq!(state.identity().unwrap().state.fire_ticks, 8);
        assert_eq!(state.drain_replication()[0].version, 18);
    }

    #[test]
    fn replication_messages_carry_increasing_versions() {
        let services = services();
        let mut actor = ActorState::new(7);
        let mut state = IdentityState::new(7);

        state
            .set_identity(Some(&zombie()), &services, &OpenWorld, &mut actor)
            .unwrap();
        state.set_identity(None, &services, &OpenWorld, &mut actor).unwrap();
        state.enqueue_snapshot();

        let messages = state.drain_replication();
        let versions: Vec<_> = messages.iter().map(|message| message.version).collect();
        assert_eq!(versions, [1, 2, 3]);
        assert_eq!(messages[0].archetype, Some(zombie()));
        assert_eq!(messages[1].archetype, None);
        assert!(messages.iter().all(|message| message.actor_id == 7));
        assert!(state.drain_replication().is_empty());
    }
}
