//! Bridges the module's tables to the shared identity core.
//!
//! Rows are loaded into plain `ActorState` / `IdentityState` values on first use,
//! mutated by the shared services, and written back by [`ServerWorld::flush`].

use crate::{schema::*, types::*};
use nalgebra as na;
use shared::{
    constants::EMPTY_IDENTITY_ID, ActorId, ActorState, ArchetypeId, BitmaskFlags, EntityDimensions,
    EquipError, IdentityChange, IdentityConfig, IdentityEntry, IdentityHost, IdentityRecord,
    IdentityServices, IdentityState, OpenWorld, ReplicationMessage, UnlockedSet, VehicleRef,
};
use spacetimedb::{Identity, ReducerContext, Table};
use std::collections::{BTreeMap, BTreeSet};

pub fn config_from_settings(row: &IdentitySettings) -> IdentityConfig {
    IdentityConfig {
        scaling_health: row.scaling_health,
        max_health: row.max_health,
        identities_equip_items: row.identities_equip_items,
        identities_equip_armor: row.identities_equip_armor,
        log_commands: row.log_commands,
        baseline_max_health: row.baseline_max_health,
        command_permission_level: row.command_permission_level,
        mount_restrictions: row
            .mount_restrictions
            .iter()
            .map(|rule| {
                let riders = rule.riders.iter().map(ArchetypeId::new).collect();
                (rule.vehicle_id(), riders)
            })
            .collect(),
    }
}

pub fn settings_row(owner: Identity, config: &IdentityConfig) -> IdentitySettings {
    IdentitySettings {
        id: 1,
        owner,
        scaling_health: config.scaling_health,
        max_health: config.max_health,
        identities_equip_items: config.identities_equip_items,
        identities_equip_armor: config.identities_equip_armor,
        log_commands: config.log_commands,
        baseline_max_health: config.baseline_max_health,
        command_permission_level: config.command_permission_level,
        mount_restrictions: config
            .mount_restrictions
            .iter()
            .map(|(vehicle, riders)| DbMountRule {
                vehicle: vehicle.to_string(),
                riders: riders.iter().map(ToString::to_string).collect(),
            })
            .collect(),
    }
}

pub fn load_services(ctx: &ReducerContext) -> Result<IdentityServices, String> {
    let Some(settings) = ctx.db.identity_settings().id().find(1) else {
        return Err("Identity settings not found".into());
    };
    Ok(IdentityServices::vanilla(config_from_settings(&settings)))
}

/// Builds the shared actor view of a row.
pub fn actor_state(ctx: &ReducerContext, row: &Actor) -> ActorState {
    let mut state = ActorState::new(row.id).with_archetype(row.archetype.as_str());
    state.position = row.translation.into();
    state.head_yaw = row.head_yaw;
    state.prev_head_yaw = row.head_yaw;
    state.body_yaw = row.body_yaw;
    state.prev_body_yaw = row.body_yaw;
    state.pitch = row.pitch;
    state.prev_pitch = row.pitch;
    state.limbs = row.limbs.into();
    state.hand_swing = row.hand_swing.into();
    state.age = row.age;
    state.preferred_arm = arm_from_flag(row.left_handed);
    state.active_hand = row.active_hand.map(Into::into);
    state.pose = row.pose.into();
    state.flags = BitmaskFlags::new(row.flags);
    state.fire_ticks = row.fire_ticks;
    state.stuck_arrows = row.stuck_arrows;
    for stack in &row.equipment {
        state.equipment.set(stack.slot.into(), Some(stack.stack()));
    }
    state.vehicle = row.vehicle_id.and_then(|vehicle_id| {
        let vehicle = ctx.db.actor().id().find(vehicle_id)?;
        Some(VehicleRef {
            actor_id: vehicle_id,
            archetype: ArchetypeId::new(&vehicle.archetype),
        })
    });
    state.health = row.health;
    state.max_health_base = row.max_health_base;
    state.dimensions = EntityDimensions {
        width: row.width,
        height: row.height,
        eye_height: row.eye_height,
    };
    state
}

/// Copies the module-owned fields an identity change may touch back onto the row.
pub fn write_back(row: &mut Actor, state: &ActorState) {
    let capsule = state.dimensions.capsule();
    row.health = state.health;
    row.max_health_base = state.max_health_base;
    row.width = state.dimensions.width;
    row.height = state.dimensions.height;
    row.eye_height = state.dimensions.eye_height;
    row.capsule_radius = capsule.radius;
    row.capsule_half_height = capsule.half_height;
    row.vehicle_id = state.vehicle.as_ref().map(|vehicle| vehicle.actor_id);
}

/// Reads a replicated row back into a record.
///
/// Unparseable entity data is kept as a raw string so loading it reports corrupt data
/// instead of silently producing a default shadow.
pub fn record_of(row: &IdentityRecordRow) -> IdentityRecord {
    let entity_data = serde_json::from_str(&row.entity_data)
        .unwrap_or_else(|_| serde_json::Value::String(row.entity_data.clone()));
    IdentityRecord {
        id: row.archetype.clone(),
        entity_data,
    }
}

pub fn record_row(message: &ReplicationMessage) -> IdentityRecordRow {
    let record = message.record();
    IdentityRecordRow {
        actor_id: message.actor_id,
        archetype: record.id,
        entity_data: record.entity_data.to_string(),
        version: message.version,
    }
}

pub fn empty_record_row(actor_id: ActorId) -> IdentityRecordRow {
    IdentityRecordRow {
        actor_id,
        archetype: EMPTY_IDENTITY_ID.to_owned(),
        entity_data: "{}".to_owned(),
        version: 0,
    }
}

pub fn upsert_record(ctx: &ReducerContext, row: IdentityRecordRow) {
    if ctx.db.identity_record().actor_id().find(row.actor_id).is_some() {
        ctx.db.identity_record().actor_id().update(row);
    } else {
        ctx.db.identity_record().insert(row);
    }
}

/// Loads the identity of a live primary actor from its replicated row.
pub fn load_identity(
    ctx: &ReducerContext,
    services: &IdentityServices,
    actor_id: ActorId,
) -> IdentityState {
    let Some(row) = ctx.db.identity_record().actor_id().find(actor_id) else {
        return IdentityState::new(actor_id);
    };
    let mut state = IdentityState::with_version(actor_id, row.version);
    if let Err(err) = state.restore(&record_of(&row), services, &OpenWorld) {
        log::warn!("Actor {actor_id} identity reset: {err}");
    }
    state
}

struct LoadedActor {
    row: Actor,
    state: ActorState,
    /// Present for player actors only.
    identity: Option<IdentityState>,
}

struct LoadedUnlocks {
    owner: Identity,
    persisted: BTreeSet<ArchetypeId>,
    set: UnlockedSet,
}

/// Table-backed [`IdentityHost`] for a single reducer call.
pub struct ServerWorld<'a> {
    ctx: &'a ReducerContext,
    services: &'a IdentityServices,
    loaded: BTreeMap<ActorId, LoadedActor>,
    unlocked: BTreeMap<ActorId, LoadedUnlocks>,
}

impl<'a> ServerWorld<'a> {
    pub fn new(ctx: &'a ReducerContext, services: &'a IdentityServices) -> Self {
        Self {
            ctx,
            services,
            loaded: BTreeMap::new(),
            unlocked: BTreeMap::new(),
        }
    }

    fn load(&mut self, actor_id: ActorId) -> Option<&mut LoadedActor> {
        if !self.loaded.contains_key(&actor_id) {
            let row = self.ctx.db.actor().id().find(actor_id)?;
            let state = actor_state(self.ctx, &row);
            let identity = row
                .is_player
                .then(|| load_identity(self.ctx, self.services, actor_id));
            self.loaded.insert(
                actor_id,
                LoadedActor {
                    row,
                    state,
                    identity,
                },
            );
        }
        self.loaded.get_mut(&actor_id)
    }

    fn load_unlocks(&mut self, actor_id: ActorId) -> Option<&mut LoadedUnlocks> {
        if !self.unlocked.contains_key(&actor_id) {
            let owner = self.ctx.db.actor().id().find(actor_id)?.identity?;
            let persisted: BTreeSet<ArchetypeId> = self
                .ctx
                .db
                .unlocked_identity()
                .owner()
                .filter(owner)
                .map(|row| ArchetypeId::new(&row.archetype))
                .collect();
            let set = UnlockedSet::with_unlocked(actor_id, persisted.iter().cloned());
            self.unlocked.insert(
                actor_id,
                LoadedUnlocks {
                    owner,
                    persisted,
                    set,
                },
            );
        }
        self.unlocked.get_mut(&actor_id)
    }

    /// Self-service equip for the caller's own actor.
    pub fn equip_self(
        &mut self,
        actor_id: ActorId,
        archetype: Option<&ArchetypeId>,
    ) -> Result<IdentityChange, EquipError> {
        let services = self.services;
        if self.load_unlocks(actor_id).is_none() || self.load(actor_id).is_none() {
            return Err(EquipError::NotPrimary(actor_id));
        }
        let (Some(unlocks), Some(loaded)) =
            (self.unlocked.get(&actor_id), self.loaded.get_mut(&actor_id))
        else {
            return Err(EquipError::NotPrimary(actor_id));
        };
        let Some(identity) = loaded.identity.as_mut() else {
            return Err(EquipError::NotPrimary(actor_id));
        };
        shared::equip_unlocked(
            &unlocks.set,
            identity,
            archetype,
            services,
            &OpenWorld,
            &mut loaded.state,
        )
    }

    /// Writes every touched row back: actor envelopes, replicated identities and unlocks.
    pub fn flush(self) {
        for (_, mut loaded) in self.loaded {
            write_back(&mut loaded.row, &loaded.state);
            self.ctx.db.actor().id().update(loaded.row);

            let Some(mut identity) = loaded.identity else {
                continue;
            };
            if let Some(latest) = identity.drain_replication().pop() {
                upsert_record(self.ctx, record_row(&latest));
            }
        }

        for (_, unlocks) in self.unlocked {
            let current: BTreeSet<ArchetypeId> = unlocks.set.iter().cloned().collect();
            for row in self.ctx.db.unlocked_identity().owner().filter(unlocks.owner) {
                if !current.contains(&ArchetypeId::new(&row.archetype)) {
                    self.ctx.db.unlocked_identity().id().delete(row.id);
                }
            }
            for archetype in current.difference(&unlocks.persisted) {
                self.ctx.db.unlocked_identity().insert(UnlockedIdentity {
                    id: 0,
                    owner: unlocks.owner,
                    archetype: archetype.to_string(),
                });
            }
        }
    }
}

impl IdentityHost for ServerWorld<'_> {
    fn players(&self) -> Vec<ActorId> {
        self.ctx
            .db
            .actor()
            .is_player()
            .filter(true)
            .map(|row| row.id)
            .collect()
    }

    fn entities(&self) -> Vec<ActorId> {
        self.ctx.db.actor().iter().map(|row| row.id).collect()
    }

    fn player_named(&self, name: &str) -> Option<ActorId> {
        self.ctx
            .db
            .player()
            .iter()
            .find(|player| player.name.eq_ignore_ascii_case(name))
            .and_then(|player| player.actor_id)
    }

    fn position(&self, actor: ActorId) -> Option<na::Point3<f32>> {
        if let Some(loaded) = self.loaded.get(&actor) {
            return Some(loaded.state.position);
        }
        self.ctx
            .db
            .actor()
            .id()
            .find(actor)
            .map(|row| row.translation.into())
    }

    fn display_name(&self, actor: ActorId) -> String {
        let Some(row) = self.ctx.db.actor().id().find(actor) else {
            return format!("#{actor}");
        };
        row.identity
            .and_then(|identity| self.ctx.db.player().identity().find(identity))
            .map(|player| player.name)
            .unwrap_or(row.archetype)
    }

    fn unlocked_mut(&mut self, actor: ActorId) -> Option<&mut UnlockedSet> {
        self.load_unlocks(actor).map(|unlocks| &mut unlocks.set)
    }

    fn identity_entry(&mut self, actor: ActorId) -> Option<IdentityEntry<'_>> {
        let loaded = self.load(actor)?;
        let state = loaded.identity.as_mut()?;
        Some(IdentityEntry {
            state,
            actor: &mut loaded.state,
        })
    }
}
