//! An in-memory authoritative world.
//!
//! Holds actors together with their identity and unlock state and implements
//! [`IdentityHost`], so it can run commands, self-service equips and the tick pass
//! without a server. The client uses it for offline play.

use crate::{
    actor::{ActorHost, ActorId, ActorState},
    archetype::{ArchetypeId, WorldContext},
    command::{IdentityEntry, IdentityHost},
    error::EquipError,
    identity::{IdentityChange, IdentityState},
    replication::ReplicationMessage,
    services::IdentityServices,
    unlock::{UnlockedSet, equip_unlocked},
};
use nalgebra::Point3;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct LocalActor {
    pub name: String,
    pub state: ActorState,
    /// Present for primary actors only.
    pub identity: Option<IdentityState>,
    /// Present for players only.
    pub unlocked: Option<UnlockedSet>,
}

#[derive(Clone, Debug, Default)]
pub struct LocalWorld {
    actors: BTreeMap<ActorId, LocalActor>,
    next_id: ActorId,
}

impl LocalWorld {
    fn allocate(&mut self) -> ActorId {
        self.next_id += 1;
        self.next_id
    }

    /// Adds a player: a primary actor that can hold both an identity and unlocks.
    pub fn spawn_player(&mut self, name: &str, position: Point3<f32>) -> ActorId {
        let id = self.allocate();
        let mut state = ActorState::new(id);
        state.position = position;
        self.actors.insert(
            id,
            LocalActor {
                name: name.to_owned(),
                state,
                identity: Some(IdentityState::new(id)),
                unlocked: Some(UnlockedSet::new(id)),
            },
        );
        id
    }

    /// Adds an actor that is not primary and never holds an identity.
    pub fn spawn_prop(&mut self, archetype: &str, position: Point3<f32>) -> ActorId {
        let id = self.allocate();
        let mut state = ActorState::new(id).with_archetype(archetype);
        state.position = position;
        let name = state.archetype.to_string();
        self.actors.insert(
            id,
            LocalActor {
                name,
                state,
                identity: None,
                unlocked: None,
            },
        );
        id
    }

    pub fn get(&self, actor: ActorId) -> Option<&LocalActor> {
        self.actors.get(&actor)
    }

    pub fn actor(&self, actor: ActorId) -> Option<&ActorState> {
        self.actors.get(&actor).map(|local| &local.state)
    }

    pub fn actor_mut(&mut self, actor: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&actor).map(|local| &mut local.state)
    }

    pub fn identity(&self, actor: ActorId) -> Option<&IdentityState> {
        self.actors.get(&actor)?.identity.as_ref()
    }

    pub fn unlocked(&self, actor: ActorId) -> Option<&UnlockedSet> {
        self.actors.get(&actor)?.unlocked.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &LocalActor)> {
        self.actors.iter().map(|(id, local)| (*id, local))
    }

    /// Self-service equip on behalf of `actor`.
    pub fn equip_self(
        &mut self,
        actor: ActorId,
        archetype: Option<&ArchetypeId>,
        services: &IdentityServices,
        world: &dyn WorldContext,
    ) -> Result<IdentityChange, EquipError> {
        let local = self.actors.get_mut(&actor);
        let Some(LocalActor {
            state,
            identity: Some(identity),
            unlocked: Some(unlocked),
            ..
        }) = local
        else {
            return Err(EquipError::NotPrimary(actor));
        };
        equip_unlocked(unlocked, identity, archetype, services, world, state)
    }

    /// One authoritative step: the tick pass for every live shadow.
    ///
    /// Shadows whose snapshot changed are republished so observers do not drift.
    pub fn tick(&mut self, services: &IdentityServices) {
        let sync = services.sync();
        for local in self.actors.values_mut() {
            let Some(identity) = local.identity.as_mut() else {
                continue;
            };
            if identity.identity().is_none() {
                continue;
            }
            let before = identity.serialize();
            sync.tick(&local.state, identity);
            if identity.serialize() != before {
                identity.enqueue_snapshot();
            }
        }
    }

    /// Every replication message enqueued since the last drain.
    pub fn drain_replication(&mut self) -> Vec<ReplicationMessage> {
        self.actors
            .values_mut()
            .filter_map(|local| local.identity.as_mut())
            .flat_map(IdentityState::drain_replication)
            .collect()
    }
}

impl IdentityHost for LocalWorld {
    fn players(&self) -> Vec<ActorId> {
        self.iter()
            .filter(|(_, local)| local.unlocked.is_some())
            .map(|(id, _)| id)
            .collect()
    }

    fn entities(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    fn player_named(&self, name: &str) -> Option<ActorId> {
        self.iter()
            .find(|(_, local)| local.unlocked.is_some() && local.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    fn position(&self, actor: ActorId) -> Option<Point3<f32>> {
        self.actor(actor).map(|state| state.position)
    }

    fn display_name(&self, actor: ActorId) -> String {
        self.actors
            .get(&actor)
            .map(|local| local.name.clone())
            .unwrap_or_else(|| format!("#{actor}"))
    }

    fn unlocked_mut(&mut self, actor: ActorId) -> Option<&mut UnlockedSet> {
        self.actors.get_mut(&actor)?.unlocked.as_mut()
    }

    fn identity_entry(&mut self, actor: ActorId) -> Option<IdentityEntry<'_>> {
        let local = self.actors.get_mut(&actor)?;
        let state = local.identity.as_mut()?;
        Some(IdentityEntry {
            state,
            actor: &mut local.state as &mut dyn ActorHost,
        })
    }
}
