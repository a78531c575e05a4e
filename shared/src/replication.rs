//! Authoritative -> observer identity replication.
//!
//! Delivery is at-least-once and unordered. Every message is a full-state overwrite
//! stamped with the sender's monotonically increasing version, so an observer only
//! has to drop anything not newer than what it already applied.

use crate::{
    actor::{ActorHost, ActorId},
    archetype::{ArchetypeId, WorldContext},
    error::DeserializeError,
    identity::IdentityState,
    record::IdentityRecord,
    services::IdentityServices,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationMessage {
    pub actor_id: ActorId,
    /// `None` when the actor has no identity.
    pub archetype: Option<ArchetypeId>,
    pub snapshot: serde_json::Value,
    pub version: u64,
}

impl ReplicationMessage {
    /// The persisted-record form of this message.
    pub fn record(&self) -> IdentityRecord {
        match &self.archetype {
            Some(archetype) => IdentityRecord::equipped(archetype, self.snapshot.clone()),
            None => IdentityRecord::empty(),
        }
    }

    pub fn from_record(actor_id: ActorId, record: &IdentityRecord, version: u64) -> Self {
        Self {
            actor_id,
            archetype: record.archetype(),
            snapshot: record.entity_data.clone(),
            version,
        }
    }
}

#[derive(Debug)]
pub enum ReplicaUpdate {
    Applied,
    /// Not newer than the last applied version; ignored.
    Stale,
    /// Applied, but the payload could not be loaded and the replica fell back to empty.
    Recovered(DeserializeError),
}

/// Observer-side copy of one actor's identity.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityReplica {
    state: IdentityState,
    applied: Option<u64>,
}

impl IdentityReplica {
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            state: IdentityState::new(actor_id),
            applied: None,
        }
    }

    pub fn state(&self) -> &IdentityState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut IdentityState {
        &mut self.state
    }

    pub fn applied_version(&self) -> Option<u64> {
        self.applied
    }

    pub fn apply(
        &mut self,
        message: &ReplicationMessage,
        services: &IdentityServices,
        world: &dyn WorldContext,
        actor: &mut dyn ActorHost,
    ) -> ReplicaUpdate {
        if message.actor_id != self.state.owner() {
            log::warn!(
                "Replication for actor {} delivered to replica of {}",
                message.actor_id,
                self.state.owner()
            );
            return ReplicaUpdate::Stale;
        }
        if self.applied.is_some_and(|applied| message.version <= applied) {
            return ReplicaUpdate::Stale;
        }

        self.applied = Some(message.version);
        match self.state.overwrite(message, services, world, actor) {
            Ok(()) => ReplicaUpdate::Applied,
            Err(err) => {
                log::warn!("Actor {}: {err}", message.actor_id);
                ReplicaUpdate::Recovered(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{actor::ActorState, archetype::OpenWorld, config::IdentityConfig};

    fn authoritative_messages() -> Vec<ReplicationMessage> {
        let services = IdentityServices::vanilla(IdentityConfig::default());
        let mut actor = ActorState::new(3);
        let mut state = IdentityState::new(3);

        state
            .set_identity(Some(&"zombie".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        state
            .set_identity(Some(&"cow".into()), &services, &OpenWorld, &mut actor)
            .unwrap();
        state.drain_replication()
    }

    #[test]
    fn out_of_order_and_duplicate_messages_converge() {
        let services = IdentityServices::vanilla(IdentityConfig::default());
        let messages = authoritative_messages();
        let mut observed = ActorState::new(3);
        let mut replica = IdentityReplica::new(3);

        assert!(matches!(
            replica.apply(&messages[1], &services, &OpenWorld, &mut observed),
            ReplicaUpdate::Applied
        ));
        assert!(matches!(
            replica.apply(&messages[0], &services, &OpenWorld, &mut observed),
            ReplicaUpdate::Stale
        ));
        assert!(matches!(
            replica.apply(&messages[1], &services, &OpenWorld, &mut observed),
            ReplicaUpdate::Stale
        ));

        assert_eq!(replica.state().archetype(), Some(&"cow".into()));
        assert_eq!(replica.applied_version(), Some(2));
        assert_eq!(observed.dimensions.width, 0.9);
    }

    #[test]
    fn unknown_archetype_recovers_to_empty() {
        let services = IdentityServices::vanilla(IdentityConfig::default());
        let mut observed = ActorState::new(3);
        let mut replica = IdentityReplica::new(3);
        let message = ReplicationMessage {
            actor_id: 3,
            archetype: Some("dragonfly".into()),
            snapshot: serde_json::json!({}),
            version: 1,
        };

        let update = replica.apply(&message, &services, &OpenWorld, &mut observed);
        assert!(matches!(update, ReplicaUpdate::Recovered(DeserializeError::UnknownArchetype(_))));
        assert!(replica.state().identity().is_none());
    }

    #[test]
    fn wire_format_is_camel_case() {
        let message = ReplicationMessage {
            actor_id: 1,
            archetype: None,
            snapshot: serde_json::json!({}),
            version: 4,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "actorId": 1, "archetype": null, "snapshot": {}, "version": 4 })
        );
    }
}
