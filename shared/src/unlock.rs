//! Unlocked identities: what an actor may equip through the self-service path.

use crate::{
    actor::{ActorHost, ActorId},
    archetype::{ArchetypeId, WorldContext},
    error::EquipError,
    identity::{IdentityChange, IdentityState},
    services::IdentityServices,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedSet {
    owner: ActorId,
    archetypes: BTreeSet<ArchetypeId>,
}

impl UnlockedSet {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            archetypes: BTreeSet::new(),
        }
    }

    pub fn with_unlocked(owner: ActorId, archetypes: impl IntoIterator<Item = ArchetypeId>) -> Self {
        Self {
            owner,
            archetypes: archetypes.into_iter().collect(),
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Returns `false` if `archetype` was already unlocked.
    pub fn unlock(&mut self, archetype: ArchetypeId) -> bool {
        self.archetypes.insert(archetype)
    }

    /// Returns `false` if `archetype` was not unlocked.
    pub fn revoke(&mut self, archetype: &ArchetypeId) -> bool {
        self.archetypes.remove(archetype)
    }

    pub fn has(&self, archetype: &ArchetypeId) -> bool {
        self.archetypes.contains(archetype)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeId> {
        self.archetypes.iter()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Self-service equip. Clearing is always allowed; equipping needs an unlock.
pub fn equip_unlocked(
    unlocked: &UnlockedSet,
    identity: &mut IdentityState,
    archetype: Option<&ArchetypeId>,
    services: &IdentityServices,
    world: &dyn WorldContext,
    actor: &mut dyn ActorHost,
) -> Result<IdentityChange, EquipError> {
    if let Some(archetype) = archetype {
        if !unlocked.has(archetype) {
            return Err(EquipError::NotUnlocked(archetype.clone()));
        }
    }
    Ok(identity.set_identity(archetype, services, world, actor)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{actor::ActorState, archetype::OpenWorld, config::IdentityConfig};

    #[test]
    fn unlock_and_revoke_are_idempotent() {
        let mut unlocked = UnlockedSet::new(1);
        let cow = ArchetypeId::new("cow");

        assert!(unlocked.unlock(cow.clone()));
        assert!(!unlocked.unlock(cow.clone()));
        assert!(unlocked.has(&cow));
        assert_eq!(unlocked.len(), 1);

        assert!(unlocked.revoke(&cow));
        assert!(!unlocked.revoke(&cow));
        assert!(!unlocked.has(&cow));
    }

    #[test]
    fn self_service_requires_unlock() {
        let services = IdentityServices::vanilla(IdentityConfig::default());
        let mut actor = ActorState::new(1);
        let mut identity = IdentityState::new(1);
        let mut unlocked = UnlockedSet::new(1);
        let wolf = ArchetypeId::new("wolf");

        let err = equip_unlocked(&unlocked, &mut identity, Some(&wolf), &services, &OpenWorld, &mut actor)
            .unwrap_err();
        assert_eq!(err, EquipError::NotUnlocked(wolf.clone()));
        assert!(identity.identity().is_none());

        unlocked.unlock(wolf.clone());
        equip_unlocked(&unlocked, &mut identity, Some(&wolf), &services, &OpenWorld, &mut actor)
            .unwrap();
        assert!(identity.is_equipped_with(&wolf));

        unlocked.revoke(&wolf);
        equip_unlocked(&unlocked, &mut identity, None, &services, &OpenWorld, &mut actor).unwrap();
        assert!(identity.identity().is_none());
    }

    #[test]
    fn unlocked_but_unconstructible_fails() {
        let services = IdentityServices::vanilla(IdentityConfig::default());
        let mut actor = ActorState::new(1);
        let mut identity = IdentityState::new(1);
        let unlocked = UnlockedSet::with_unlocked(1, [ArchetypeId::new("boat")]);

        let err = equip_unlocked(
            &unlocked,
            &mut identity,
            Some(&"boat".into()),
            &services,
            &OpenWorld,
            &mut actor,
        )
        .unwrap_err();
        assert!(matches!(err, EquipError::Construction(_)));
    }
}
