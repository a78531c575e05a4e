//! Per-archetype updater hooks.
//!
//! An [`Updater`] runs last in the render pass, after every generic field has been
//! mirrored, so it can override anything. Hooks are registered by archetype id once,
//! when the registry is built.

use crate::{
    actor::{ActorFlag, PrimaryActor},
    archetype::{ArchetypeId, ArchetypeRegistry, Capability},
    error::UpdaterError,
    shadow::{Shadow, ShadowFlag},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

pub trait Updater: Send + Sync {
    fn update(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) -> Result<(), UpdaterError>;
}

impl<F> Updater for F
where
    F: Fn(&dyn PrimaryActor, &mut Shadow) -> Result<(), UpdaterError> + Send + Sync,
{
    fn update(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) -> Result<(), UpdaterError> {
        self(primary, shadow)
    }
}

/// Clears the attack pose of archetypes that never attack.
#[derive(Clone, Copy, Debug, Default)]
pub struct SuppressAttack;

impl Updater for SuppressAttack {
    fn update(&self, _primary: &dyn PrimaryActor, shadow: &mut Shadow) -> Result<(), UpdaterError> {
        shadow.set_flag(ShadowFlag::Attacking, false);
        Ok(())
    }
}

/// Rotates models that face backwards relative to the actor's yaw.
#[derive(Clone, Copy, Debug)]
pub struct YawOffset {
    pub degrees: f32,
}

impl Updater for YawOffset {
    fn update(&self, _primary: &dyn PrimaryActor, shadow: &mut Shadow) -> Result<(), UpdaterError> {
        let state = &mut shadow.state;
        state.body_yaw += self.degrees;
        state.prev_body_yaw += self.degrees;
        state.head_yaw += self.degrees;
        state.prev_head_yaw += self.degrees;
        Ok(())
    }
}

/// Flaps wings whenever the actor is off the ground.
#[derive(Clone, Copy, Debug, Default)]
pub struct AirborneFlap;

impl Updater for AirborneFlap {
    fn update(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) -> Result<(), UpdaterError> {
        let airborne = !primary.is(ActorFlag::OnGround) && primary.vehicle().is_none();
        shadow.set_flag(ShadowFlag::Flapping, airborne);
        Ok(())
    }
}

/// Immutable archetype -> hook table.
#[derive(Clone, Default)]
pub struct UpdaterRegistry {
    updaters: BTreeMap<ArchetypeId, Arc<dyn Updater>>,
}

impl fmt::Debug for UpdaterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.updaters.keys()).finish()
    }
}

impl UpdaterRegistry {
    pub fn builder() -> UpdaterRegistryBuilder {
        UpdaterRegistryBuilder::default()
    }

    pub fn get(&self, archetype: &ArchetypeId) -> Option<&dyn Updater> {
        self.updaters.get(archetype).map(|updater| updater.as_ref())
    }

    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }

    /// Stock hooks, derived from the capabilities of `archetypes`.
    pub fn vanilla(archetypes: &ArchetypeRegistry) -> Self {
        let mut builder = Self::builder();
        for info in archetypes.iter().filter(|info| info.living) {
            if info.has(Capability::Passive) {
                builder = builder.register(info.id.clone(), SuppressAttack);
            }
            // Flying passives get wings; later registrations replace earlier ones.
            if info.has(Capability::Flying) && info.has(Capability::Passive) {
                builder = builder.register(info.id.clone(), AirborneFlap);
            }
        }
        builder
            .register("ender_dragon", YawOffset { degrees: 180.0 })
            .build()
    }
}

#[derive(Default)]
pub struct UpdaterRegistryBuilder {
    updaters: BTreeMap<ArchetypeId, Arc<dyn Updater>>,
}

impl UpdaterRegistryBuilder {
    pub fn register(mut self, archetype: impl Into<ArchetypeId>, updater: impl Updater + 'static) -> Self {
        self.updaters.insert(archetype.into(), Arc::new(updater));
        self
    }

    pub fn build(self) -> UpdaterRegistry {
        UpdaterRegistry {
            updaters: self.updaters,
        }
    }
}
