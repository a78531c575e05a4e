//! Mirrors primary actor state into its shadow.
//!
//! Two passes share the work. The tick pass runs once per authoritative step and
//! covers gameplay-relevant state; the render pass runs once per frame on every
//! observer and covers animation, equipment and per-archetype quirks. Neither pass
//! does anything for an actor without a shadow.

use crate::{
    actor::{ActorFlag, Hand, PrimaryActor},
    archetype::{ArchetypeRegistry, Capability},
    bitmask_flags::BitmaskFlags,
    config::IdentityConfig,
    equipment::EquipmentSlot,
    identity::IdentityState,
    shadow::{Shadow, ShadowFlag},
    updater::UpdaterRegistry,
};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What the renderer should draw for an actor this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderDirective {
    /// No identity: draw the actor's own model.
    Primary,
    /// Draw the shadow in place of the actor, and suppress the actor's model.
    Shadow,
}

/// Flags the tick pass copies verbatim.
const TICK_FLAGS: [(ActorFlag, ShadowFlag); 5] = [
    (ActorFlag::Jumping, ShadowFlag::Jumping),
    (ActorFlag::Sprinting, ShadowFlag::Sprinting),
    (ActorFlag::Sneaking, ShadowFlag::Sneaking),
    (ActorFlag::Swimming, ShadowFlag::Swimming),
    (ActorFlag::FallFlying, ShadowFlag::FallFlying),
];

/// Bits every mirrored shadow carries.
fn inert_flags() -> BitmaskFlags<u32> {
    BitmaskFlags::of(&[ShadowFlag::Invulnerable, ShadowFlag::NoGravity])
}

/// `value`, or `previous` when `value` could not be persisted.
fn finite_or(value: f32, previous: f32) -> f32 {
    if value.is_finite() { value } else { previous }
}

#[derive(Clone, Copy)]
pub struct SyncEngine<'a> {
    archetypes: &'a ArchetypeRegistry,
    updaters: &'a UpdaterRegistry,
    config: &'a IdentityConfig,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        archetypes: &'a ArchetypeRegistry,
        updaters: &'a UpdaterRegistry,
        config: &'a IdentityConfig,
    ) -> Self {
        Self {
            archetypes,
            updaters,
            config,
        }
    }

    pub fn tick(&self, primary: &dyn PrimaryActor, identity: &mut IdentityState) {
        if let Some(shadow) = identity.identity_mut() {
            self.tick_pass(primary, shadow);
        }
    }

    pub fn render(&self, primary: &dyn PrimaryActor, identity: &mut IdentityState) -> RenderDirective {
        match identity.identity_mut() {
            Some(shadow) => self.render_pass(primary, shadow),
            None => RenderDirective::Primary,
        }
    }

    /// Non-finite primary values are skipped; the shadow keeps its previous value.
    pub fn tick_pass(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) {
        let state = &mut shadow.state;
        let position = primary.position();
        if position.coords.iter().all(|axis| axis.is_finite()) {
            state.position = position;
        }
        state.head_yaw = finite_or(primary.head_yaw(), state.head_yaw);
        state.stuck_arrows = primary.stuck_arrows();
        state.active_hand = primary.active_hand().unwrap_or_default();
        state.pose = primary.pose();
        state.fire_ticks = primary.fire_ticks();

        for (actor_flag, shadow_flag) in TICK_FLAGS {
            shadow.set_flag(shadow_flag, primary.is(actor_flag));
        }
        shadow.state.flags.bits |= inert_flags().bits;
        shadow.tick_active_item();

        if shadow.has(Capability::Tamable) {
            let sneaking = primary.is(ActorFlag::Sneaking);
            shadow.set_flag(ShadowFlag::Sitting, sneaking);
            shadow.set_flag(ShadowFlag::InSittingPose, sneaking);
        }
        if self
            .archetypes
            .has_capability(primary.native_archetype(), Capability::Tamable)
        {
            shadow.set_flag(ShadowFlag::Sneaking, primary.is(ActorFlag::Sitting));
        }
    }

    pub fn render_pass(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) -> RenderDirective {
        let pitch_sign = if shadow.has(Capability::InvertedPitch) { -1.0 } else { 1.0 };
        let state = &mut shadow.state;

        let limbs = primary.limbs();
        if limbs.is_finite() {
            state.limbs = limbs;
        }
        let hand_swing = primary.hand_swing();
        if hand_swing.is_finite() {
            state.hand_swing = hand_swing;
        }
        state.body_yaw = finite_or(primary.body_yaw(), state.body_yaw);
        state.prev_body_yaw = finite_or(primary.prev_body_yaw(), state.prev_body_yaw);
        state.head_yaw = finite_or(primary.head_yaw(), state.head_yaw);
        state.prev_head_yaw = finite_or(primary.prev_head_yaw(), state.prev_head_yaw);
        state.age = primary.age();
        state.preferred_arm = primary.preferred_arm();
        state.pitch = finite_or(primary.pitch() * pitch_sign, state.pitch);
        state.prev_pitch = finite_or(primary.prev_pitch() * pitch_sign, state.prev_pitch);

        if self.config.identities_equip_items {
            for slot in EquipmentSlot::HANDS {
                state.equipment.set(slot, primary.equipped(slot).cloned());
            }
        }
        if self.config.identities_equip_armor {
            for slot in EquipmentSlot::ARMOR {
                state.equipment.set(slot, primary.equipped(slot).cloned());
            }
        }

        state.vehicle = primary.vehicle().cloned();
        state.pose = primary.pose();
        state.active_hand = primary.active_hand().unwrap_or(Hand::MainHand);

        shadow.set_flag(ShadowFlag::TouchingWater, primary.is(ActorFlag::TouchingWater));
        if shadow.has(Capability::Mob) {
            shadow.set_flag(ShadowFlag::Attacking, primary.is(ActorFlag::UsingItem));
        }
        shadow.set_flag(ShadowFlag::UsingItem, primary.is(ActorFlag::UsingItem));
        shadow.tick_active_item();

        self.run_updater(primary, shadow);
        RenderDirective::Shadow
    }

    fn run_updater(&self, primary: &dyn PrimaryActor, shadow: &mut Shadow) {
        let Some(updater) = self.updaters.get(shadow.archetype()) else {
            return;
        };
        let archetype = shadow.archetype().clone();

        match catch_unwind(AssertUnwindSafe(|| updater.update(primary, shadow))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("{err}"),
            Err(_) => log::error!("Updater for `{archetype}` panicked; skipped for this frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actor::{ActorState, Pose, PrimaryActor, VehicleRef},
        archetype::{ArchetypeRegistry, OpenWorld},
        equipment::ItemStack,
        error::UpdaterError,
    };
    use nalgebra::Point3;

    fn shadow_of(id: &str) -> Shadow {
        ArchetypeRegistry::vanilla()
            .construct(&id.into(), &OpenWorld)
            .unwrap()
    }

    fn moving_actor() -> ActorState {
        let mut actor = ActorState::new(1);
        actor.position = Point3::new(10.0, 65.0, -2.0);
        actor.head_yaw = 90.0;
        actor.body_yaw = 80.0;
        actor.prev_body_yaw = 75.0;
        actor.pitch = 30.0;
        actor.prev_pitch = 25.0;
        actor.age = 1200;
        actor.limbs.distance = 3.5;
        actor.limbs.last_distance = 3.0;
        actor.fire_ticks = 40;
        actor.stuck_arrows = 2;
        actor.pose = Pose::Crouching;
        actor.set_flag(ActorFlag::Sprinting, true);
        actor.set_flag(ActorFlag::UsingItem, true);
        actor
            .equipment
            .set(EquipmentSlot::MainHand, Some(ItemStack::new("bow", 1)));
        actor
            .equipment
            .set(EquipmentSlot::Head, Some(ItemStack::new("iron_helmet", 1)));
        actor
    }

    #[test]
    fn tick_pass_mirrors_gameplay_state() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let actor = moving_actor();
        let mut shadow = shadow_of("zombie");

        engine.tick_pass(&actor, &mut shadow);

        assert_eq!(shadow.state.position, actor.position);
        assert_eq!(shadow.state.head_yaw, 90.0);
        assert_eq!(shadow.state.fire_ticks, 40);
        assert_eq!(shadow.state.stuck_arrows, 2);
        assert_eq!(shadow.state.pose, Pose::Crouching);
        assert!(shadow.flag(ShadowFlag::Sprinting));
        assert!(shadow.flag(ShadowFlag::Invulnerable));
        assert!(shadow.flag(ShadowFlag::NoGravity));
    }

    #[test]
    fn tamable_shadow_sits_while_sneaking() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut actor = ActorState::new(1);
        let mut wolf = shadow_of("wolf");

        actor.set_flag(ActorFlag::Sneaking, true);
        engine.tick_pass(&actor, &mut wolf);
        assert!(wolf.flag(ShadowFlag::InSittingPose));

        actor.set_flag(ActorFlag::Sneaking, false);
        engine.tick_pass(&actor, &mut wolf);
        assert!(!wolf.flag(ShadowFlag::Sitting));
    }

    #[test]
    fn tamable_primary_sneaks_only_while_sitting() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut cat = ActorState::new(1).with_archetype("cat");
        cat.set_flag(ActorFlag::Sitting, true);
        let mut shadow = shadow_of("zombie");

        engine.tick_pass(&cat, &mut shadow);
        assert!(shadow.flag(ShadowFlag::Sneaking));

        cat.set_flag(ActorFlag::Sitting, false);
        cat.set_flag(ActorFlag::Sneaking, true);
        engine.tick_pass(&cat, &mut shadow);
        assert!(!shadow.flag(ShadowFlag::Sneaking));
    }

    #[test]
    fn sitting_is_ignored_for_non_tamable_primaries() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut player = ActorState::new(1);
        player.set_flag(ActorFlag::Sitting, true);
        let mut shadow = shadow_of("zombie");

        engine.tick_pass(&player, &mut shadow);
        assert!(!shadow.flag(ShadowFlag::Sneaking));
    }

    #[test]
    fn non_finite_primary_values_keep_the_shadow_loadable() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut actor = moving_actor();
        let mut shadow = shadow_of("zombie");
        engine.tick_pass(&actor, &mut shadow);
        engine.render_pass(&actor, &mut shadow);

        actor.head_yaw = f32::NAN;
        actor.position.x = f32::INFINITY;
        actor.pitch = f32::NAN;
        actor.limbs.distance = f32::NAN;
        engine.tick_pass(&actor, &mut shadow);
        engine.render_pass(&actor, &mut shadow);

        assert_eq!(shadow.state.head_yaw, 90.0);
        assert_eq!(shadow.state.position.x, 10.0);
        assert_eq!(shadow.state.pitch, 30.0);
        assert_eq!(shadow.state.limbs.distance, 3.5);

        let mut restored = shadow_of("zombie");
        restored.load_entity_data(&shadow.entity_data()).unwrap();
        assert_eq!(restored, shadow);
    }

    #[test]
    fn render_pass_mirrors_animation_and_equipment() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut actor = moving_actor();
        actor.vehicle = Some(VehicleRef {
            actor_id: 5,
            archetype: "horse".into(),
        });
        let mut shadow = shadow_of("skeleton");

        let directive = engine.render_pass(&actor, &mut shadow);

        assert_eq!(directive, RenderDirective::Shadow);
        assert_eq!(shadow.state.limbs, actor.limbs);
        assert_eq!(shadow.state.prev_body_yaw, 75.0);
        assert_eq!(shadow.state.pitch, 30.0);
        assert_eq!(shadow.state.age, 1200);
        assert_eq!(shadow.state.active_hand, Hand::MainHand);
        assert_eq!(shadow.state.vehicle, actor.vehicle);
        assert!(shadow.flag(ShadowFlag::Attacking));
        assert!(shadow.flag(ShadowFlag::UsingItem));
        assert_eq!(
            shadow.state.equipment.get(EquipmentSlot::MainHand),
            Some(&ItemStack::new("bow", 1))
        );
        assert!(shadow.state.equipment.get(EquipmentSlot::Head).is_some());
    }

    #[test]
    fn equipment_mirroring_honors_config() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig {
            identities_equip_items: false,
            identities_equip_armor: false,
            ..IdentityConfig::default()
        };
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut shadow = shadow_of("zombie");

        engine.render_pass(&moving_actor(), &mut shadow);
        assert!(shadow.state.equipment.is_empty());
    }

    #[test]
    fn inverted_pitch_archetypes_negate_pitch() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut phantom = shadow_of("phantom");

        engine.render_pass(&moving_actor(), &mut phantom);
        assert_eq!(phantom.state.pitch, -30.0);
        assert_eq!(phantom.state.prev_pitch, -25.0);
    }

    #[test]
    fn updater_runs_after_generic_mirroring() {
        let updaters = UpdaterRegistry::builder()
            .register(
                "zombie",
                |_: &dyn PrimaryActor, shadow: &mut Shadow| -> Result<(), UpdaterError> {
                    shadow.state.pose = Pose::Standing;
                    Ok(())
                },
            )
            .build();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let mut shadow = shadow_of("zombie");

        engine.render_pass(&moving_actor(), &mut shadow);
        assert_eq!(shadow.state.pose, Pose::Standing);
    }

    #[test]
    fn failing_and_panicking_updaters_are_isolated() {
        let updaters = UpdaterRegistry::builder()
            .register(
                "zombie",
                |_: &dyn PrimaryActor, shadow: &mut Shadow| -> Result<(), UpdaterError> {
                    Err(UpdaterError::new(shadow.archetype(), "model missing"))
                },
            )
            .register(
                "creeper",
                |_: &dyn PrimaryActor, _: &mut Shadow| -> Result<(), UpdaterError> {
                    panic!("boom")
                },
            )
            .build();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let actor = moving_actor();

        let mut zombie = shadow_of("zombie");
        assert_eq!(engine.render_pass(&actor, &mut zombie), RenderDirective::Shadow);
        assert_eq!(zombie.state.age, 1200);

        let mut creeper = shadow_of("creeper");
        assert_eq!(engine.render_pass(&actor, &mut creeper), RenderDirective::Shadow);
        assert_eq!(creeper.state.age, 1200);
    }

    #[test]
    fn passes_are_noops_without_a_shadow() {
        let updaters = UpdaterRegistry::default();
        let config = IdentityConfig::default();
        let archetypes = ArchetypeRegistry::vanilla();
        let engine = SyncEngine::new(&archetypes, &updaters, &config);
        let actor = moving_actor();
        let mut identity = IdentityState::new(1);

        engine.tick(&actor, &mut identity);
        assert_eq!(engine.render(&actor, &mut identity), RenderDirective::Primary);
        assert!(identity.identity().is_none());
    }
}
