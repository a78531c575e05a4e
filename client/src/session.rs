//! Integrated authoritative side for offline play.
//!
//! Owns a [`LocalWorld`] with the local player and a few scripted actors, drives the
//! local player from input, runs the identity tick pass on the fixed timestep and
//! publishes replication messages for the observer side in [`crate::identity`].

use crate::identity::IdentityReplicated;
use crate::input::{HOTBAR_SLOTS, InputAction};
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use nalgebra::Point3;
use shared::{
    ActorFlag, ActorId, ArchetypeId, CommandSource, IDENTITY_TICK_HZ, IdentityConfig,
    IdentityServices, LocalWorld, OpenWorld, Pose, VehicleRef,
    constants::OWNER_PERMISSION_LEVEL,
};

/// Environment variable naming a JSON identity config file.
pub const CONFIG_ENV: &str = "IDENTITY_CONFIG";

/// Archetypes bound to the digit keys, in slot order.
pub const HOTBAR: [&str; HOTBAR_SLOTS as usize] = [
    "zombie", "wolf", "spider", "enderman", "chicken", "phantom", "villager", "pillager", "creeper",
];

const WALK_SPEED_MPS: f32 = 4.3;
const SPRINT_FACTOR: f32 = 1.3;
const SNEAK_FACTOR: f32 = 0.3;

#[derive(Resource, Clone, Debug)]
pub struct Services(pub IdentityServices);

#[derive(Resource, Debug)]
pub struct Session {
    pub world: LocalWorld,
    pub local: ActorId,
}

impl Session {
    /// The local player plus a pillager riding a ravager and an idle wolf.
    ///
    /// Every hotbar archetype is granted to the local player through the same command
    /// path an operator would use.
    pub fn new(services: &IdentityServices) -> Self {
        let mut world = LocalWorld::default();
        let local = world.spawn_player("Steve", Point3::origin());
        let rider = world.spawn_player("Alex", Point3::new(4.0, 0.0, 6.0));
        let ravager = world.spawn_prop("ravager", Point3::new(4.0, 0.0, 6.0));
        world.spawn_prop("wolf", Point3::new(-3.0, 0.0, 2.0));

        let auth = services.authorization(&OpenWorld);
        let console = CommandSource::console(OWNER_PERMISSION_LEVEL);
        let mut lines: Vec<String> = HOTBAR
            .iter()
            .map(|archetype| format!("identity grant Steve minecraft:{archetype}"))
            .collect();
        lines.push("identity equip Alex pillager".to_owned());

        for line in &lines {
            let outcome = auth.run(&mut world, &console, line);
            for feedback in outcome.feedback {
                debug!("[{}] {}", feedback.key, feedback.text);
            }
        }

        if let Some(alex) = world.actor_mut(rider) {
            alex.vehicle = Some(VehicleRef {
                actor_id: ravager,
                archetype: ArchetypeId::new("ravager"),
            });
        }

        Self { world, local }
    }
}

/// Reads the config named by [`CONFIG_ENV`], falling back to defaults.
pub fn load_config() -> IdentityConfig {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return IdentityConfig::default();
    };

    let loaded = std::fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|json| IdentityConfig::from_json(&json).map_err(|err| err.to_string()));
    match loaded {
        Ok(config) => {
            info!("Loaded identity config from {path}");
            config
        }
        Err(err) => {
            warn!("Ignoring {CONFIG_ENV}={path}: {err}");
            IdentityConfig::default()
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    let services = IdentityServices::vanilla(load_config());
    app.insert_resource(Session::new(&services));
    app.insert_resource(Services(services));
    app.insert_resource(Time::<Fixed>::from_hz(IDENTITY_TICK_HZ as f64));

    app.add_systems(Update, handle_hotbar);
    app.add_systems(
        FixedUpdate,
        (drive_local_actor, authoritative_tick, publish_replication).chain(),
    );
}

/// Which hotbar request, if any, was pressed this frame. `Some(None)` clears.
fn hotbar_request(action_state: &ActionState<InputAction>) -> Option<Option<ArchetypeId>> {
    if action_state.just_pressed(&InputAction::Unequip) {
        return Some(None);
    }
    (0..HOTBAR_SLOTS)
        .find(|slot| action_state.just_pressed(&InputAction::Hotbar(*slot)))
        .map(|slot| Some(ArchetypeId::new(HOTBAR[slot as usize])))
}

fn handle_hotbar(
    action_state: Res<ActionState<InputAction>>,
    services: Res<Services>,
    mut session: ResMut<Session>,
) {
    let Some(request) = hotbar_request(&action_state) else {
        return;
    };

    let local = session.local;
    match session
        .world
        .equip_self(local, request.as_ref(), &services.0, &OpenWorld)
    {
        Ok(change) => info!("Identity change: {change:?}"),
        Err(err) => warn!("Equip refused: {err}"),
    }
}

fn drive_local_actor(
    action_state: Res<ActionState<InputAction>>,
    services: Res<Services>,
    time: Res<Time>,
    mut session: ResMut<Session>,
) {
    let local = session.local;
    let shadow = session
        .world
        .identity(local)
        .and_then(|identity| identity.archetype().cloned());
    let Some(actor) = session.world.actor_mut(local) else {
        return;
    };

    actor.begin_frame();
    actor.age = actor.age.wrapping_add(1);

    let sneaking = action_state.pressed(&InputAction::Sneak);
    let sprinting = action_state.pressed(&InputAction::Sprint) && !sneaking;
    actor.set_flag(ActorFlag::Sneaking, sneaking);
    actor.set_flag(ActorFlag::Sprinting, sprinting);
    actor.set_flag(ActorFlag::Jumping, action_state.pressed(&InputAction::Jump));

    let axis = action_state.clamped_axis_pair(&InputAction::Move);
    if axis != Vec2::ZERO {
        let factor = match (sneaking, sprinting) {
            (true, _) => SNEAK_FACTOR,
            (_, true) => SPRINT_FACTOR,
            _ => 1.0,
        };
        let step = WALK_SPEED_MPS * factor * time.delta_secs();
        // Strafe on x, forward on z.
        actor.position.x -= axis.x * step;
        actor.position.z += axis.y * step;
        actor.limbs.distance += step;
        actor.limbs.angle += step * 0.6;

        let yaw = (-axis.x).atan2(axis.y).to_degrees();
        actor.body_yaw = yaw;
        actor.head_yaw = yaw;
    }

    let pose = if sneaking { Pose::Crouching } else { Pose::Standing };
    if actor.pose != pose {
        actor.pose = pose;
        services
            .0
            .dimension_adapter()
            .refresh(actor, shadow.as_ref());
    }
}

fn authoritative_tick(services: Res<Services>, mut session: ResMut<Session>) {
    session.world.tick(&services.0);
}

fn publish_replication(mut session: ResMut<Session>, mut writer: MessageWriter<IdentityReplicated>) {
    for message in session.world.drain_replication() {
        writer.write(IdentityReplicated(message));
    }
}
