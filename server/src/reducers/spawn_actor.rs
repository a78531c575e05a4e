use crate::{host::load_services, schema::*, types::*};
use shared::{ArchetypeId, Pose};
use spacetimedb::{ReducerContext, Table};

/// Spawns a non-player actor (a mount, a command target) at `translation`.
///
/// Requires the `identity` command permission level. Spawned actors never hold an
/// identity or unlocks.
#[spacetimedb::reducer]
pub fn spawn_actor(ctx: &ReducerContext, archetype: String, translation: DbVec3) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let services = load_services(ctx)?;
    if player.permission_level < services.config.command_permission_level {
        return Err("Insufficient permission level".into());
    }

    let archetype = ArchetypeId::new(&archetype);
    let Some(info) = services.archetypes.get(&archetype) else {
        return Err(format!("Unknown archetype `{archetype}`"));
    };

    let dimensions = services
        .dimension_adapter()
        .effective(&archetype, None, Pose::Standing);
    let capsule = dimensions.capsule();

    let actor = ctx.db.actor().insert(Actor {
        id: 0,
        identity: None,
        is_player: false,
        archetype: archetype.to_string(),
        translation,
        head_yaw: 0.0,
        body_yaw: 0.0,
        pitch: 0.0,
        limbs: DbLimbs::default(),
        hand_swing: DbHandSwing::default(),
        age: 0,
        left_handed: false,
        active_hand: None,
        pose: DbPose::default(),
        flags: 0,
        fire_ticks: 0,
        stuck_arrows: 0,
        equipment: Vec::new(),
        vehicle_id: None,
        health: info.max_health,
        max_health_base: info.max_health,
        width: dimensions.width,
        height: dimensions.height,
        eye_height: dimensions.eye_height,
        capsule_radius: capsule.radius,
        capsule_half_height: capsule.half_height,
    });

    log::info!("{} spawned `{archetype}` as actor {}", player.name, actor.id);
    Ok(())
}

/// Removes a non-player actor spawned with `spawn_actor`.
#[spacetimedb::reducer]
pub fn despawn_actor(ctx: &ReducerContext, actor_id: u64) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let services = load_services(ctx)?;
    if player.permission_level < services.config.command_permission_level {
        return Err("Insufficient permission level".into());
    }

    let Some(actor) = ctx.db.actor().id().find(actor_id) else {
        return Err("Actor not found".into());
    };
    if actor.is_player {
        return Err("Player actors leave through `leave_world`".into());
    }

    let riders: Vec<Actor> = ctx
        .db
        .actor()
        .iter()
        .filter(|rider| rider.vehicle_id == Some(actor_id))
        .collect();
    for mut rider in riders {
        rider.vehicle_id = None;
        ctx.db.actor().id().update(rider);
    }
    ctx.db.actor().id().delete(actor_id);
    Ok(())
}
