use crate::{host::load_services, schema::*};
use shared::{ArchetypeId, EMPTY_IDENTITY_ID};
use spacetimedb::ReducerContext;

/// Mounts the caller's actor on `vehicle_id`, or dismounts with `None`.
///
/// The rider is the caller's effective archetype: the equipped identity when there
/// is one, otherwise the native archetype. Vehicles with a mount restriction only
/// accept the riders listed for them.
#[spacetimedb::reducer]
pub fn mount(ctx: &ReducerContext, vehicle_id: Option<u64>) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let Some(actor_id) = player.actor_id else {
        return Err("Actor not found".into());
    };
    let Some(mut actor) = ctx.db.actor().id().find(actor_id) else {
        return Err("Actor not found".into());
    };

    let Some(vehicle_id) = vehicle_id else {
        actor.vehicle_id = None;
        ctx.db.actor().id().update(actor);
        return Ok(());
    };

    if vehicle_id == actor_id {
        return Err("An actor cannot ride itself".into());
    }
    let Some(vehicle) = ctx.db.actor().id().find(vehicle_id) else {
        return Err("Vehicle not found".into());
    };

    let services = load_services(ctx)?;
    let rider = ctx
        .db
        .identity_record()
        .actor_id()
        .find(actor_id)
        .filter(|row| row.archetype != EMPTY_IDENTITY_ID)
        .map(|row| ArchetypeId::new(&row.archetype))
        .unwrap_or_else(|| ArchetypeId::new(&actor.archetype));
    let vehicle_archetype = ArchetypeId::new(&vehicle.archetype);

    if !services.config.may_ride(&vehicle_archetype, &rider) {
        return Err(format!("`{rider}` may not ride `{vehicle_archetype}`"));
    }

    actor.vehicle_id = Some(vehicle_id);
    ctx.db.actor().id().update(actor);
    Ok(())
}
