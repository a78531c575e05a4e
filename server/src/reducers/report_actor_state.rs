use crate::{
    host::{actor_state, load_services, write_back},
    schema::*,
    types::*,
};
use shared::{ArchetypeId, EMPTY_IDENTITY_ID};
use spacetimedb::ReducerContext;

/// Accepts the client-owned fields of the caller's actor.
///
/// Transform, animation counters, pose, movement flags and worn equipment come from
/// the client; health, envelope and vehicle stay module-owned. A pose change
/// recomputes the collision envelope for the effective archetype.
#[spacetimedb::reducer]
pub fn report_actor_state(ctx: &ReducerContext, report: ActorReport) -> Result<(), String> {
    if !report.is_finite() {
        return Err("Actor report contains non-finite values".into());
    }
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let Some(actor_id) = player.actor_id else {
        return Err("Actor not found".into());
    };
    let Some(mut actor) = ctx.db.actor().id().find(actor_id) else {
        return Err("Actor not found".into());
    };

    let pose_changed = actor.pose != report.pose;

    actor.translation = report.translation;
    actor.head_yaw = report.head_yaw;
    actor.body_yaw = report.body_yaw;
    actor.pitch = report.pitch;
    actor.limbs = report.limbs;
    actor.hand_swing = report.hand_swing;
    actor.left_handed = report.left_handed;
    actor.active_hand = report.active_hand;
    actor.pose = report.pose;
    actor.flags = report.flags;
    actor.equipment = report.equipment;
    actor.age = actor.age.wrapping_add(1);

    if pose_changed {
        let services = load_services(ctx)?;
        let shadow = ctx
            .db
            .identity_record()
            .actor_id()
            .find(actor_id)
            .filter(|row| row.archetype != EMPTY_IDENTITY_ID)
            .map(|row| ArchetypeId::new(&row.archetype));

        let mut state = actor_state(ctx, &actor);
        services
            .dimension_adapter()
            .refresh(&mut state, shadow.as_ref());
        write_back(&mut actor, &state);
    }

    ctx.db.actor().id().update(actor);
    Ok(())
}
