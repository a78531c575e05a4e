use crate::{
    host::{empty_record_row, load_services, record_row, upsert_record, write_back},
    schema::*,
    types::*,
};
use shared::{ActorState, IdentityRecord, IdentityState, OpenWorld};
use spacetimedb::{ReducerContext, Table};

/// Enter the world: (re)create the caller's live actor from their persisted Player state.
///
/// Behavior:
/// - Validates a Player row exists for the caller.
/// - Rejects if the caller already has a live actor.
/// - Spawns a new Actor row at the persisted position with baseline health.
/// - Loads the persisted identity record onto the actor. This refreshes the collision
///   envelope and publishes the identity through `identity_record`. An unreadable
///   record is logged and the actor starts without an identity.
/// - Sets `player.actor_id = Some(actor.id)`.
#[spacetimedb::reducer]
pub fn enter_world(ctx: &ReducerContext) -> Result<(), String> {
    let Some(mut player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("No player found!".into());
    };

    if player.actor_id.is_some() {
        return Err("Player is already in world".into());
    }

    let services = load_services(ctx)?;
    let baseline = services.config.baseline_max_health;
    let dimensions = ActorState::new(0).dimensions;
    let capsule = dimensions.capsule();

    let mut actor = ctx.db.actor().insert(Actor {
        id: 0,
        identity: Some(player.identity),
        is_player: true,
        archetype: shared::constants::PLAYER_ARCHETYPE.to_owned(),
        translation: player.translation,
        head_yaw: player.body_yaw,
        body_yaw: player.body_yaw,
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
        health: baseline,
        max_health_base: baseline,
        width: dimensions.width,
        height: dimensions.height,
        eye_height: dimensions.eye_height,
        capsule_radius: capsule.radius,
        capsule_half_height: capsule.half_height,
    });

    let mut state = crate::host::actor_state(ctx, &actor);
    let mut identity = IdentityState::new(actor.id);
    let loaded = IdentityRecord::from_json(&player.identity_record).and_then(|record| {
        identity.deserialize(&record, &services, &OpenWorld, &mut state)
    });
    match loaded {
        Ok(()) => {
            identity.enqueue_snapshot();
            let message = identity.replication_message();
            upsert_record(ctx, record_row(&message));
        }
        Err(err) => {
            log::warn!("Player {:?} identity record dropped: {err}", player.identity);
            upsert_record(ctx, empty_record_row(actor.id));
        }
    }

    write_back(&mut actor, &state);
    let actor = ctx.db.actor().id().update(actor);

    // Link back Player -> Actor.
    player.actor_id = Some(actor.id);
    ctx.db.player().identity().update(player);
    Ok(())
}
