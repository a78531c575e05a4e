use crate::{
    host::{load_identity, load_services},
    schema::*,
};
use shared::IdentityRecord;
use spacetimedb::{ReducerContext, Table};

/// Persists the live actor of `player` back onto the row and despawns it.
///
/// The identity record is serialized into `player.identity_record` so the same
/// identity is restored on the next `enter_world`. No-op when the player has no actor.
pub(crate) fn despawn_player_actor(ctx: &ReducerContext, mut player: Player) {
    let Some(actor_id) = player.actor_id else {
        // No live actor; nothing to do.
        return;
    };

    if let Some(actor) = ctx.db.actor().id().find(actor_id) {
        player.translation = actor.translation;
        player.body_yaw = actor.body_yaw;

        player.identity_record = match load_services(ctx) {
            Ok(services) => load_identity(ctx, &services, actor_id).serialize().to_json(),
            Err(err) => {
                log::warn!("Identity of actor {actor_id} not persisted: {err}");
                IdentityRecord::empty().to_json()
            }
        };

        // Anyone riding this actor loses their vehicle.
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
        ctx.db.actor().id().delete(actor.id);
    }
    ctx.db.identity_record().actor_id().delete(actor_id);

    player.actor_id = None;
    ctx.db.player().identity().update(player);
}

/// Leave the world: persist the caller's actor state and despawn the live actor.
///
/// Behavior:
/// - Validates a Player row exists for the caller.
/// - If no live actor exists, this is a no-op.
/// - Otherwise persists position and identity record, deletes the Actor and its
///   replicated `identity_record` row and clears `player.actor_id`.
#[spacetimedb::reducer]
pub fn leave_world(ctx: &ReducerContext) {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return;
    };
    despawn_player_actor(ctx, player);
}
