//! Connection lifecycle reducers.
//!
//! These reducers handle Player row creation and cleanup for clients as they
//! connect to, and disconnect from, the authoritative module.
//!
//! Behavior
//! - On connect:
//!   - Ensure a `Player` row exists for the caller's identity.
//!   - Clear any dangling `actor_id` to start from a consistent state.
//!   - The identity that published the module always gets the owner permission level.
//! - On disconnect:
//!   - If a live `Actor` exists, persist its position and identity record back to
//!     the `Player` row, then despawn it (see `leave_world`).

use crate::{reducers::leave_world::despawn_player_actor, schema::*, types::DbVec3};
use shared::constants::{EMPTY_IDENTITY_ID, OWNER_PERMISSION_LEVEL};
use shared::IdentityRecord;
use spacetimedb::{Identity, ReducerContext, Table};

/// Default selector name for a fresh player: `p` followed by the first hex digits of
/// the identity, which keeps it within the 16-character name limit.
pub(crate) fn default_name(identity: Identity) -> String {
    let hex = identity.to_string();
    format!("p{}", &hex[..hex.len().min(12)])
}

fn is_owner(ctx: &ReducerContext, identity: Identity) -> bool {
    ctx.db
        .identity_settings()
        .id()
        .find(1)
        .is_some_and(|settings| settings.owner == identity)
}

/// Fired when a client connects to the module.
///
/// This reducer does not spawn an `Actor`. That is handled by `enter_world`.
#[spacetimedb::reducer(client_connected)]
pub fn identity_connected(ctx: &ReducerContext) {
    log::info!("Client connected: {:?}", ctx.sender);

    let owner = is_owner(ctx, ctx.sender);
    if let Some(player) = ctx.db.player().identity().find(ctx.sender) {
        let permission_level = if owner {
            OWNER_PERMISSION_LEVEL
        } else {
            player.permission_level
        };
        // Clear any dangling live actor reference on reconnect.
        ctx.db.player().identity().update(Player {
            actor_id: None,
            permission_level,
            ..player
        });
    } else {
        ctx.db.player().insert(Player {
            identity: ctx.sender,
            name: default_name(ctx.sender),
            permission_level: if owner { OWNER_PERMISSION_LEVEL } else { 0 },
            actor_id: None,
            translation: DbVec3::new(0.0, 64.0, 0.0),
            body_yaw: 0.0,
            identity_record: IdentityRecord::empty().to_json(),
        });
        log::debug!("Seeded player {:?} with an `{EMPTY_IDENTITY_ID}` identity", ctx.sender);
    }
}

/// Fired when a client disconnects from the module.
#[spacetimedb::reducer(client_disconnected)]
pub fn identity_disconnected(ctx: &ReducerContext) {
    log::info!("Client disconnected: {:?}", ctx.sender);

    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return;
    };
    despawn_player_actor(ctx, player);
}
