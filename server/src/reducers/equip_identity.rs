use crate::{
    host::{load_services, ServerWorld},
    schema::*,
};
use shared::{ArchetypeId, IdentityChange};
use spacetimedb::ReducerContext;

/// Self-service equip: the caller switches their own actor to an unlocked archetype,
/// or clears it with `None`.
#[spacetimedb::reducer]
pub fn equip_identity(ctx: &ReducerContext, archetype: Option<String>) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    let Some(actor_id) = player.actor_id else {
        return Err("Actor not found".into());
    };

    let services = load_services(ctx)?;
    let archetype = archetype.map(ArchetypeId::new);

    let mut world = ServerWorld::new(ctx, &services);
    let change = world
        .equip_self(actor_id, archetype.as_ref())
        .map_err(|err| err.to_string())?;
    world.flush();

    match change {
        IdentityChange::Unchanged => {}
        IdentityChange::Equipped { previous, current } => {
            log::info!("{} equipped `{current}` (was {previous:?})", player.name);
        }
        IdentityChange::Cleared { previous } => {
            log::info!("{} cleared their identity (was {previous:?})", player.name);
        }
    }
    Ok(())
}
