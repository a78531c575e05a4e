use crate::schema::*;
use shared::Selector;
use spacetimedb::{ReducerContext, Table};

/// Renames the caller. Names are what command selectors match, so they follow the
/// selector rules (1-16 of `[A-Za-z0-9_]`) and are unique ignoring case.
#[spacetimedb::reducer]
pub fn set_name(ctx: &ReducerContext, name: String) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };

    if !matches!(name.parse::<Selector>(), Ok(Selector::Name(_))) {
        return Err(format!("`{name}` is not a valid player name"));
    }

    let taken = ctx
        .db
        .player()
        .iter()
        .any(|other| other.identity != ctx.sender && other.name.eq_ignore_ascii_case(&name));
    if taken {
        return Err(format!("`{name}` is already taken"));
    }

    log::info!("Player {:?} renamed `{}` -> `{name}`", ctx.sender, player.name);
    ctx.db.player().identity().update(Player { name, ..player });
    Ok(())
}
