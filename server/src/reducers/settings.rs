use crate::{
    host::{config_from_settings, settings_row},
    schema::*,
};
use shared::{constants::OWNER_PERMISSION_LEVEL, IdentityConfig};
use spacetimedb::{ReducerContext, Table};

fn require_owner_level(ctx: &ReducerContext) -> Result<Player, String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };
    if player.permission_level < OWNER_PERMISSION_LEVEL {
        return Err("Insufficient permission level".into());
    }
    Ok(player)
}

/// Replaces the identity settings with a camelCase JSON document.
///
/// Missing keys take their defaults; invalid values reject the whole update. The
/// module owner recorded at `init` is kept.
#[spacetimedb::reducer]
pub fn update_identity_settings(ctx: &ReducerContext, config_json: String) -> Result<(), String> {
    let player = require_owner_level(ctx)?;
    let Some(current) = ctx.db.identity_settings().id().find(1) else {
        return Err("Identity settings not found".into());
    };

    let config = IdentityConfig::from_json(&config_json).map_err(|err| err.to_string())?;
    if config == config_from_settings(&current) {
        return Ok(());
    }

    log::info!("{} updated identity settings", player.name);
    ctx.db
        .identity_settings()
        .id()
        .update(settings_row(current.owner, &config));
    Ok(())
}

/// Sets another player's permission level for the `identity` command.
#[spacetimedb::reducer]
pub fn set_permission_level(ctx: &ReducerContext, name: String, level: u8) -> Result<(), String> {
    let issuer = require_owner_level(ctx)?;
    if level > OWNER_PERMISSION_LEVEL {
        return Err(format!("Permission level must be at most {OWNER_PERMISSION_LEVEL}"));
    }

    let Some(target) = ctx
        .db
        .player()
        .iter()
        .find(|player| player.name.eq_ignore_ascii_case(&name))
    else {
        return Err(format!("No player named `{name}`"));
    };

    log::info!("{} set {}'s permission level to {level}", issuer.name, target.name);
    ctx.db.player().identity().update(Player {
        permission_level: level,
        ..target
    });
    Ok(())
}
