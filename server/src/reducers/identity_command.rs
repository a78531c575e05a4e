use crate::{
    host::{load_services, ServerWorld},
    schema::*,
};
use shared::{CommandSource, OpenWorld, Recipient};
use spacetimedb::{ReducerContext, Table};

/// Runs one `identity` command line on behalf of the caller.
///
/// The command itself never fails the reducer: a rejected line still produces a
/// `CommandReceipt` with exit code `0` plus the failure message, so clients can show
/// it. Confirmation lines are written as `CommandFeedback` rows addressed to the
/// issuer or to the affected players.
#[spacetimedb::reducer]
pub fn identity(ctx: &ReducerContext, line: String) -> Result<(), String> {
    let Some(player) = ctx.db.player().identity().find(ctx.sender) else {
        return Err("Player not found".into());
    };

    let services = load_services(ctx)?;
    let source = CommandSource {
        actor: player.actor_id,
        name: player.name.clone(),
        permission_level: player.permission_level,
    };

    let mut world = ServerWorld::new(ctx, &services);
    let outcome = services
        .authorization(&OpenWorld)
        .run(&mut world, &source, &line);
    world.flush();

    log::info!(
        "{} ran `{line}` -> {} ({} feedback lines)",
        player.name,
        outcome.exit_code,
        outcome.feedback.len()
    );

    let receipt = ctx.db.command_receipt().insert(CommandReceipt {
        id: 0,
        issuer: ctx.sender,
        line,
        exit_code: outcome.exit_code,
        issued_at: ctx.timestamp,
    });

    for feedback in outcome.feedback {
        let recipient = match feedback.recipient {
            Recipient::Source => Some(ctx.sender),
            Recipient::Actor(actor_id) => ctx
                .db
                .actor()
                .id()
                .find(actor_id)
                .and_then(|actor| actor.identity),
        };
        let Some(recipient) = recipient else {
            continue;
        };
        ctx.db.command_feedback().insert(CommandFeedback {
            id: 0,
            receipt_id: receipt.id,
            recipient,
            key: feedback.key.to_owned(),
            text: feedback.text,
        });
    }
    Ok(())
}
