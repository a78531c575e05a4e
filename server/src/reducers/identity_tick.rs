use crate::{
    host::{actor_state, load_services, record_of, record_row, upsert_record},
    schema::*,
};
use shared::{constants::IDENTITY_TICK_HZ, IdentityState, OpenWorld, EMPTY_IDENTITY_ID};
use spacetimedb::{ReducerContext, ScheduleAt, Table, TimeDuration, Timestamp};

#[spacetimedb::table(
    name = identity_tick_timer,
    scheduled(identity_tick_reducer)
)]
pub struct IdentityTickTimer {
    #[primary_key]
    #[auto_inc]
    pub scheduled_id: u64,
    pub scheduled_at: ScheduleAt,
    pub last_tick: Timestamp,
}

pub fn init_identity_tick(ctx: &ReducerContext) {
    let interval = TimeDuration::from_micros(1_000_000 / IDENTITY_TICK_HZ);
    ctx.db.identity_tick_timer().scheduled_id().delete(1);
    ctx.db.identity_tick_timer().insert(IdentityTickTimer {
        scheduled_id: 1,
        scheduled_at: ScheduleAt::Interval(interval),
        last_tick: ctx.timestamp,
    });
}

/// Authoritative tick pass: mirrors every live primary actor into its shadow.
///
/// Only shadows whose snapshot actually changed are republished, so idle players
/// cost no replication traffic.
#[spacetimedb::reducer]
fn identity_tick_reducer(ctx: &ReducerContext, mut timer: IdentityTickTimer) -> Result<(), String> {
    // Only the server (module identity) may invoke scheduled reducers.
    if ctx.sender != ctx.identity() {
        return Err("`identity_tick_reducer` may not be invoked by clients.".into());
    }

    let services = load_services(ctx)?;
    let sync = services.sync();

    let equipped: Vec<IdentityRecordRow> = ctx
        .db
        .identity_record()
        .iter()
        .filter(|row| row.archetype != EMPTY_IDENTITY_ID)
        .collect();

    for row in equipped {
        let Some(actor) = ctx.db.actor().id().find(row.actor_id) else {
            // Orphaned record; the actor left without cleanup.
            ctx.db.identity_record().actor_id().delete(row.actor_id);
            continue;
        };

        let record = record_of(&row);
        let mut identity = IdentityState::with_version(row.actor_id, row.version);
        if let Err(err) = identity.restore(&record, &services, &OpenWorld) {
            log::warn!("Actor {} identity reset during tick: {err}", row.actor_id);
            identity.enqueue_snapshot();
            upsert_record(ctx, record_row(&identity.replication_message()));
            continue;
        }

        let primary = actor_state(ctx, &actor);
        sync.tick(&primary, &mut identity);

        if identity.serialize() != record {
            identity.enqueue_snapshot();
            if let Some(latest) = identity.drain_replication().pop() {
                upsert_record(ctx, record_row(&latest));
            }
        }
    }

    timer.last_tick = ctx.timestamp;
    ctx.db.identity_tick_timer().scheduled_id().update(timer);
    Ok(())
}
