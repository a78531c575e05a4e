mod reducers {
    mod connection;
    pub mod enter_world;
    pub mod equip_identity;
    pub(crate) mod identity_command;
    pub(crate) mod identity_tick;
    pub mod leave_world;
    pub mod mount;
    pub mod report_actor_state;
    pub mod set_name;
    pub mod settings;
    pub mod spawn_actor;
}
mod host;
pub mod schema;
pub mod types;

use crate::schema::*;
use reducers::identity_tick::init_identity_tick;
use shared::IdentityConfig;
use spacetimedb::*;

#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    ctx.db.identity_settings().id().delete(1);
    ctx.db
        .identity_settings()
        .insert(host::settings_row(ctx.sender, &IdentityConfig::default()));
    init_identity_tick(ctx);
}
