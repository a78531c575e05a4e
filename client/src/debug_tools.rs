//! Debug/performance tooling for native dev builds.
//!
//! Adds the perf overlay and draws every observed actor's collision envelope, orange
//! while it is rendered as a shadow.

use crate::actor::ObservedState;
use crate::identity::RenderedIdentity;
use bevy::color::palettes::css::{GRAY, ORANGE};
use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(PostUpdate, draw_envelopes);
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

fn draw_envelopes(mut gizmos: Gizmos, actors: Query<(&ObservedState, &RenderedIdentity)>) {
    for (state, rendered) in &actors {
        let actor = &state.0;
        let dimensions = actor.dimensions;
        let center = Vec3::new(
            actor.position.x,
            actor.position.y + dimensions.height * 0.5,
            actor.position.z,
        );
        let color = match rendered {
            RenderedIdentity::Primary => GRAY,
            RenderedIdentity::Shadow(_) => ORANGE,
        };
        gizmos.cuboid(
            Transform::from_translation(center).with_scale(Vec3::new(
                dimensions.width,
                dimensions.height,
                dimensions.width,
            )),
            color,
        );
    }
}
