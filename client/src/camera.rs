use crate::actor::LocalActor;
use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera);
    app.add_systems(PostUpdate, orbit_local_actor);
}

/// Behind and above the local actor, so the whole shadow stays in frame.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 6.0, -10.0);
const CAMERA_DECAY_RATE: f32 = 10.0;

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Transform::from_translation(CAMERA_OFFSET).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn orbit_local_actor(
    mut camera: Single<&mut Transform, With<Camera3d>>,
    local_actor: Single<&Transform, (With<LocalActor>, Without<Camera3d>)>,
    time: Res<Time>,
) {
    let focus = local_actor.translation;
    camera
        .translation
        .smooth_nudge(&(focus + CAMERA_OFFSET), CAMERA_DECAY_RATE, time.delta_secs());
    camera.look_at(focus, Vec3::Y);
}
