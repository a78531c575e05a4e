use bevy::prelude::*;

const GROUND_SIZE_M: f32 = 64.0;
/// Grid spacing, in meters, of the floor markers that make envelope sizes easy to judge.
const MARKER_SPACING_M: f32 = 4.0;

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(AmbientLight {
        brightness: 350.0,
        ..default()
    });
    app.add_systems(Startup, spawn_scene);
}

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("Spawning sandbox scene");

    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE_M, GROUND_SIZE_M).build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.27, 0.36, 0.3),
            perceptual_roughness: 1.0,
            ..default()
        })),
    ));

    let marker_mesh = meshes.add(Cuboid::new(0.1, 0.02, 0.1));
    let marker_material = materials.add(Color::srgb(0.5, 0.55, 0.5));
    let half = (GROUND_SIZE_M / MARKER_SPACING_M) as i32 / 2;
    for x in -half..=half {
        for z in -half..=half {
            commands.spawn((
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(marker_material.clone()),
                Transform::from_xyz(x as f32 * MARKER_SPACING_M, 0.01, z as f32 * MARKER_SPACING_M),
            ));
        }
    }

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(6.0, 14.0, -4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
