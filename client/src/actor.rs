use crate::identity::{PRIMARY_TINT, RenderedIdentity};
use crate::session::Session;
use bevy::{platform::collections::HashMap, prelude::*};
use shared::{ActorId, ActorState};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ActorEntityMapping>();
    app.add_systems(Startup, load_actor_mesh);
    app.add_systems(Update, sync_actors);
    app.add_systems(PostUpdate, place_actors);
}

/// Used to tie the simulation actor id to the local bevy entity
#[derive(Resource, Default)]
pub struct ActorEntityMapping(pub HashMap<ActorId, Entity>);

#[derive(Component)]
pub struct ObservedActor {
    pub id: ActorId,
}

/// Last known state of an observed actor, as the authoritative side reports it.
#[derive(Component, Clone, Debug)]
pub struct ObservedState(pub ActorState);

/// The actor driven by this client's input.
#[derive(Component)]
pub struct LocalActor;

/// Unit capsule: 1 m wide, 2 m tall. Scaled per actor from its collision envelope.
#[derive(Resource)]
struct ActorMesh(Handle<Mesh>);

fn load_actor_mesh(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(ActorMesh(meshes.add(Capsule3d::new(0.5, 1.0))));
}

/// Mirrors the session's actors into entities, spawning and despawning as needed.
pub fn sync_actors(
    mut commands: Commands,
    session: Res<Session>,
    mesh: Option<Res<ActorMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut mapping: ResMut<ActorEntityMapping>,
    mut observed: Query<&mut ObservedState>,
) {
    let Some(mesh) = mesh else {
        return;
    };

    for (id, local) in session.world.iter() {
        if let Some(entity) = mapping.0.get(&id) {
            if let Ok(mut state) = observed.get_mut(*entity) {
                state.0.clone_from(&local.state);
            }
            continue;
        }

        let mut entity = commands.spawn((
            Name::new(local.name.clone()),
            ObservedActor { id },
            ObservedState(local.state.clone()),
            RenderedIdentity::default(),
            Mesh3d(mesh.0.clone()),
            MeshMaterial3d(materials.add(PRIMARY_TINT)),
            Transform::default(),
        ));
        if id == session.local {
            entity.insert(LocalActor);
        }
        mapping.0.insert(id, entity.id());
    }

    mapping.0.retain(|id, entity| {
        let alive = session.world.get(*id).is_some();
        if !alive {
            commands.entity(*entity).despawn();
        }
        alive
    });
}

/// Capsule placement: feet at the actor position, sized from the collision envelope,
/// which follows the shadow's archetype while an identity is shown.
fn place_actors(mut actors: Query<(&ObservedState, &mut Transform)>) {
    for (state, mut transform) in &mut actors {
        let actor = &state.0;
        let dimensions = actor.dimensions;
        transform.translation = Vec3::new(
            actor.position.x,
            actor.position.y + dimensions.height * 0.5,
            actor.position.z,
        );
        transform.rotation = Quat::from_rotation_y(-actor.body_yaw.to_radians());
        transform.scale = Vec3::new(dimensions.width, dimensions.height * 0.5, dimensions.width);
    }
}
