//! Observer side of identity replication.
//!
//! Replication messages are applied to one [`IdentityReplica`] per actor in version
//! order. Every frame the render pass decides whether an actor is drawn as itself or
//! as its shadow; the result lands in [`RenderedIdentity`] and drives the tint.

use crate::actor::{ActorEntityMapping, ObservedActor, ObservedState, sync_actors};
use crate::session::Services;
use bevy::{platform::collections::HashMap, prelude::*};
use shared::{
    ActorId, ActorState, ArchetypeId, IdentityReplica, RenderDirective, ReplicaUpdate,
    ReplicationMessage,
};

pub const PRIMARY_TINT: Color = Color::srgb(0.82, 0.74, 0.62);

#[derive(Message, Clone, Debug)]
pub struct IdentityReplicated(pub ReplicationMessage);

#[derive(Resource, Default)]
pub struct Replicas(pub HashMap<ActorId, IdentityReplica>);

/// What an observed actor is drawn as.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub enum RenderedIdentity {
    #[default]
    Primary,
    Shadow(ArchetypeId),
}

pub(super) fn plugin(app: &mut App) {
    app.add_message::<IdentityReplicated>();
    app.init_resource::<Replicas>();
    app.add_systems(Update, apply_replication.after(sync_actors));
    app.add_systems(PostUpdate, (render_identities, tint_identities).chain());
}

/// Stable per-archetype color.
pub fn archetype_tint(archetype: &ArchetypeId) -> Color {
    let hash = archetype
        .as_str()
        .bytes()
        .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u32));
    Color::hsl((hash % 360) as f32, 0.55, 0.5)
}

pub fn apply_replication(
    mut messages: MessageReader<IdentityReplicated>,
    services: Res<Services>,
    mapping: Res<ActorEntityMapping>,
    mut replicas: ResMut<Replicas>,
    mut observed: Query<&mut ObservedState>,
) {
    for IdentityReplicated(message) in messages.read() {
        let replica = replicas
            .0
            .entry(message.actor_id)
            .or_insert_with(|| IdentityReplica::new(message.actor_id));

        // Messages can outrun the actor itself; apply against a scratch actor then.
        let mut scratch;
        let actor: &mut ActorState = match mapping
            .0
            .get(&message.actor_id)
            .and_then(|entity| observed.get_mut(*entity).ok())
        {
            Some(state) => &mut state.into_inner().0,
            None => {
                scratch = ActorState::new(message.actor_id);
                &mut scratch
            }
        };

        match replica.apply(message, &services.0, &shared::OpenWorld, actor) {
            ReplicaUpdate::Applied => {
                debug!("Actor {} identity v{}", message.actor_id, message.version)
            }
            ReplicaUpdate::Stale => {}
            ReplicaUpdate::Recovered(err) => {
                warn!("Actor {} identity reset: {err}", message.actor_id)
            }
        }
    }
}

pub fn render_identities(
    services: Res<Services>,
    mut replicas: ResMut<Replicas>,
    mut actors: Query<(&ObservedActor, &ObservedState, &mut RenderedIdentity)>,
) {
    let sync = services.0.sync();
    for (observed, state, mut rendered) in &mut actors {
        let next = match replicas.0.get_mut(&observed.id) {
            Some(replica) => match sync.render(&state.0, replica.state_mut()) {
                RenderDirective::Primary => RenderedIdentity::Primary,
                RenderDirective::Shadow => replica
                    .state()
                    .archetype()
                    .cloned()
                    .map_or(RenderedIdentity::Primary, RenderedIdentity::Shadow),
            },
            None => RenderedIdentity::Primary,
        };
        rendered.set_if_neq(next);
    }
}

fn tint_identities(
    mut materials: ResMut<Assets<StandardMaterial>>,
    actors: Query<(&RenderedIdentity, &MeshMaterial3d<StandardMaterial>), Changed<RenderedIdentity>>,
) {
    for (rendered, material) in &actors {
        let Some(material) = materials.get_mut(&material.0) else {
            continue;
        };
        material.base_color = match rendered {
            RenderedIdentity::Primary => PRIMARY_TINT,
            RenderedIdentity::Shadow(archetype) => archetype_tint(archetype),
        };
    }
}
