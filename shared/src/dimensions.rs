//! Dimension adapter: collision envelope of an actor given its effective archetype.
//!
//! The effective archetype is the shadow's archetype when an identity is equipped,
//! otherwise the actor's native archetype. The adapter is called on every identity
//! transition and is idempotent: recomputing with unchanged inputs writes the same
//! envelope again.

use crate::{
    actor::{ActorHost, Pose},
    archetype::{ArchetypeId, ArchetypeRegistry, Capability},
    constants::DEFAULT_EYE_HEIGHT_RATIO,
};
use serde::{Deserialize, Serialize};

/// Axis-aligned collision envelope (meters).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDimensions {
    pub width: f32,
    pub height: f32,
    pub eye_height: f32,
}

impl Default for EntityDimensions {
    /// Envelope of a standing player.
    fn default() -> Self {
        Self::new(0.6, 1.8).with_eye_height(1.62)
    }
}

impl EntityDimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            eye_height: height * DEFAULT_EYE_HEIGHT_RATIO,
        }
    }

    pub const fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    /// Y-aligned capsule inscribed in this envelope, as used by the character controller.
    ///
    /// Envelopes wider than they are tall degenerate to a sphere (`half_height == 0`).
    pub fn capsule(&self) -> CapsuleDimensions {
        let radius = self.width * 0.5;
        let half_height = (self.height * 0.5 - radius).max(0.0);
        CapsuleDimensions {
            radius,
            half_height,
        }
    }
}

/// Capsule parameters (meters). Total height = `2*half_height + 2*radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleDimensions {
    pub radius: f32,
    pub half_height: f32,
}

/// Recomputes actor envelopes from the archetype registry.
#[derive(Clone, Copy)]
pub struct DimensionAdapter<'a> {
    archetypes: &'a ArchetypeRegistry,
}

impl<'a> DimensionAdapter<'a> {
    pub fn new(archetypes: &'a ArchetypeRegistry) -> Self {
        Self { archetypes }
    }

    /// Envelope for `native` (or `shadow`, when present) in `pose`.
    pub fn effective(
        &self,
        native: &ArchetypeId,
        shadow: Option<&ArchetypeId>,
        pose: Pose,
    ) -> EntityDimensions {
        let archetype = shadow.unwrap_or(native);
        let Some(info) = self.archetypes.get(archetype) else {
            log::debug!("No dimensions registered for `{archetype}`; using the default envelope");
            return EntityDimensions::default();
        };

        let base = info.dimensions;
        match pose {
            Pose::Sleeping | Pose::Dying => EntityDimensions::new(0.2, 0.2).with_eye_height(0.2),
            Pose::Swimming | Pose::FallFlying if info.has(Capability::Humanoid) => {
                EntityDimensions::new(base.width, base.width).with_eye_height(base.width * 0.667)
            }
            Pose::Crouching if info.has(Capability::Humanoid) => {
                let height = base.height * (1.5 / 1.8);
                EntityDimensions::new(base.width, height)
                    .with_eye_height(base.eye_height * (1.27 / 1.62))
            }
            _ => base,
        }
    }

    /// Recomputes and writes the actor's envelope.
    pub fn refresh(&self, actor: &mut dyn ActorHost, shadow: Option<&ArchetypeId>) {
        let dimensions = self.effective(actor.native_archetype(), shadow, actor.pose());
        actor.set_dimensions(dimensions);
    }
}
