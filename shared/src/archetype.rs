//! Archetype registry: what can be projected onto an actor and how to build it.
//!
//! An archetype is a kind of entity (a creature type). The registry maps each
//! [`ArchetypeId`] to the metadata needed to construct a [`Shadow`] for it and to
//! derive its collision envelope. Type-specific behavior is expressed as
//! [`Capability`] bits resolved once when the registry is built, so per-frame code
//! only tests bits instead of re-inspecting types.
//!
//! The registry is immutable once built and is passed explicitly to whatever needs it
//! (see [`crate::IdentityServices`]).

use crate::{
    bitmask_flags::BitmaskFlags,
    constants::{ARCHETYPE_NAMESPACE, EMPTY_IDENTITY_ID, PLAYER_ARCHETYPE},
    define_bitmask_flags,
    dimensions::EntityDimensions,
    error::ConstructionError,
    shadow::Shadow,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Opaque, normalized archetype identifier (e.g. `"zombie"`).
///
/// Normalization lowercases, trims, and strips the [`ARCHETYPE_NAMESPACE`] prefix, so
/// `"minecraft:Zombie"` and `"zombie"` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ArchetypeId(String);

impl ArchetypeId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim().to_ascii_lowercase();
        let id = trimmed
            .strip_prefix(ARCHETYPE_NAMESPACE)
            .map(str::to_owned)
            .unwrap_or(trimmed);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archetype of a plain player actor.
    pub fn player() -> Self {
        Self(PLAYER_ARCHETYPE.to_owned())
    }

    /// Whether a raw persisted id denotes "no identity".
    ///
    /// Blank ids and the legacy namespaced sentinel normalize to empty as well.
    pub fn is_empty_sentinel(raw: &str) -> bool {
        let normalized = Self::new(raw);
        normalized.0.is_empty() || normalized.0 == EMPTY_IDENTITY_ID
    }
}

impl From<String> for ArchetypeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ArchetypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ArchetypeId> for String {
    fn from(value: ArchetypeId) -> Self {
        value.0
    }
}

impl FromStr for ArchetypeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

define_bitmask_flags!(
    /// Type-specific traits of an archetype that the sync engine reacts to.
    Capability, u8, {
        /// Can sit on command; mirrors sneaking as a sitting pose.
        Tamable,
        /// Hostile-style mob with an attacking render state.
        Mob,
        /// Model renders with the opposite pitch sign.
        InvertedPitch,
        /// Never shows an attack state.
        Passive,
        /// Flies rather than walks.
        Flying,
        /// Humanoid body plan; uses player-like pose envelopes.
        Humanoid,
    }
);

/// Construction metadata for one archetype.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeInfo {
    pub id: ArchetypeId,
    pub display_name: String,
    /// Whether privileged and self-service paths may build a shadow of this archetype.
    pub summonable: bool,
    /// Non-living archetypes (boats, armor stands) are never valid shadows.
    pub living: bool,
    pub max_health: f32,
    pub dimensions: EntityDimensions,
    pub capabilities: BitmaskFlags<u8>,
}

impl ArchetypeInfo {
    pub fn new(id: impl Into<ArchetypeId>, max_health: f32, dimensions: EntityDimensions) -> Self {
        let id = id.into();
        Self {
            display_name: display_name_for(&id),
            id,
            summonable: true,
            living: true,
            max_health,
            dimensions,
            capabilities: BitmaskFlags::default(),
        }
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.capabilities.add(capability);
        self
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn not_summonable(mut self) -> Self {
        self.summonable = false;
        self
    }

    pub fn non_living(mut self) -> Self {
        self.living = false;
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    /// Translation key for chat feedback, e.g. `entity.minecraft.zombie`.
    pub fn translation_key(&self) -> String {
        format!("entity.minecraft.{}", self.id)
    }
}

/// "ender_dragon" -> "Ender Dragon"
fn display_name_for(id: &ArchetypeId) -> String {
    id.as_str()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The construction environment a shadow is built in.
///
/// Engine integrations may refuse archetypes that cannot exist in the current
/// world (e.g. a dimension that forbids them).
pub trait WorldContext {
    fn permits(&self, _archetype: &ArchetypeInfo) -> bool {
        true
    }
}

/// A world that accepts every registered archetype.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenWorld;

impl WorldContext for OpenWorld {}

/// Immutable lookup table of archetypes.
#[derive(Clone, Debug, Default)]
pub struct ArchetypeRegistry {
    archetypes: BTreeMap<ArchetypeId, ArchetypeInfo>,
}

impl ArchetypeRegistry {
    pub fn builder() -> ArchetypeRegistryBuilder {
        ArchetypeRegistryBuilder::default()
    }

    pub fn get(&self, id: &ArchetypeId) -> Option<&ArchetypeInfo> {
        self.archetypes.get(id)
    }

    pub fn contains(&self, id: &ArchetypeId) -> bool {
        self.archetypes.contains_key(id)
    }

    /// Returns the archetype only when it may be projected onto an actor.
    pub fn summonable(&self, id: &ArchetypeId) -> Option<&ArchetypeInfo> {
        self.get(id).filter(|info| info.summonable && info.living)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeInfo> {
        self.archetypes.values()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn has_capability(&self, id: &ArchetypeId, capability: Capability) -> bool {
        self.get(id).is_some_and(|info| info.has(capability))
    }

    /// Builds a fresh, default-state shadow of `id`.
    pub fn construct(
        &self,
        id: &ArchetypeId,
        world: &dyn WorldContext,
    ) -> Result<Shadow, ConstructionError> {
        let info = self
            .get(id)
            .ok_or_else(|| ConstructionError::Unknown(id.clone()))?;
        if !info.summonable {
            return Err(ConstructionError::NotSummonable(id.clone()));
        }
        if !info.living {
            return Err(ConstructionError::NotLiving(id.clone()));
        }
        if !world.permits(info) {
            return Err(ConstructionError::Rejected(id.clone()));
        }
        Ok(Shadow::new(info))
    }

    /// The stock archetype table.
    pub fn vanilla() -> Self {
        use Capability::*;
        let d = EntityDimensions::new;

        Self::builder()
            .register(
                ArchetypeInfo::new(PLAYER_ARCHETYPE, 20.0, d(0.6, 1.8).with_eye_height(1.62))
                    .with(Humanoid)
                    .not_summonable(),
            )
            // Hostile humanoids
            .register(
                ArchetypeInfo::new("zombie", 20.0, d(0.6, 1.95).with_eye_height(1.74))
                    .with(Mob)
                    .with(Humanoid),
            )
            .register(
                ArchetypeInfo::new("husk", 20.0, d(0.6, 1.95).with_eye_height(1.74))
                    .with(Mob)
                    .with(Humanoid),
            )
            .register(
                ArchetypeInfo::new("skeleton", 20.0, d(0.6, 1.99).with_eye_height(1.74))
                    .with(Mob)
                    .with(Humanoid),
            )
            .register(ArchetypeInfo::new("pillager", 24.0, d(0.6, 1.95)).with(Mob).with(Humanoid))
            .register(ArchetypeInfo::new("vindicator", 24.0, d(0.6, 1.95)).with(Mob).with(Humanoid))
            .register(ArchetypeInfo::new("evoker", 24.0, d(0.6, 1.95)).with(Mob).with(Humanoid))
            .register(ArchetypeInfo::new("illusioner", 32.0, d(0.6, 1.95)).with(Mob).with(Humanoid))
            .register(ArchetypeInfo::new("witch", 26.0, d(0.6, 1.95)).with(Mob).with(Humanoid))
            .register(
                ArchetypeInfo::new("enderman", 40.0, d(0.6, 2.9).with_eye_height(2.55))
                    .with(Mob)
                    .with(Humanoid),
            )
            // Other hostiles
            .register(ArchetypeInfo::new("creeper", 20.0, d(0.6, 1.7)).with(Mob))
            .register(ArchetypeInfo::new("spider", 16.0, d(1.4, 0.9).with_eye_height(0.65)).with(Mob))
            .register(ArchetypeInfo::new("blaze", 20.0, d(0.6, 1.8)).with(Mob).with(Flying))
            .register(
                ArchetypeInfo::new("phantom", 20.0, d(0.9, 0.5).with_eye_height(0.175))
                    .with(Mob)
                    .with(Flying)
                    .with(InvertedPitch),
            )
            .register(ArchetypeInfo::new("ravager", 100.0, d(1.95, 2.2)).with(Mob))
            .register(
                ArchetypeInfo::new("ender_dragon", 200.0, d(16.0, 8.0))
                    .with(Mob)
                    .with(Flying),
            )
            // Neutral and passive
            .register(ArchetypeInfo::new("iron_golem", 100.0, d(1.4, 2.7)))
            .register(ArchetypeInfo::new("villager", 20.0, d(0.6, 1.95)).with(Passive).with(Humanoid))
            .register(ArchetypeInfo::new("cow", 10.0, d(0.9, 1.4).with_eye_height(1.3)).with(Passive))
            .register(ArchetypeInfo::new("pig", 10.0, d(0.9, 0.9)).with(Passive))
            .register(ArchetypeInfo::new("sheep", 8.0, d(0.9, 1.3).with_eye_height(1.235)).with(Passive))
            .register(ArchetypeInfo::new("chicken", 4.0, d(0.4, 0.7).with_eye_height(0.644)).with(Passive))
            .register(ArchetypeInfo::new("horse", 30.0, d(1.3965, 1.6)).with(Passive))
            .register(ArchetypeInfo::new("wolf", 8.0, d(0.6, 0.85).with_eye_height(0.68)).with(Tamable))
            .register(
                ArchetypeInfo::new("cat", 10.0, d(0.6, 0.7).with_eye_height(0.35))
                    .with(Tamable)
                    .with(Passive),
            )
            .register(
                ArchetypeInfo::new("parrot", 6.0, d(0.5, 0.9).with_eye_height(0.54))
                    .with(Tamable)
                    .with(Passive)
                    .with(Flying),
            )
            .register(
                ArchetypeInfo::new("bat", 6.0, d(0.5, 0.9).with_eye_height(0.45))
                    .with(Passive)
                    .with(Flying),
            )
            // Vehicles and props that can never be a shadow
            .register(ArchetypeInfo::new("boat", 1.0, d(1.375, 0.5625)).non_living())
            .register(ArchetypeInfo::new("minecart", 1.0, d(0.98, 0.7)).non_living())
            .register(ArchetypeInfo::new("armor_stand", 20.0, d(0.5, 1.975)).non_living())
            .build()
    }
}

#[derive(Debug, Default)]
pub struct ArchetypeRegistryBuilder {
    archetypes: BTreeMap<ArchetypeId, ArchetypeInfo>,
}

impl ArchetypeRegistryBuilder {
    /// Adds (or replaces) an archetype.
    pub fn register(mut self, info: ArchetypeInfo) -> Self {
        if self.archetypes.contains_key(&info.id) {
            log::warn!("Archetype `{}` registered twice; keeping the latest", info.id);
        }
        self.archetypes.insert(info.id.clone(), info);
        self
    }

    pub fn build(self) -> ArchetypeRegistry {
        ArchetypeRegistry {
            archetypes: self.archetypes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoEndermen;

    impl WorldContext for NoEndermen {
        fn permits(&self, archetype: &ArchetypeInfo) -> bool {
            archetype.id.as_str() != "enderman"
        }
    }

    #[test]
    fn ids_normalize_namespace_and_case() {
        assert_eq!(ArchetypeId::new("minecraft:Zombie"), ArchetypeId::new("zombie"));
        assert_eq!(ArchetypeId::new("  cow ").as_str(), "cow");
    }

    #[test]
    fn empty_sentinel_variants() {
        assert!(ArchetypeId::is_empty_sentinel("empty"));
        assert!(ArchetypeId::is_empty_sentinel("minecraft:empty"));
        assert!(ArchetypeId::is_empty_sentinel(""));
        assert!(!ArchetypeId::is_empty_sentinel("zombie"));
    }

    #[test]
    fn deserialized_ids_are_normalized() {
        let id: ArchetypeId = serde_json::from_str("\"minecraft:phantom\"").unwrap();
        assert_eq!(id.as_str(), "phantom");
    }

    #[test]
    fn display_names_are_title_cased() {
        let registry = ArchetypeRegistry::vanilla();
        let dragon = registry.get(&"ender_dragon".into()).unwrap();
        assert_eq!(dragon.display_name, "Ender Dragon");
        assert_eq!(dragon.translation_key(), "entity.minecraft.ender_dragon");
    }

    #[test]
    fn construct_rejects_unknown_and_non_living() {
        let registry = ArchetypeRegistry::vanilla();

        assert_eq!(
            registry.construct(&"unicorn".into(), &OpenWorld).unwrap_err(),
            ConstructionError::Unknown("unicorn".into())
        );
        assert_eq!(
            registry.construct(&"boat".into(), &OpenWorld).unwrap_err(),
            ConstructionError::NotLiving("boat".into())
        );
        assert_eq!(
            registry.construct(&"player".into(), &OpenWorld).unwrap_err(),
            ConstructionError::NotSummonable("player".into())
        );
    }

    #[test]
    fn construct_honors_world_context() {
        let registry = ArchetypeRegistry::vanilla();
        assert_eq!(
            registry.construct(&"enderman".into(), &NoEndermen).unwrap_err(),
            ConstructionError::Rejected("enderman".into())
        );

        let shadow = registry.construct(&"zombie".into(), &NoEndermen).unwrap();
        assert_eq!(shadow.archetype().as_str(), "zombie");
        assert_eq!(shadow.state.health, 20.0);
    }

    #[test]
    fn capabilities_resolve_at_registration() {
        let registry = ArchetypeRegistry::vanilla();
        assert!(registry.has_capability(&"phantom".into(), Capability::InvertedPitch));
        assert!(registry.has_capability(&"wolf".into(), Capability::Tamable));
        assert!(!registry.has_capability(&"zombie".into(), Capability::Passive));
        assert!(!registry.has_capability(&"nothing".into(), Capability::Mob));
    }
}
