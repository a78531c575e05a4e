//! Identity configuration.
//!
//! Loaded from camelCase JSON (missing keys take their defaults). The server keeps the
//! authoritative copy in its single-row settings table; clients build one from defaults
//! or a local file.

use crate::{
    archetype::ArchetypeId,
    constants::{DEFAULT_BASELINE_MAX_HEALTH, DEFAULT_COMMAND_PERMISSION_LEVEL, DEFAULT_MAX_HEALTH_CAP},
    error::ConfigError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityConfig {
    /// Scale the actor's health to the equipped archetype.
    pub scaling_health: bool,
    /// Cap for a scaled max-health value.
    pub max_health: f32,
    /// Mirror main/off hand items onto the shadow.
    pub identities_equip_items: bool,
    /// Mirror armor slots onto the shadow.
    pub identities_equip_armor: bool,
    /// Emit human-readable command confirmations.
    pub log_commands: bool,
    /// Max-health base restored when an identity is cleared under health scaling.
    pub baseline_max_health: f32,
    /// Minimum permission level for the `identity` command.
    pub command_permission_level: u8,
    /// Vehicle archetype -> archetypes allowed to keep riding it.
    ///
    /// Vehicles absent from the table accept every rider.
    pub mount_restrictions: BTreeMap<ArchetypeId, BTreeSet<ArchetypeId>>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let illagers = ["pillager", "vindicator", "evoker", "illusioner", "witch"]
            .into_iter()
            .map(ArchetypeId::new)
            .collect();

        Self {
            scaling_health: false,
            max_health: DEFAULT_MAX_HEALTH_CAP,
            identities_equip_items: true,
            identities_equip_armor: true,
            log_commands: true,
            baseline_max_health: DEFAULT_BASELINE_MAX_HEALTH,
            command_permission_level: DEFAULT_COMMAND_PERMISSION_LEVEL,
            mount_restrictions: BTreeMap::from([(ArchetypeId::new("ravager"), illagers)]),
        }
    }
}

impl IdentityConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_health.is_finite() && self.max_health > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "maxHealth must be positive, got {}",
                self.max_health
            )));
        }
        if !(self.baseline_max_health.is_finite() && self.baseline_max_health > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "baselineMaxHealth must be positive, got {}",
                self.baseline_max_health
            )));
        }
        Ok(())
    }

    /// Whether `rider` may stay mounted on a `vehicle` archetype.
    pub fn may_ride(&self, vehicle: &ArchetypeId, rider: &ArchetypeId) -> bool {
        self.mount_restrictions
            .get(vehicle)
            .is_none_or(|allowed| allowed.contains(rider))
    }
}
