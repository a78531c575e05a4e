//! The explicit bundle of registries and configuration every component reads.
//!
//! Built once at startup (module `init` on the server, app setup on the client) and
//! passed by reference; nothing in the crate reaches for a global.

use crate::{
    archetype::{ArchetypeRegistry, WorldContext},
    command::AuthorizationService,
    config::IdentityConfig,
    dimensions::DimensionAdapter,
    sync::SyncEngine,
    updater::UpdaterRegistry,
};

#[derive(Clone, Debug, Default)]
pub struct IdentityServices {
    pub archetypes: ArchetypeRegistry,
    pub updaters: UpdaterRegistry,
    pub config: IdentityConfig,
}

impl IdentityServices {
    pub fn new(archetypes: ArchetypeRegistry, updaters: UpdaterRegistry, config: IdentityConfig) -> Self {
        Self {
            archetypes,
            updaters,
            config,
        }
    }

    /// Stock archetypes and hooks with `config`.
    pub fn vanilla(config: IdentityConfig) -> Self {
        let archetypes = ArchetypeRegistry::vanilla();
        let updaters = UpdaterRegistry::vanilla(&archetypes);
        Self::new(archetypes, updaters, config)
    }

    pub fn dimension_adapter(&self) -> DimensionAdapter<'_> {
        DimensionAdapter::new(&self.archetypes)
    }

    pub fn sync(&self) -> SyncEngine<'_> {
        SyncEngine::new(&self.archetypes, &self.updaters, &self.config)
    }

    pub fn authorization<'a>(&'a self, world: &'a dyn WorldContext) -> AuthorizationService<'a> {
        AuthorizationService::new(self, world)
    }
}
