//! High-level service facade combining the region directory and the backend.

use std::sync::Arc;

use tracing::debug;

use crate::backend::Backend;
use crate::discovery::DiscoverySession;
use crate::model::{Region, StateCode};
use crate::ports::{PortError, RegionDirectoryPort};

/// Public entry point for picking a region and discovering its collection points.
pub struct EcopontoService {
    directory: Arc<dyn RegionDirectoryPort>,
    backend: Backend,
}

impl EcopontoService {
    /// Create a new service bound to a region directory and a backend.
    #[must_use]
    pub fn new(directory: Arc<dyn RegionDirectoryPort>, backend: Backend) -> Self {
        Self { directory, backend }
    }

    /// List all states ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the directory request fails.
    pub async fn states(&self) -> Result<Vec<StateCode>, PortError> {
        self.directory.states().await
    }

    /// List the cities of a state.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the directory request fails.
    pub async fn cities(&self, state: &StateCode) -> Result<Vec<String>, PortError> {
        debug!(%state, "loading cities");
        self.directory.cities(state).await
    }

    /// Activate the points screen for a region.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn discover(&self, region: Region) -> DiscoverySession {
        DiscoverySession::activate(self.backend.clone(), region)
    }
}
