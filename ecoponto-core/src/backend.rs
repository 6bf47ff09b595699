//! Bundle of ports a discovery session talks to.

use std::sync::Arc;

use crate::ports::{CatalogPort, GeolocationPort, PointsPort};

/// Collaborators backing the points screen.
#[derive(Clone)]
pub struct Backend {
    /// Category catalog endpoint.
    pub catalog: Arc<dyn CatalogPort>,
    /// Collection point query endpoint.
    pub points: Arc<dyn PointsPort>,
    /// Device location capability.
    pub geolocation: Arc<dyn GeolocationPort>,
}

impl Backend {
    /// Assemble a backend from its three ports.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        points: Arc<dyn PointsPort>,
        geolocation: Arc<dyn GeolocationPort>,
    ) -> Self {
        Self {
            catalog,
            points,
            geolocation,
        }
    }
}
