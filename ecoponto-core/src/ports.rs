//! Traits describing the external collaborators and shared helper types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Category, CollectionPoint, FilterSet, GeoPosition, Region, StateCode};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to collaborators.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The collaborator did not answer in time.
    #[error("Request timed out")]
    Timeout,
    /// A location fix could not be obtained.
    #[error("No position fix: {0}")]
    NoFix(String),
    /// The response could not be interpreted.
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Answer to a location permission request.
pub enum Permission {
    /// The user allowed access to their location.
    Granted,
    /// The user refused access to their location.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Accuracy requested for a position fix.
pub enum Accuracy {
    /// Best available accuracy, possibly slower.
    High,
}

#[async_trait]
/// Backend endpoint listing the selectable waste categories.
pub trait CatalogPort: Send + Sync {
    /// Fetch the full category catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn categories(&self) -> Result<Vec<Category>, PortError>;
}

#[async_trait]
/// Backend endpoint querying collection points.
pub trait PointsPort: Send + Sync {
    /// Fetch the points of a region accepting at least one category of the filter.
    ///
    /// An empty filter returns every point of the region.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn points(
        &self,
        region: &Region,
        filter: &FilterSet,
    ) -> Result<Vec<CollectionPoint>, PortError>;
}

#[async_trait]
/// Device location capability.
pub trait GeolocationPort: Send + Sync {
    /// Ask the user for permission to read their location.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the permission prompt itself fails.
    async fn request_permission(&self) -> Result<Permission, PortError>;

    /// Obtain a single position fix.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NoFix`] or [`PortError::Timeout`] when no position is available.
    async fn current_position(&self, accuracy: Accuracy) -> Result<GeoPosition, PortError>;
}

#[async_trait]
/// Directory of administrative regions used to pick the point query scope.
pub trait RegionDirectoryPort: Send + Sync {
    /// List all states ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the directory request fails.
    async fn states(&self) -> Result<Vec<StateCode>, PortError>;

    /// List the city names of a state.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the directory request fails.
    async fn cities(&self, state: &StateCode) -> Result<Vec<String>, PortError>;
}
