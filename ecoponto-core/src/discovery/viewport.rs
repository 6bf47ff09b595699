//! Map viewport centered on the user's fix.

use crate::model::{CollectionPoint, GeoPosition};

/// Latitude and longitude span of the initial map region, in degrees.
pub const INITIAL_SPAN: f64 = 0.014;

const MIN_SPAN: f64 = 0.000_5;
const MAX_SPAN: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Rectangular map region around a center.
pub struct MapViewport {
    /// Center of the region.
    pub center: GeoPosition,
    /// Full latitude extent in degrees.
    pub latitude_span: f64,
    /// Full longitude extent in degrees.
    pub longitude_span: f64,
}

impl MapViewport {
    /// Initial region around a fix.
    #[must_use]
    pub fn around(center: GeoPosition) -> Self {
        Self {
            center,
            latitude_span: INITIAL_SPAN,
            longitude_span: INITIAL_SPAN,
        }
    }

    /// Halve the visible spans.
    pub fn zoom_in(&mut self) {
        self.latitude_span = (self.latitude_span / 2.0).max(MIN_SPAN);
        self.longitude_span = (self.longitude_span / 2.0).max(MIN_SPAN);
    }

    /// Double the visible spans.
    pub fn zoom_out(&mut self) {
        self.latitude_span = (self.latitude_span * 2.0).min(MAX_SPAN);
        self.longitude_span = (self.longitude_span * 2.0).min(MAX_SPAN);
    }

    /// `[south, north]` edges.
    #[must_use]
    pub fn latitude_bounds(&self) -> [f64; 2] {
        let half = self.latitude_span / 2.0;
        [self.center.latitude - half, self.center.latitude + half]
    }

    /// `[west, east]` edges.
    #[must_use]
    pub fn longitude_bounds(&self) -> [f64; 2] {
        let half = self.longitude_span / 2.0;
        [self.center.longitude - half, self.center.longitude + half]
    }

    /// Whether a position falls inside the region, edges included.
    #[must_use]
    pub fn contains(&self, position: GeoPosition) -> bool {
        let [south, north] = self.latitude_bounds();
        let [west, east] = self.longitude_bounds();
        (south..=north).contains(&position.latitude) && (west..=east).contains(&position.longitude)
    }

    /// Points inside the region.
    pub fn visible<'points>(
        &self,
        points: &'points [CollectionPoint],
    ) -> impl Iterator<Item = &'points CollectionPoint> {
        points
            .iter()
            .filter(move |point| self.contains(point.position()))
    }
}
