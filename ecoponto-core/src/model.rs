//! Domain data structures for regions, categories, collection points, and positions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Identifier of a waste category (an "item" in the backend API).
pub struct CategoryId(pub u32);

impl fmt::Display for CategoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Identifier of a collection point.
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Material type a collection point may accept, such as glass or paper.
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Display title.
    pub title: String,
    /// URL of the category icon.
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Physical location accepting specific categories of waste.
pub struct CollectionPoint {
    /// Unique identifier.
    pub id: PointId,
    /// Display name of the point.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// URL of the point's photo.
    pub image_url: String,
}

impl CollectionPoint {
    /// Coordinates of the point.
    #[must_use]
    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A resolved geographic coordinate. `(0, 0)` is a valid position.
pub struct GeoPosition {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPosition {
    /// Build a position from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// State and city a point query is scoped to.
pub struct Region {
    /// Two-letter state code (UF).
    pub uf: String,
    /// City name as listed by the region directory.
    pub city: String,
}

impl Region {
    /// Construct a region from a state code and a city name.
    #[must_use]
    pub fn new<U: Into<String>, C: Into<String>>(uf: U, city: C) -> Self {
        Self {
            uf: uf.into(),
            city: city.into(),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} - {}", self.city, self.uf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// A state listed by the region directory.
pub struct StateCode(pub String);

impl fmt::Display for StateCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Categories currently selected by the user. Empty means "no filter".
pub struct FilterSet(BTreeSet<CategoryId>);

impl FilterSet {
    /// An empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the category if selected, add it otherwise.
    ///
    /// Returns `true` when the category is selected afterwards.
    pub fn toggle(&mut self, id: CategoryId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    /// Whether the category is part of the filter.
    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.0.contains(&id)
    }

    /// Whether no category is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of selected categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Selected categories in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.0.iter().copied()
    }

    /// Comma separated ids as sent in the `items` query parameter.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        self.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<CategoryId> for FilterSet {
    fn from_iter<I: IntoIterator<Item = CategoryId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_previous_filter() {
        let mut filter: FilterSet = [CategoryId(1), CategoryId(4)].into_iter().collect();
        let before = filter.clone();

        assert!(filter.toggle(CategoryId(2)));
        assert!(!filter.toggle(CategoryId(2)));
        assert_eq!(filter, before);

        assert!(!filter.toggle(CategoryId(4)));
        assert!(filter.toggle(CategoryId(4)));
        assert_eq!(filter, before);
    }

    #[test]
    fn toggle_sequence_applies_adds_and_removes_in_order() {
        let mut filter = FilterSet::new();
        for id in [3, 1, 3, 2, 1, 5] {
            filter.toggle(CategoryId(id));
        }
        assert_eq!(filter.iter().collect::<Vec<_>>(), vec![CategoryId(2), CategoryId(5)]);
    }

    #[test]
    fn query_value_is_sorted_and_comma_separated() {
        let filter: FilterSet = [CategoryId(6), CategoryId(1), CategoryId(2)]
            .into_iter()
            .collect();
        assert_eq!(filter.to_query_value(), "1,2,6");
        assert_eq!(FilterSet::new().to_query_value(), "");
    }

    #[test]
    fn zero_is_a_valid_position() {
        let origin = GeoPosition::new(0.0, 0.0);
        assert_eq!(origin.to_string(), "0.00000, 0.00000");
    }
}
