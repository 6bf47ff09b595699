//! Discovery state, its snapshot, and the reducer applying loader outcomes.

use std::{fmt, mem};

use tracing::{debug, info, warn};

use crate::model::{Category, CategoryId, CollectionPoint, FilterSet, GeoPosition, PointId, Region};
use crate::ports::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Lifecycle of a points screen.
pub enum Phase {
    /// Loaders started, some initial loads still outstanding.
    Activating,
    /// Every initial load settled at least once.
    Ready,
    /// Screen torn down; nothing is applied anymore.
    Deactivated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Where the user is, as far as the session knows.
pub enum PositionState {
    /// Permission or fix still outstanding.
    Pending,
    /// A fix was obtained.
    Resolved(GeoPosition),
    /// The user refused location access.
    Denied,
    /// Permission granted but no fix could be obtained.
    Unavailable,
}

impl PositionState {
    /// The fix, when there is one.
    #[must_use]
    pub fn resolved(&self) -> Option<GeoPosition> {
        match self {
            Self::Resolved(position) => Some(*position),
            Self::Pending | Self::Denied | Self::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Backend data a network failure relates to.
pub enum DataSource {
    /// The category catalog.
    Categories,
    /// The collection point query.
    Points,
}

impl fmt::Display for DataSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Categories => "categories",
            Self::Points => "collection points",
        };
        write!(formatter, "{label}")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Failures surfaced to the user. None of them ends the session.
pub enum DiscoveryError {
    /// Location access was refused.
    #[error("We need your permission to show your location")]
    PermissionDenied,
    /// A backend request failed; the previous data is kept.
    #[error("Failed to load {what}: {message}")]
    NetworkFailure {
        /// Which data failed to load.
        what: DataSource,
        /// Description of the underlying failure.
        message: String,
    },
    /// Location access granted but no position could be determined.
    #[error("Could not determine your position: {0}")]
    NoFix(String),
}

impl DiscoveryError {
    fn network(what: DataSource, err: &PortError) -> Self {
        Self::NetworkFailure {
            what,
            message: err.to_string(),
        }
    }

    fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NetworkFailure { what: left, .. }, Self::NetworkFailure { what: right, .. }) => {
                left == right
            }
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

/// Consistent view of everything the points screen renders.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Region the points are scoped to.
    pub region: Region,
    /// Category catalog, empty until loaded.
    pub categories: Vec<Category>,
    /// Result of the most recent effective point query.
    pub points: Vec<CollectionPoint>,
    /// Current category filter.
    pub filter: FilterSet,
    /// User position.
    pub position: PositionState,
    /// Screen lifecycle phase.
    pub phase: Phase,
    /// Failures not yet dismissed.
    pub errors: Vec<DiscoveryError>,
    /// Whether a point query for the current filter is outstanding.
    pub points_loading: bool,
    revision: u64,
}

impl Snapshot {
    fn new(region: Region) -> Self {
        Self {
            region,
            categories: Vec::new(),
            points: Vec::new(),
            filter: FilterSet::new(),
            position: PositionState::Pending,
            phase: Phase::Activating,
            errors: Vec::new(),
            points_loading: false,
            revision: 0,
        }
    }

    /// Number of writes applied so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Map center; `None` means the map must not be drawn.
    #[must_use]
    pub fn map_center(&self) -> Option<GeoPosition> {
        self.position.resolved()
    }

    /// Whether the category is part of the current filter.
    #[must_use]
    pub fn is_selected(&self, id: CategoryId) -> bool {
        self.filter.contains(id)
    }

    /// Look up a loaded point.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&CollectionPoint> {
        self.points.iter().find(|point| point.id == id)
    }

    fn push_error(&mut self, error: DiscoveryError) {
        self.errors.retain(|existing| !existing.same_kind(&error));
        self.errors.push(error);
    }
}

/// Outcome of a loader, sent back to the owning session.
#[derive(Debug)]
pub(crate) enum Update {
    Categories(Result<Vec<Category>, PortError>),
    Position(PositionOutcome),
    Points {
        seq: u64,
        result: Result<Vec<CollectionPoint>, PortError>,
    },
}

#[derive(Debug)]
pub(crate) enum PositionOutcome {
    Fix(GeoPosition),
    Denied,
    Failed(PortError),
}

#[derive(Debug, Default, Clone, Copy)]
struct Settled {
    categories: bool,
    position: bool,
    points: bool,
}

impl Settled {
    fn all(self) -> bool {
        self.categories && self.position && self.points
    }
}

/// State owned by a discovery session. Every mutation goes through here.
#[derive(Debug)]
pub(crate) struct DiscoveryState {
    snapshot: Snapshot,
    latest_seq: u64,
    settled: Settled,
}

impl DiscoveryState {
    pub(crate) fn new(region: Region) -> Self {
        Self {
            snapshot: Snapshot::new(region),
            latest_seq: 0,
            settled: Settled::default(),
        }
    }

    pub(crate) fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub(crate) fn is_active(&self) -> bool {
        self.snapshot.phase != Phase::Deactivated
    }

    fn write(&mut self) -> &mut Snapshot {
        self.snapshot.revision += 1;
        &mut self.snapshot
    }

    /// Flip a category in the filter. Returns `false` once deactivated.
    pub(crate) fn toggle(&mut self, id: CategoryId) -> bool {
        if !self.is_active() {
            return false;
        }
        let selected = self.write().filter.toggle(id);
        debug!(category = %id, selected, "category toggled");
        true
    }

    /// Register a new point query for the current filter and return its sequence number.
    pub(crate) fn begin_query(&mut self) -> u64 {
        self.latest_seq += 1;
        self.write().points_loading = true;
        self.latest_seq
    }

    pub(crate) fn dismiss_errors(&mut self) {
        if self.is_active() && !self.snapshot.errors.is_empty() {
            self.write().errors.clear();
        }
    }

    /// Move to [`Phase::Deactivated`]. Returns `false` when already there.
    pub(crate) fn deactivate(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        let snapshot = self.write();
        snapshot.phase = Phase::Deactivated;
        snapshot.points_loading = false;
        true
    }

    /// Apply a loader outcome. Returns whether the snapshot changed.
    pub(crate) fn apply(&mut self, update: Update) -> bool {
        if !self.is_active() {
            debug!("session deactivated, ignoring update");
            return false;
        }

        match update {
            Update::Categories(result) => self.apply_categories(result),
            Update::Position(outcome) => self.apply_position(outcome),
            Update::Points { seq, result } => {
                if seq != self.latest_seq {
                    debug!(seq, latest = self.latest_seq, "discarding stale points response");
                    return false;
                }
                self.apply_points(result);
            }
        }

        self.settle();
        true
    }

    fn apply_categories(&mut self, result: Result<Vec<Category>, PortError>) {
        self.settled.categories = true;
        match result {
            Ok(categories) => {
                debug!(count = categories.len(), "category catalog loaded");
                self.write().categories = categories;
            }
            Err(err) => {
                warn!(%err, "failed to load category catalog");
                self.write()
                    .push_error(DiscoveryError::network(DataSource::Categories, &err));
            }
        }
    }

    fn apply_position(&mut self, outcome: PositionOutcome) {
        self.settled.position = true;
        let snapshot = self.write();
        match outcome {
            PositionOutcome::Fix(position) => {
                debug!(%position, "position resolved");
                snapshot.position = PositionState::Resolved(position);
            }
            PositionOutcome::Denied => {
                info!("location permission denied");
                snapshot.position = PositionState::Denied;
                snapshot.push_error(DiscoveryError::PermissionDenied);
            }
            PositionOutcome::Failed(err) => {
                warn!(%err, "failed to obtain a position fix");
                snapshot.position = PositionState::Unavailable;
                snapshot.push_error(DiscoveryError::NoFix(err.to_string()));
            }
        }
    }

    fn apply_points(&mut self, result: Result<Vec<CollectionPoint>, PortError>) {
        self.settled.points = true;
        let snapshot = self.write();
        snapshot.points_loading = false;
        match result {
            Ok(points) => {
                debug!(count = points.len(), "collection points loaded");
                snapshot.points = points;
                snapshot.errors.retain(|error| {
                    !matches!(
                        error,
                        DiscoveryError::NetworkFailure {
                            what: DataSource::Points,
                            ..
                        }
                    )
                });
            }
            Err(err) => {
                warn!(%err, "failed to load collection points");
                snapshot.push_error(DiscoveryError::network(DataSource::Points, &err));
            }
        }
    }

    fn settle(&mut self) {
        if self.snapshot.phase == Phase::Activating && self.settled.all() {
            info!(region = %self.snapshot.region, "discovery session ready");
            self.write().phase = Phase::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn point(id: u32) -> CollectionPoint {
        CollectionPoint {
            id: PointId(id),
            name: format!("Point {id}"),
            latitude: -23.5,
            longitude: -46.6,
            image_url: format!("http://localhost:3333/uploads/{id}.jpg"),
        }
    }

    fn state() -> DiscoveryState {
        DiscoveryState::new(Region::new("SP", "Sao Paulo"))
    }

    #[test]
    fn superseded_points_response_is_discarded() {
        let mut state = state();
        let first = state.begin_query();
        state.toggle(CategoryId(1));
        let second = state.begin_query();

        assert!(state.apply(Update::Points {
            seq: second,
            result: Ok(vec![point(2), point(3)]),
        }));
        assert!(!state.apply(Update::Points {
            seq: first,
            result: Ok(vec![point(1)]),
        }));

        let ids: Vec<_> = state.snapshot().points.iter().map(|point| point.id).collect();
        assert_eq!(ids, vec![PointId(2), PointId(3)]);
        assert!(!state.snapshot().points_loading);
    }

    #[test]
    fn points_are_replaced_not_merged() {
        let mut state = state();
        let seq = state.begin_query();
        state.apply(Update::Points {
            seq,
            result: Ok(vec![point(1), point(2)]),
        });
        let seq = state.begin_query();
        state.apply(Update::Points {
            seq,
            result: Ok(vec![point(5), point(9)]),
        });

        assert_eq!(state.snapshot().points, vec![point(5), point(9)]);
    }

    #[test]
    fn failed_query_keeps_previous_points_until_next_success() {
        let mut state = state();
        let seq = state.begin_query();
        state.apply(Update::Points {
            seq,
            result: Ok(vec![point(1)]),
        });

        let seq = state.begin_query();
        state.apply(Update::Points {
            seq,
            result: Err(PortError::Timeout),
        });
        assert_eq!(state.snapshot().points, vec![point(1)]);
        assert_eq!(
            state.snapshot().errors,
            vec![DiscoveryError::NetworkFailure {
                what: DataSource::Points,
                message: "Request timed out".to_owned(),
            }]
        );

        let seq = state.begin_query();
        state.apply(Update::Points {
            seq,
            result: Ok(vec![point(4)]),
        });
        assert_eq!(state.snapshot().points, vec![point(4)]);
        assert!(state.snapshot().errors.is_empty());
    }

    #[test]
    fn ready_once_all_initial_loads_settled() {
        let mut state = state();
        let seq = state.begin_query();

        state.apply(Update::Categories(Err(PortError::Timeout)));
        assert_eq!(state.snapshot().phase, Phase::Activating);
        state.apply(Update::Position(PositionOutcome::Denied));
        assert_eq!(state.snapshot().phase, Phase::Activating);
        state.apply(Update::Points {
            seq,
            result: Ok(Vec::new()),
        });
        assert_eq!(state.snapshot().phase, Phase::Ready);

        let seq = state.begin_query();
        assert_eq!(state.snapshot().phase, Phase::Ready);
        state.apply(Update::Points {
            seq,
            result: Err(PortError::Timeout),
        });
        assert_eq!(state.snapshot().phase, Phase::Ready);
    }

    #[test]
    fn denied_permission_leaves_position_unresolved() {
        let mut state = state();
        state.apply(Update::Position(PositionOutcome::Denied));
        state.apply(Update::Categories(Ok(vec![Category {
            id: CategoryId(1),
            title: "Glass".to_owned(),
            icon_url: "http://localhost:3333/uploads/glass.svg".to_owned(),
        }])));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.position, PositionState::Denied);
        assert_eq!(snapshot.map_center(), None);
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.errors, vec![DiscoveryError::PermissionDenied]);
    }

    #[test]
    fn fix_at_origin_shows_the_map() {
        let mut state = state();
        state.apply(Update::Position(PositionOutcome::Fix(GeoPosition::new(0.0, 0.0))));
        assert!(state.snapshot().map_center().is_some());
    }

    #[test]
    fn nothing_is_written_after_deactivation() {
        let mut state = state();
        let seq = state.begin_query();
        assert!(state.deactivate());
        let revision = state.snapshot().revision();

        assert!(!state.apply(Update::Points {
            seq,
            result: Ok(vec![point(1)]),
        }));
        assert!(!state.apply(Update::Categories(Ok(Vec::new()))));
        assert!(!state.toggle(CategoryId(3)));
        state.dismiss_errors();
        assert!(!state.deactivate());

        assert_eq!(state.snapshot().revision(), revision);
        assert!(state.snapshot().points.is_empty());
        assert_eq!(state.snapshot().phase, Phase::Deactivated);
    }

    #[test]
    fn repeated_failures_do_not_pile_up() {
        let mut state = state();
        for _ in 0..3 {
            let seq = state.begin_query();
            state.apply(Update::Points {
                seq,
                result: Err(PortError::Timeout),
            });
        }
        state.apply(Update::Categories(Err(PortError::Timeout)));
        assert_eq!(state.snapshot().errors.len(), 2);

        state.dismiss_errors();
        assert!(state.snapshot().errors.is_empty());
    }
}
