//! Point discovery coordinator backing the points screen.
//!
//! A [`DiscoverySession`] lives exactly as long as the screen. Activation
//! starts three loaders concurrently: the category catalog, the position
//! resolver, and a point query for the empty filter. Every filter change
//! issues a new point query. Loaders report back through a channel and the
//! session folds their outcomes into a [`Snapshot`], discarding answers to
//! superseded queries.

mod loaders;
/// Snapshot types and the reducer behind them.
pub mod state;
/// Map region helpers.
pub mod viewport;

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::model::{CategoryId, PointId, Region};

pub use state::{DataSource, DiscoveryError, Phase, PositionState, Snapshot};
pub use viewport::{INITIAL_SPAN, MapViewport};

use state::{DiscoveryState, Update};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Navigation requested by a screen.
pub enum Navigation {
    /// Open the points screen for a region.
    Points(Region),
    /// Open the detail screen of a collection point.
    PointDetail {
        /// Point to show.
        point_id: PointId,
    },
    /// Pop the current screen.
    Back,
}

/// State and loaders of one points screen instance.
pub struct DiscoverySession {
    backend: Backend,
    state: DiscoveryState,
    updates_tx: UnboundedSender<Update>,
    updates_rx: UnboundedReceiver<Update>,
    lifetime: CancellationToken,
    query: CancellationToken,
}

impl DiscoverySession {
    /// Activate the screen for a region and start all loaders.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn activate(backend: Backend, region: Region) -> Self {
        info!(%region, "activating discovery session");
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let lifetime = CancellationToken::new();
        let query = lifetime.child_token();

        tokio::spawn(loaders::load_categories(
            Arc::clone(&backend.catalog),
            lifetime.child_token(),
            updates_tx.clone(),
        ));
        tokio::spawn(loaders::resolve_position(
            Arc::clone(&backend.geolocation),
            lifetime.child_token(),
            updates_tx.clone(),
        ));

        let mut session = Self {
            backend,
            state: DiscoveryState::new(region),
            updates_tx,
            updates_rx,
            lifetime,
            query,
        };
        session.issue_query();
        session
    }

    /// Current state of the screen.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        self.state.snapshot()
    }

    /// Select or unselect a category and re-query the points.
    pub fn toggle_category(&mut self, id: CategoryId) {
        if self.state.toggle(id) {
            self.issue_query();
        }
    }

    /// Request the detail screen of a point. Leaves the session untouched.
    #[must_use]
    pub fn select_point(&self, point_id: PointId) -> Navigation {
        debug!(point = %point_id, "navigating to point detail");
        Navigation::PointDetail { point_id }
    }

    /// Request leaving the points screen.
    #[must_use]
    pub fn go_back(&self) -> Navigation {
        Navigation::Back
    }

    /// Clear surfaced errors.
    pub fn dismiss_errors(&mut self) {
        self.state.dismiss_errors();
    }

    /// Apply every loader outcome received so far without waiting.
    ///
    /// Returns whether the snapshot changed.
    pub fn apply_pending(&mut self) -> bool {
        let mut changed = false;
        while let Ok(update) = self.updates_rx.try_recv() {
            changed |= self.state.apply(update);
        }
        changed
    }

    /// Tear the screen down. In-flight requests are cancelled and their
    /// eventual completion no longer changes anything.
    pub fn deactivate(&mut self) {
        if self.state.deactivate() {
            info!(region = %self.snapshot().region, "deactivating discovery session");
            self.lifetime.cancel();
            self.updates_rx.close();
        }
    }

    fn issue_query(&mut self) {
        // The superseded query may already have sent its result; the sequence
        // number check in the reducer drops it.
        self.query.cancel();
        self.query = self.lifetime.child_token();

        let seq = self.state.begin_query();
        let snapshot = self.state.snapshot();
        tokio::spawn(loaders::query_points(
            Arc::clone(&self.backend.points),
            snapshot.region.clone(),
            snapshot.filter.clone(),
            seq,
            self.query.clone(),
            self.updates_tx.clone(),
        ));
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
