//! Asynchronous loaders feeding a discovery session.
//!
//! Loaders never touch session state. Each one runs until its port answers or
//! its token is cancelled, then sends a single [`Update`] to the session.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::discovery::state::{PositionOutcome, Update};
use crate::model::{FilterSet, Region};
use crate::ports::{Accuracy, CatalogPort, GeolocationPort, Permission, PointsPort};

pub(crate) async fn load_categories(
    port: Arc<dyn CatalogPort>,
    token: CancellationToken,
    updates: UnboundedSender<Update>,
) {
    debug!("loading category catalog");
    let result = tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!("category catalog request cancelled");
            return;
        }
        result = port.categories() => result,
    };
    deliver(&token, &updates, Update::Categories(result));
}

pub(crate) async fn resolve_position(
    port: Arc<dyn GeolocationPort>,
    token: CancellationToken,
    updates: UnboundedSender<Update>,
) {
    let outcome = tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!("position request cancelled");
            return;
        }
        outcome = locate(port.as_ref()) => outcome,
    };
    deliver(&token, &updates, Update::Position(outcome));
}

async fn locate(port: &dyn GeolocationPort) -> PositionOutcome {
    match port.request_permission().await {
        Ok(Permission::Granted) => {}
        Ok(Permission::Denied) => return PositionOutcome::Denied,
        Err(err) => {
            debug!(%err, "permission prompt failed, treating as denied");
            return PositionOutcome::Denied;
        }
    }

    match port.current_position(Accuracy::High).await {
        Ok(position) => PositionOutcome::Fix(position),
        Err(err) => PositionOutcome::Failed(err),
    }
}

pub(crate) async fn query_points(
    port: Arc<dyn PointsPort>,
    region: Region,
    filter: FilterSet,
    seq: u64,
    token: CancellationToken,
    updates: UnboundedSender<Update>,
) {
    debug!(seq, %region, items = %filter.to_query_value(), "querying collection points");
    let result = tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!(seq, "points query cancelled");
            return;
        }
        result = port.points(&region, &filter) => result,
    };
    deliver(&token, &updates, Update::Points { seq, result });
}

fn deliver(token: &CancellationToken, updates: &UnboundedSender<Update>, update: Update) {
    // A result that raced the cancellation is dropped here.
    if token.is_cancelled() {
        return;
    }
    if updates.send(update).is_err() {
        debug!("discovery session gone, dropping update");
    }
}
