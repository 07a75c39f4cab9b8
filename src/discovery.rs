//! Target discovery.
//!
//! Turns the backend's active target list into `Target`s carrying identity
//! labels and the live health classification. No caching: each call is a fresh
//! round trip.

use tracing::{debug, instrument};

use crate::client::{ActiveTarget, MetricsBackend};
use crate::error::QueryError;
use crate::model::{Health, Target};

/// Label carrying the application name.
pub const APP_LABEL: &str = "app";
/// Label carrying the instance name.
pub const NAME_LABEL: &str = "job";
/// Label carrying the instance address.
pub const ADDRESS_LABEL: &str = "instance";

/// Lists the currently active targets.
#[instrument(skip(backend))]
pub async fn list_targets(backend: &dyn MetricsBackend) -> Result<Vec<Target>, QueryError> {
    let active = backend.targets().await?;
    let targets: Vec<Target> = active.iter().map(to_target).collect();
    debug!("Discovered {} targets", targets.len());
    Ok(targets)
}

fn to_target(active: &ActiveTarget) -> Target {
    let label = |name: &str| active.labels.get(name).cloned().unwrap_or_default();

    Target {
        app: label(APP_LABEL),
        name: label(NAME_LABEL),
        address: label(ADDRESS_LABEL),
        health: Health::from_backend(&active.health),
    }
}
