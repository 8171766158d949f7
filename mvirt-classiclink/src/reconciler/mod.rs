//! Reconcilers for control-plane resources.
//!
//! A reconciler drives one resource through its lifecycle. The orchestrator
//! owns the record and persists whatever the reconciler leaves in it.

pub mod classic_link;

pub use classic_link::ClassicLinkReconciler;

use async_trait::async_trait;

use crate::error::Result;

/// Lifecycle operations of a declarative resource.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// The record round-tripped through the orchestrator.
    type State: Send + Sync;

    /// Create the resource and refresh the record from the control plane.
    async fn create(&self, state: &mut Self::State) -> Result<()>;

    /// Refresh the record. Clears the identity if the resource is gone.
    async fn read(&self, state: &mut Self::State) -> Result<()>;

    /// Move from `previous` to the record in `state`.
    async fn update(&self, previous: &Self::State, state: &mut Self::State) -> Result<()>;

    /// Delete the resource. Deleting a missing resource succeeds.
    async fn delete(&self, state: &mut Self::State) -> Result<()>;
}
