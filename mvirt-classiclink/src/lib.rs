//! mvirt-classiclink: controller for instance-to-VPC classic links.
//!
//! The controller reconciles one declared link against the control-plane API:
//! - Create attaches the instance to the VPC with its security groups
//! - Read refreshes the record and detects links removed out of band
//! - Update recreates the link when the VPC or the security groups change
//! - Delete detaches, treating an already missing link as success
//!
//! The orchestrator owns ordering, retries and persistence of the record.

pub mod clients;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod schema;
pub mod state;

pub use clients::{ApiError, ApiErrorKind, ClassicLinkApi, HttpClient, MemoryApi};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use reconciler::{ClassicLinkReconciler, Reconciler};
pub use state::{link_identity, DesiredState, ObservedState};
