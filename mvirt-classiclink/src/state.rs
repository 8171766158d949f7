//! ClassicLink resource record.
//!
//! The orchestrator owns the record and hands it to the controller on every
//! call. The controller only writes `identity` and the fields refreshed from
//! the control plane.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Separator between instance and VPC in the external identity.
pub const IDENTITY_SEPARATOR: char = '/';

/// Build the external identity of a classic link.
///
/// The separator is not escaped: an instance ID containing `/` produces an
/// ambiguous identity. Consumers depend on the exact `<instance>/<vpc>` form,
/// so this is kept as is.
pub fn link_identity(instance_id: &str, network_id: &str) -> String {
    format!("{}{}{}", instance_id, IDENTITY_SEPARATOR, network_id)
}

/// Desired state of one classic link, round-tripped through the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub instance_id: String,
    pub network_id: String,
    pub security_group_ids: BTreeSet<String>,
    /// `<instance_id>/<network_id>` while the link exists, empty otherwise.
    #[serde(default)]
    pub identity: String,
}

impl DesiredState {
    pub fn new<I, S>(instance_id: impl Into<String>, network_id: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instance_id: instance_id.into(),
            network_id: network_id.into(),
            security_group_ids: groups.into_iter().map(Into::into).collect(),
            identity: String::new(),
        }
    }

    /// Whether the controller believes the link exists.
    pub fn is_present(&self) -> bool {
        !self.identity.is_empty()
    }

    /// Mark the link as existing, deriving the identity from the current fields.
    pub fn mark_present(&mut self) {
        self.identity = link_identity(&self.instance_id, &self.network_id);
    }

    /// Mark the link as gone.
    pub fn mark_absent(&mut self) {
        self.identity.clear();
    }

    /// Overwrite the user fields with what the control plane reports.
    pub fn refresh_from(&mut self, observed: ObservedState) {
        self.instance_id = observed.instance_id;
        self.network_id = observed.network_id;
        self.security_group_ids = observed.security_group_ids;
    }
}

/// A classic link as reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub instance_id: String,
    pub network_id: String,
    pub security_group_ids: BTreeSet<String>,
}
