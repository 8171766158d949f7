//! In-process control plane.
//!
//! Keeps classic links in memory, records every call, and can be told to
//! fail the next call of a given operation. Used by tests and for dry runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{ApiError, ApiResult, ClassicLinkApi, ClassicLinkRecord};

/// A call received by [`MemoryApi`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Attach {
        instance_id: String,
        network_id: String,
        security_group_ids: BTreeSet<String>,
    },
    Describe {
        instance_id: String,
    },
    Detach {
        instance_id: String,
        network_id: String,
    },
}

/// Operation selector for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Attach,
    Describe,
    Detach,
}

#[derive(Default)]
struct Inner {
    /// Links keyed by instance ID; an instance has at most one.
    links: HashMap<String, ClassicLinkRecord>,
    /// Instances known to the control plane.
    instances: BTreeSet<String>,
    /// Records appended to describe results after the real link.
    extra: HashMap<String, Vec<ClassicLinkRecord>>,
    calls: Vec<ApiCall>,
    faults: HashMap<Operation, ApiError>,
}

/// In-memory implementation of [`ClassicLinkApi`].
#[derive(Default)]
pub struct MemoryApi {
    inner: Mutex<Inner>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register instances that can be linked.
    pub fn with_instances<I, S>(instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let api = Self::new();
        api.lock()
            .instances
            .extend(instances.into_iter().map(Into::into));
        api
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next call of `op` with `error`.
    pub fn fail_next(&self, op: Operation, error: ApiError) {
        self.lock().faults.insert(op, error);
    }

    /// Remove a link behind the controller's back.
    pub fn remove_out_of_band(&self, instance_id: &str) -> Option<ClassicLinkRecord> {
        self.lock().links.remove(instance_id)
    }

    /// Make describe report an additional record for its instance.
    pub fn add_extra_record(&self, record: ClassicLinkRecord) {
        self.lock()
            .extra
            .entry(record.instance_id.clone())
            .or_default()
            .push(record);
    }

    /// Current link of an instance, if any.
    pub fn link(&self, instance_id: &str) -> Option<ClassicLinkRecord> {
        self.lock().links.get(instance_id).cloned()
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls that change state (attach and detach).
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, ApiCall::Describe { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait]
impl ClassicLinkApi for MemoryApi {
    async fn attach(
        &self,
        instance_id: &str,
        network_id: &str,
        security_group_ids: &BTreeSet<String>,
    ) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Attach {
            instance_id: instance_id.to_string(),
            network_id: network_id.to_string(),
            security_group_ids: security_group_ids.clone(),
        });
        if let Some(err) = inner.faults.remove(&Operation::Attach) {
            return Err(err);
        }

        if !inner.instances.contains(instance_id) {
            return Err(ApiError::not_found(format!(
                "The instance ID '{}' does not exist",
                instance_id
            )));
        }
        if let Some(existing) = inner.links.get(instance_id) {
            return Err(ApiError::new(
                "InvalidParameterValue",
                format!(
                    "Instance {} is already linked to {}",
                    instance_id, existing.network_id
                ),
            ));
        }

        debug!("Linking {} to {}", instance_id, network_id);
        inner.links.insert(
            instance_id.to_string(),
            ClassicLinkRecord {
                instance_id: instance_id.to_string(),
                network_id: network_id.to_string(),
                security_group_ids: security_group_ids.clone(),
            },
        );
        Ok(())
    }

    async fn describe(&self, instance_id: &str) -> ApiResult<Vec<ClassicLinkRecord>> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Describe {
            instance_id: instance_id.to_string(),
        });
        if let Some(err) = inner.faults.remove(&Operation::Describe) {
            return Err(err);
        }

        if !inner.instances.contains(instance_id) {
            return Err(ApiError::not_found(format!(
                "The instance ID '{}' does not exist",
                instance_id
            )));
        }
        let mut records: Vec<_> = inner.links.get(instance_id).cloned().into_iter().collect();
        if let Some(extra) = inner.extra.get(instance_id) {
            records.extend(extra.iter().cloned());
        }
        Ok(records)
    }

    async fn detach(&self, instance_id: &str, network_id: &str) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Detach {
            instance_id: instance_id.to_string(),
            network_id: network_id.to_string(),
        });
        if let Some(err) = inner.faults.remove(&Operation::Detach) {
            return Err(err);
        }

        let linked = inner
            .links
            .get(instance_id)
            .is_some_and(|link| link.network_id == network_id);
        if !linked {
            return Err(ApiError::not_found(format!(
                "Instance {} is not linked to {}",
                instance_id, network_id
            )));
        }

        debug!("Unlinking {} from {}", instance_id, network_id);
        inner.links.remove(instance_id);
        Ok(())
    }
}
