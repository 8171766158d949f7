//! ClassicLink reconciler - links instances to VPCs through the control plane.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::Reconciler;
use crate::clients::ClassicLinkApi;
use crate::error::{Action, Error, Result};
use crate::schema;
use crate::state::{link_identity, DesiredState};

/// Label used in logs and errors: the identity if set, else the derived one.
fn link_label(state: &DesiredState) -> String {
    if state.is_present() {
        state.identity.clone()
    } else {
        link_identity(&state.instance_id, &state.network_id)
    }
}

/// ClassicLink reconciler that drives the control-plane API.
pub struct ClassicLinkReconciler<A: ?Sized> {
    api: Arc<A>,
}

impl<A: ClassicLinkApi + ?Sized> ClassicLinkReconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: ClassicLinkApi + ?Sized> Reconciler for ClassicLinkReconciler<A> {
    type State = DesiredState;

    async fn create(&self, state: &mut DesiredState) -> Result<()> {
        schema::validate(state)?;
        if state.is_present() {
            warn!("Creating VPC ClassicLink over existing identity {}", state.identity);
        }

        info!(
            "Creating VPC ClassicLink {} -> {} (groups: {:?})",
            state.instance_id, state.network_id, state.security_group_ids
        );
        self.api
            .attach(
                &state.instance_id,
                &state.network_id,
                &state.security_group_ids,
            )
            .await
            .map_err(|e| Error::remote(Action::Create, link_label(state), e))?;

        state.mark_present();
        info!("VPC ClassicLink {} created", state.identity);

        self.read(state).await
    }

    async fn read(&self, state: &mut DesiredState) -> Result<()> {
        debug!("Reading VPC ClassicLink for instance {}", state.instance_id);

        let links = match self.api.describe(&state.instance_id).await {
            Ok(links) => links,
            Err(e) if e.is_not_found() => {
                info!(
                    "Instance {} not found, VPC ClassicLink {} is gone",
                    state.instance_id,
                    link_label(state)
                );
                state.mark_absent();
                return Ok(());
            }
            Err(e) => return Err(Error::remote(Action::Read, link_label(state), e)),
        };

        if links.len() > 1 {
            warn!(
                "Instance {} reports {} ClassicLinks, using the first",
                state.instance_id,
                links.len()
            );
        }

        let Some(observed) = links.into_iter().next() else {
            info!("VPC ClassicLink {} is gone", link_label(state));
            state.mark_absent();
            return Ok(());
        };

        debug!(
            "Setting VPC ClassicLink {} from control plane: vpc={}, groups={:?}",
            link_label(state),
            observed.network_id,
            observed.security_group_ids
        );
        state.refresh_from(observed);
        Ok(())
    }

    async fn update(&self, previous: &DesiredState, state: &mut DesiredState) -> Result<()> {
        let changed = schema::replacement_fields(previous, state);

        if !changed.is_empty() {
            // Validate before detaching the current link
            schema::validate(state)?;

            info!(
                "VPC ClassicLink {} changed {}, recreating",
                link_label(previous),
                changed.join(", ")
            );

            let mut old = previous.clone();
            self.delete(&mut old).await?;
            state.mark_absent();

            self.create(state).await?;
        }

        self.read(state).await
    }

    async fn delete(&self, state: &mut DesiredState) -> Result<()> {
        let link = link_label(state);
        info!("Deleting VPC ClassicLink {}", link);

        match self.api.detach(&state.instance_id, &state.network_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("VPC ClassicLink {} is already gone", link);
            }
            Err(e) => return Err(Error::remote(Action::Delete, link, e)),
        }

        info!("VPC ClassicLink {} deleted", link);
        state.mark_absent();
        Ok(())
    }
}
