//! Command dispatcher — writes a capability value, then reads the effect back.
//!
//! The cloud acknowledging a write says nothing about the appliance. Every
//! dispatch therefore forces a refresh of each cadence the capability's
//! entities read from, and the outcome is decided on the refreshed snapshot.

use std::time::Duration;

use washhub_domain::catalog;
use washhub_domain::command::PendingCommand;
use washhub_domain::error::{CloudError, WashHubError};
use washhub_domain::id::DeviceId;
use washhub_domain::value::EntityValue;

use crate::ports::CloudClient;
use crate::scheduler::Refresh;

/// How a dispatched command ended, once the cloud accepted the write.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The refreshed snapshot shows the requested effect.
    Confirmed { observed: EntityValue },
    /// The refresh succeeded but the device did not change as requested.
    ///
    /// Expected for some power commands while the appliance sits in standby.
    UnconfirmedEffect { observed: EntityValue },
    /// The write was accepted but refreshing one of the affected cadences
    /// failed, so part of the status may be stale.
    StatusUnknown { error: CloudError },
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Dispatches capability writes through the cloud client.
pub struct CommandDispatcher<C, R> {
    cloud: C,
    refresher: R,
    request_timeout: Duration,
}

impl<C, R> CommandDispatcher<C, R>
where
    C: CloudClient + Send + Sync,
    R: Refresh + Send + Sync,
{
    /// Create a dispatcher writing through `cloud` and refreshing through
    /// `refresher`.
    pub fn new(cloud: C, refresher: R, request_timeout: Duration) -> Self {
        Self {
            cloud,
            refresher,
            request_timeout,
        }
    }

    /// Set `capability` of `device_id` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`WashHubError::InvalidInput`] for an unknown capability or a
    /// value outside its domain, without any cloud call. Returns
    /// [`WashHubError::Cloud`] when the write itself failed; the affected
    /// cadences are still refreshed first.
    #[tracing::instrument(skip(self, device_id), fields(device_id = %device_id))]
    pub async fn dispatch(
        &self,
        device_id: &DeviceId,
        capability: &str,
        value: &str,
    ) -> Result<DispatchOutcome, WashHubError> {
        let capability = catalog::capability(capability)?;
        let command = capability.resolve(device_id, value)?;

        let written = self.write(&command).await;
        if let Err(err) = &written {
            tracing::warn!(code = command.code, error = %err, "command write failed");
        }

        let read_back_on = command.expectation.spec.cadence;
        let mut refresh_error = None;
        for cadence in capability.refresh_cadences() {
            if cadence == read_back_on {
                continue;
            }
            if let Err(err) = self.refresher.force_refresh(device_id, cadence).await {
                tracing::warn!(%cadence, error = %err, "refresh after command failed");
                refresh_error.get_or_insert(err);
            }
        }
        let refreshed = self.refresher.force_refresh(device_id, read_back_on).await;

        written?;

        let outcome = match (refreshed, refresh_error) {
            (Err(error), _) | (Ok(_), Some(error)) => DispatchOutcome::StatusUnknown { error },
            (Ok(snapshot), None) => {
                let observed = command.expectation.observed(&snapshot);
                if command.expectation.met_by(&snapshot) {
                    DispatchOutcome::Confirmed { observed }
                } else {
                    DispatchOutcome::UnconfirmedEffect { observed }
                }
            }
        };

        match &outcome {
            DispatchOutcome::Confirmed { .. } => {
                tracing::info!(
                    capability = command.capability,
                    value = command.value,
                    "command confirmed"
                );
            }
            DispatchOutcome::UnconfirmedEffect { observed } => {
                tracing::info!(
                    capability = command.capability,
                    value = command.value,
                    %observed,
                    "command accepted but effect not observed"
                );
            }
            DispatchOutcome::StatusUnknown { error } => {
                tracing::warn!(
                    capability = command.capability,
                    value = command.value,
                    %error,
                    "command accepted but status unknown"
                );
            }
        }
        Ok(outcome)
    }

    async fn write(&self, command: &PendingCommand) -> Result<(), CloudError> {
        tracing::debug!(code = command.code, param = command.param, "sending command");
        tokio::time::timeout(
            self.request_timeout,
            self.cloud
                .send_command(&command.device_id, command.code, command.param),
        )
        .await
        .map_err(|_| CloudError::Timeout(self.request_timeout))?
    }
}
