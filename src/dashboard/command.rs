//! Dashboard commands and their outcomes
//!
//! Handlers never call the backend themselves. They return [`Command`]s; a
//! driver runs each one with [`execute`] and hands the [`Outcome`] back to
//! [`Dashboard::apply`](super::Dashboard::apply).

use crate::api::{ApiResult, DeviceApi, DeviceInfo, DeviceSeries};
use crate::chart::TimeRange;
use crate::vitals::VitalReading;

/// Work requested by a dashboard handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `GET /device/info` to resolve the link state
    FetchDeviceInfo,
    /// `POST /device/link`
    Link { device_id: String },
    /// `POST /device/unlink`
    Unlink,
    /// `GET /device/data?hours=N`
    FetchHistory { range: TimeRange },
    /// `GET /device/data/latest`
    FetchLatest,
    /// Clear the stored session and return to login
    EndSession,
}

impl Command {
    /// Whether the command talks to the backend
    pub fn is_request(&self) -> bool {
        !matches!(self, Self::EndSession)
    }
}

/// Result of an executed [`Command`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    DeviceInfo(ApiResult<Option<DeviceInfo>>),
    Linked {
        device_id: String,
        result: ApiResult<Option<DeviceInfo>>,
    },
    Unlinked(ApiResult<()>),
    History {
        range: TimeRange,
        result: ApiResult<Option<DeviceSeries>>,
    },
    Latest(ApiResult<Option<VitalReading>>),
}

/// Run a command against the backend
///
/// Returns `None` for commands the driver handles itself.
pub async fn execute<A>(api: &A, command: Command) -> Option<Outcome>
where
    A: DeviceApi + ?Sized,
{
    tracing::debug!(?command, "Executing dashboard command");

    let outcome = match command {
        Command::FetchDeviceInfo => Outcome::DeviceInfo(api.device_info().await),
        Command::Link { device_id } => {
            let result = api.link_device(&device_id).await;
            Outcome::Linked { device_id, result }
        }
        Command::Unlink => Outcome::Unlinked(api.unlink_device().await),
        Command::FetchHistory { range } => Outcome::History {
            range,
            result: api.device_data(range.hours()).await,
        },
        Command::FetchLatest => Outcome::Latest(api.latest_data().await),
        Command::EndSession => return None,
    };

    Some(outcome)
}
