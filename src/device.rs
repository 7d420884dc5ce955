//! Device Link
//!
//! Whether a monitoring device is associated with the current user. The
//! state starts unresolved until the backend answers `GET /device/info`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::DeviceInfo;

pub const LINKED_MESSAGE: &str = "Device linked successfully! Loading your dashboard...";
pub const UNLINKED_MESSAGE: &str = "Device unlinked successfully. You can link a new device below.";
pub const LINK_FAILED_MESSAGE: &str = "Failed to link device";
pub const UNLINK_FAILED_MESSAGE: &str = "Failed to unlink device";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Please enter a device ID")]
    EmptyDeviceId,

    #[error("A link request is already in progress")]
    Pending,

    #[error("No device is linked")]
    NotLinked,
}

/// Link state of the current user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// Device info not fetched yet
    #[default]
    Unresolved,
    NotLinked,
    Linked(DeviceInfo),
}

impl LinkState {
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked(_))
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        match self {
            Self::Linked(info) => Some(info),
            _ => None,
        }
    }
}

/// Link controller: state plus the link form
#[derive(Debug, Clone, Default)]
pub struct DeviceLink {
    state: LinkState,
    pending: bool,
    input: String,
}

impl DeviceLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn is_linked(&self) -> bool {
        self.state.is_linked()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.state.device().map(|d| d.device_id.as_str())
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Current contents of the device-id input
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Validate a link request and mark it in flight
    pub fn begin_link(&mut self, raw_id: &str) -> Result<String, LinkError> {
        if self.pending {
            return Err(LinkError::Pending);
        }

        let device_id = raw_id.trim();
        if device_id.is_empty() {
            return Err(LinkError::EmptyDeviceId);
        }

        self.input = device_id.to_string();
        self.pending = true;
        Ok(device_id.to_string())
    }

    /// Mark an unlink request in flight
    pub fn begin_unlink(&mut self) -> Result<(), LinkError> {
        if self.pending {
            return Err(LinkError::Pending);
        }
        if !self.is_linked() {
            return Err(LinkError::NotLinked);
        }
        self.pending = true;
        Ok(())
    }

    /// Release the pending flag whatever the outcome was
    pub fn finish(&mut self) {
        self.pending = false;
    }

    pub fn set_linked(&mut self, info: DeviceInfo) {
        tracing::debug!(device_id = %info.device_id, "Link state: linked");
        self.state = LinkState::Linked(info);
    }

    /// Enter `NotLinked` and clear the input
    pub fn set_not_linked(&mut self) {
        tracing::debug!("Link state: not linked");
        self.state = LinkState::NotLinked;
        self.input.clear();
    }

    /// Whether a pushed reading tagged with `device_id` belongs on screen
    ///
    /// Accepted when it matches the linked device, or while the link state
    /// is still unresolved and no device is pinned yet. Once pinned, an
    /// untagged reading is dropped.
    pub fn accepts(&self, device_id: Option<&str>) -> bool {
        match &self.state {
            LinkState::Unresolved => true,
            LinkState::NotLinked => false,
            LinkState::Linked(info) => device_id == Some(info.device_id.as_str()),
        }
    }

    /// Whether an update that never carries a device id belongs on screen
    ///
    /// `vital_signs_update` is scoped to the user's session server-side.
    pub fn accepts_untagged(&self) -> bool {
        !matches!(self.state, LinkState::NotLinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str) -> DeviceInfo {
        DeviceInfo {
            device_id: id.to_string(),
            device_type: Some("ESP32".to_string()),
            linked_at: None,
        }
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut link = DeviceLink::new();
        assert_eq!(link.begin_link("   "), Err(LinkError::EmptyDeviceId));
        assert!(!link.is_pending());
        assert_eq!(LinkError::EmptyDeviceId.to_string(), "Please enter a device ID");
    }

    #[test]
    fn test_link_trims_and_marks_pending() {
        let mut link = DeviceLink::new();
        assert_eq!(link.begin_link("  ESP32-001 ").unwrap(), "ESP32-001");
        assert!(link.is_pending());
        assert_eq!(link.begin_link("ESP32-002"), Err(LinkError::Pending));

        link.finish();
        link.set_linked(info("ESP32-001"));
        assert!(link.is_linked());
        assert_eq!(link.device_id(), Some("ESP32-001"));
    }

    #[test]
    fn test_unlink_requires_link() {
        let mut link = DeviceLink::new();
        assert_eq!(link.begin_unlink(), Err(LinkError::NotLinked));

        link.set_linked(info("ESP32-001"));
        assert!(link.begin_unlink().is_ok());
        link.finish();
        link.set_input("ESP32-001");
        link.set_not_linked();
        assert_eq!(link.state(), &LinkState::NotLinked);
        assert!(link.input().is_empty());
    }

    #[test]
    fn test_push_acceptance() {
        let mut link = DeviceLink::new();
        assert!(link.accepts(Some("anything")));

        link.set_linked(info("ESP32-001"));
        assert!(link.accepts(Some("ESP32-001")));
        assert!(!link.accepts(Some("ESP32-999")));
        assert!(!link.accepts(None));
        assert!(link.accepts_untagged());

        link.set_not_linked();
        assert!(!link.accepts(Some("ESP32-001")));
        assert!(!link.accepts_untagged());
    }
}
