//! UI Components
//!
//! Reusable Leptos components for the pages.

pub mod alert_list;
pub mod chart;
pub mod device_link;
pub mod nav;
pub mod toast;
pub mod vital_card;

pub use alert_list::AlertList;
pub use chart::{EcgChart, HistoryChartView, LiveChartView};
pub use device_link::{DeviceInfoCard, LinkForm};
pub use nav::Nav;
pub use toast::Toast;
pub use vital_card::{DeviceCard, VitalCard};
