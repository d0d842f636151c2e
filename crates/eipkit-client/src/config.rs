use std::time::Duration;

use eipkit_cip::UnconnectedSend;
use eipkit_frame::FrameConfig;
use eipkit_transport::DEFAULT_PORT;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Client configuration.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit-messaging TCP port.
    pub tcp_port: u16,
    /// Discovery UDP port (resolved, currently unused).
    pub udp_port: u16,
    /// Backplane slot of the controller.
    pub slot: u8,
    /// Unconnected-Send priority/time-tick byte.
    pub time_tick: u8,
    /// Unconnected-Send timeout ticks; also the SendRRData timeout field.
    pub timeout_ticks: u8,
    pub connect_timeout: Duration,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    /// Upper bound on "more data" pages followed during tag discovery.
    pub max_discovery_pages: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_port: DEFAULT_PORT,
            udp_port: DEFAULT_PORT,
            slot: 0,
            time_tick: 3,
            timeout_ticks: 250,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Some(Duration::from_secs(10)),
            write_timeout: Some(Duration::from_secs(10)),
            max_discovery_pages: 10_000,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            ..FrameConfig::default()
        }
    }

    pub fn unconnected_send(&self) -> UnconnectedSend {
        UnconnectedSend {
            time_tick: self.time_tick,
            timeout_ticks: self.timeout_ticks,
            slot: self.slot,
        }
    }
}
