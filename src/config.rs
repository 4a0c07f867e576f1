//! Link configuration
//!
//! Connection defaults, protocol limits and the dispatch validation
//! policy, loadable from and savable to a TOML file so an operator
//! console can persist its link setup between sessions.
//!
//! # Glitch bounds
//!
//! The controller occasionally emits corrupted numeric text during baud
//! mismatches or buffer tearing, and the wire format has no checksum, so
//! the only available validation is a plausibility range per channel.
//! The historical console used a single hardcoded ±255 window for every
//! channel; here that is the default, with per-channel overrides for
//! channels whose physical range differs (setpoints scaled per loop, for
//! example).

use crate::error::{PidLinkError, Result};
use crate::protocol::ReportId;
use crate::types::SerialSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default accepted value range, inherited from the original console
pub const DEFAULT_GLITCH_BOUND: f64 = 255.0;

/// Default stats reporting cadence while connected, in milliseconds
pub const DEFAULT_STATS_INTERVAL_MS: u64 = 500;

/// Default transport read timeout, in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10;

/// An inclusive accepted value range for one or all channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBounds {
    /// Smallest accepted value
    pub min: f64,
    /// Largest accepted value
    pub max: f64,
}

impl ValueBounds {
    /// A symmetric range `[-limit, limit]`
    pub fn symmetric(limit: f64) -> Self {
        Self {
            min: -limit,
            max: limit,
        }
    }

    /// Whether a value lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ValueBounds {
    fn default() -> Self {
        Self::symmetric(DEFAULT_GLITCH_BOUND)
    }
}

/// A per-channel bounds override entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBounds {
    /// The inbound channel ID the override applies to
    pub channel: u8,
    /// Smallest accepted value
    pub min: f64,
    /// Largest accepted value
    pub max: f64,
}

/// Validation policy for the dispatcher
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Range applied to channels without an override
    #[serde(default)]
    pub default_bounds: ValueBounds,
    /// Per-channel range overrides
    #[serde(default)]
    pub overrides: Vec<ChannelBounds>,
}

impl DispatchConfig {
    /// The accepted range for one channel
    pub fn bounds_for(&self, channel: ReportId) -> ValueBounds {
        self.overrides
            .iter()
            .find(|o| o.channel == channel.as_u8())
            .map(|o| ValueBounds { min: o.min, max: o.max })
            .unwrap_or(self.default_bounds)
    }
}

/// A per-channel display scale entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelScale {
    /// The inbound channel ID
    pub channel: u8,
    /// Full-scale magnitude used by the presentation layer
    pub scale: f64,
}

/// Display scaling hints for the presentation collaborator
///
/// Scaling is strictly a presentation concern; the link layer stores raw
/// decoded values and only carries this table so all link-related
/// configuration lives in one file. Defaults mirror the controller
/// firmware's channel ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Full-scale magnitude per channel
    #[serde(default)]
    pub channels: Vec<ChannelScale>,
}

impl ScalingConfig {
    /// The display scale for a channel, 1.0 if none is configured
    pub fn display_scale(&self, channel: ReportId) -> f64 {
        self.channels
            .iter()
            .find(|c| c.channel == channel.as_u8())
            .map(|c| c.scale)
            .unwrap_or(1.0)
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        let entries = [
            (ReportId::Pid1Input, 40.0),
            (ReportId::Pid1Output, 255.0),
            (ReportId::Pid1Setpoint, 40.0),
            (ReportId::Pid2Input, 40.0),
            (ReportId::Pid2Output, 255.0),
            (ReportId::Pid2Setpoint, 40.0),
            (ReportId::Pid3Input, 120.0),
            (ReportId::Pid3Output, 40.0),
            (ReportId::Pid3Setpoint, 120.0),
        ];
        Self {
            channels: entries
                .into_iter()
                .map(|(channel, scale)| ChannelScale {
                    channel: channel.as_u8(),
                    scale,
                })
                .collect(),
        }
    }
}

/// Timing and buffering parameters for the link worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Maximum line length before drop-and-resync
    pub max_frame_len: usize,
    /// Transport read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Stats reporting cadence in milliseconds
    pub stats_interval_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            max_frame_len: crate::protocol::DEFAULT_MAX_FRAME_LEN,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
        }
    }
}

/// Complete link configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Serial port defaults for new connections
    #[serde(default)]
    pub serial: SerialSettings,
    /// Worker timing and framing limits
    #[serde(default)]
    pub link: LinkSettings,
    /// Validation policy
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Presentation scaling hints
    #[serde(default)]
    pub scaling: ScalingConfig,
}

impl LinkConfig {
    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text)
            .map_err(|e| PidLinkError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save the configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| PidLinkError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Precompute the per-channel bounds map used by the dispatcher
    pub fn bounds_table(&self) -> HashMap<u8, ValueBounds> {
        self.dispatch
            .overrides
            .iter()
            .map(|o| (o.channel, ValueBounds { min: o.min, max: o.max }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_match_original_window() {
        let config = LinkConfig::default();
        let bounds = config.dispatch.bounds_for(ReportId::Pid1Input);
        assert_eq!(bounds, ValueBounds { min: -255.0, max: 255.0 });
        assert!(bounds.contains(255.0));
        assert!(bounds.contains(-255.0));
        assert!(!bounds.contains(255.1));
    }

    #[test]
    fn test_per_channel_override() {
        let mut config = LinkConfig::default();
        config.dispatch.overrides.push(ChannelBounds {
            channel: ReportId::Pid3Setpoint.as_u8(),
            min: -120.0,
            max: 120.0,
        });

        let narrowed = config.dispatch.bounds_for(ReportId::Pid3Setpoint);
        assert_eq!(narrowed.max, 120.0);

        // Other channels keep the default
        let default = config.dispatch.bounds_for(ReportId::Pid3Input);
        assert_eq!(default.max, 255.0);
    }

    #[test]
    fn test_display_scales_from_firmware() {
        let scaling = ScalingConfig::default();
        assert_eq!(scaling.display_scale(ReportId::Pid1Output), 255.0);
        assert_eq!(scaling.display_scale(ReportId::Pid3Input), 120.0);
        // Gains have no display scale
        assert_eq!(scaling.display_scale(ReportId::Pid1Kp), 1.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LinkConfig::default();
        config.serial.baud_rate = 250_000;
        config.dispatch.overrides.push(ChannelBounds {
            channel: 7,
            min: -1000.0,
            max: 1000.0,
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("link.toml");

        config.save(&path).unwrap();
        let loaded = LinkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "serial = \"not a table\"").unwrap();

        assert!(matches!(
            LinkConfig::load(&path),
            Err(PidLinkError::Config(_))
        ));
    }
}
