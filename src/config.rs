//! Bridge configuration.

use crate::bridge::BridgeError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Environment variable that switches debug logging on.
pub const DEBUG_ENV: &str = "FRAME_SYNC_DEBUG";

/// Configuration for a bridge instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
	/// Log every inbound raw event at info level
	pub debug: bool,
	/// How long an event loop waits for traffic before it considers itself idle
	#[serde(
		rename = "idle_timeout_ms",
		serialize_with = "serialize_millis",
		deserialize_with = "deserialize_millis"
	)]
	pub idle_timeout: Duration,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			debug: false,
			idle_timeout: Duration::from_millis(250),
		}
	}
}

impl BridgeConfig {
	pub fn from_json(raw: &str) -> Result<Self, BridgeError> {
		serde_json::from_str(raw).map_err(|e| BridgeError::Config(e.to_string()))
	}

	/// Defaults with the debug flag taken from [`DEBUG_ENV`] when set.
	pub fn from_env() -> Result<Self, BridgeError> {
		let mut config = Self::default();
		if let Ok(value) = std::env::var(DEBUG_ENV) {
			config.debug = parse_flag(&value)?;
		}
		Ok(config)
	}

	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}
}

fn parse_flag(value: &str) -> Result<bool, BridgeError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(BridgeError::Config(format!(
			"{} must be a boolean flag, got '{}'",
			DEBUG_ENV, other
		))),
	}
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_u64(duration.as_millis() as u64)
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
	u64::deserialize(deserializer).map(Duration::from_millis)
}
