//! The `{code, message}` wire unit exchanged between windows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default code for application traffic.
pub const CUSTOM: &str = "CUSTOM";
/// Aggregate snapshot sent by a child to its fathers.
pub const CHILD_GLOBAL_DATA: &str = "CHILD_GLOBAL_DATA";
/// Aggregate snapshot sent by a father to its children.
pub const FATHER_GLOBAL_DATA: &str = "FATHER_GLOBAL_DATA";

fn default_code() -> String {
	CUSTOM.to_string()
}

/// A cross-window message.
///
/// Missing fields are tolerated on the way in: an absent `code` reads as
/// [`CUSTOM`] and an absent `message` as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	#[serde(default = "default_code")]
	pub code: String,
	#[serde(default)]
	pub message: Value,
}

impl Envelope {
	/// Wrap a payload, defaulting the code to [`CUSTOM`].
	pub fn wrap(message: Value, code: Option<&str>) -> Self {
		Self {
			code: code.unwrap_or(CUSTOM).to_string(),
			message,
		}
	}

	/// Read an envelope out of raw event data.
	///
	/// Data that is not a JSON object is treated as the message of a
	/// [`CUSTOM`] envelope, the way a bare `postMessage("hello")` would arrive.
	pub fn unwrap_data(data: &Value) -> Self {
		match data {
			Value::Object(_) => serde_json::from_value(data.clone())
				.unwrap_or_else(|_| Self::wrap(data.clone(), None)),
			other => Self::wrap(other.clone(), None),
		}
	}

	pub fn to_value(&self) -> Value {
		serde_json::json!({ "code": self.code, "message": self.message })
	}
}
