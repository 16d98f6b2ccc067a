//! Window messaging capabilities consumed by the bridge.
//!
//! The bridge never talks to a browser directly. It needs two things from the
//! host: a way to post into the parent window with a target-origin
//! restriction, and a handle on each embedded frame that exposes the frame's
//! live `src` and can post into its content. Inbound traffic arrives as
//! [`MessageEvent`]s tagged with the sender's origin.

/// In-process hub implementing both capabilities over channels
pub mod memory;

use crate::bridge::TransportError;

use serde_json::Value;

/// An inbound cross-window message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
	/// Origin of the sending window.
	pub origin: String,
	/// Raw posted data, normally an envelope object.
	pub data: Value,
}

impl MessageEvent {
	pub fn new(origin: impl Into<String>, data: Value) -> Self {
		Self {
			origin: origin.into(),
			data,
		}
	}
}

/// The parent window as seen from inside a frame.
pub trait ParentWindow: Send + Sync {
	/// Post `message` to the parent, delivered only if the parent's origin is `target_origin`.
	fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError>;
}

/// An embedded frame element owned by this window.
pub trait FrameHandle: Send + Sync {
	/// The frame's current `src` attribute, or `None` if it has none or the element is gone.
	fn src(&self) -> Option<String>;

	/// Post `message` into the frame's content window.
	fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError>;
}
