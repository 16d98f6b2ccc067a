//! Inbound message classification and user callbacks.
//!
//! Every inbound event ends in one of three states: rejected by the origin
//! gate, routed to the custom callback (code `CUSTOM` or anything
//! unrecognized), or routed to the global data merger (the two sync codes).
//! Callbacks registered for a specific code run after that built-in handling.

use crate::bridge::BridgeError;
use crate::bridge::envelope::{CHILD_GLOBAL_DATA, CUSTOM, FATHER_GLOBAL_DATA};
use crate::transport::MessageEvent;

use std::collections::HashMap;
use tracing::debug;

/// Handler invoked with the raw inbound event.
pub type MessageCallback = Box<dyn FnMut(&MessageEvent) + Send>;

/// Which way a global data snapshot travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
	/// `CHILD_GLOBAL_DATA`, merged additively.
	FromChild,
	/// `FATHER_GLOBAL_DATA`, replaces the aggregate.
	FromFather,
}

/// Dispatch branch selected by an envelope code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
	Custom,
	Sync(SyncDirection),
}

impl Route {
	pub fn classify(code: &str) -> Self {
		match code {
			CHILD_GLOBAL_DATA => Route::Sync(SyncDirection::FromChild),
			FATHER_GLOBAL_DATA => Route::Sync(SyncDirection::FromFather),
			_ => Route::Custom,
		}
	}
}

/// What handling an inbound event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// Origin not registered, nothing ran.
	Rejected,
	/// Custom traffic; `handled` is false when no custom callback was set.
	Custom { handled: bool },
	/// A snapshot was merged and propagated.
	Sync(SyncDirection),
	/// A sync code arrived with a payload that is not a snapshot.
	Ignored,
}

pub fn is_reserved(code: &str) -> bool {
	matches!(code, CUSTOM | CHILD_GLOBAL_DATA | FATHER_GLOBAL_DATA)
}

/// Registered user callbacks.
#[derive(Default)]
pub struct CallbackRegistry {
	custom: Option<MessageCallback>,
	by_code: HashMap<String, MessageCallback>,
}

impl CallbackRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_custom(&mut self, callback: MessageCallback) {
		self.custom = Some(callback);
	}

	/// Bind `callback` to a non-reserved code, replacing any previous one.
	pub fn add(&mut self, code: &str, callback: MessageCallback) -> Result<(), BridgeError> {
		if is_reserved(code) {
			return Err(BridgeError::ReservedCode(code.to_string()));
		}
		if self.by_code.insert(code.to_string(), callback).is_some() {
			debug!("Replaced message callback for code {}", code);
		}
		Ok(())
	}

	pub fn remove(&mut self, code: &str) -> bool {
		self.by_code.remove(code).is_some()
	}

	pub fn has_code(&self, code: &str) -> bool {
		self.by_code.contains_key(code)
	}

	/// Run the custom callback, returning whether one was set.
	pub fn invoke_custom(&mut self, event: &MessageEvent) -> bool {
		match self.custom.as_mut() {
			Some(callback) => {
				callback(event);
				true
			}
			None => {
				debug!("No custom callback registered, dropping message from {}", event.origin);
				false
			}
		}
	}

	pub fn invoke_for_code(&mut self, code: &str, event: &MessageEvent) -> bool {
		match self.by_code.get_mut(code) {
			Some(callback) => {
				callback(event);
				true
			}
			None => false,
		}
	}

	pub fn clear(&mut self) {
		self.custom = None;
		self.by_code.clear();
	}
}
