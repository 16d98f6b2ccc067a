//! Frame bridge: cross-window messaging with a shared global data view.
//!
//! A [`FrameBridge`] lives in one window. It knows its fathers (parent window
//! targets, addressed by origin) and its children (embedded frames, addressed
//! by their live `src`). Application traffic goes out wrapped in an
//! [`Envelope`]; inbound traffic is gated on origin and routed by code.
//!
//! Each bridge also owns a local key/value namespace. Every change to it is
//! folded into the global data aggregate and pushed one hop: up to all
//! fathers if there are any, otherwise down to all children. Fathers relay
//! child snapshots back down, so every window converges on the same view.
//!
//! - `registry`: fathers, children and the inbound origin gate.
//! - `envelope`: the `{code, message}` wire unit and reserved codes.
//! - `store`: the local key/value namespace.
//! - `global_data`: the per-origin aggregate and its merge policies.
//! - `dispatcher`: code classification and user callbacks.

/// Inbound classification and callbacks
pub mod dispatcher;
/// Wire envelope and reserved codes
pub mod envelope;
/// Global data aggregate
pub mod global_data;
/// Father and child registry
pub mod registry;
/// Local data namespace
pub mod store;
/// Error types
pub mod types;

pub use dispatcher::{DispatchOutcome, MessageCallback, Route, SyncDirection};
pub use envelope::{CHILD_GLOBAL_DATA, CUSTOM, Envelope, FATHER_GLOBAL_DATA};
pub use global_data::GlobalData;
pub use registry::{Child, Father, Registry};
pub use store::{LocalData, LocalDataStore};
pub use types::*;

use crate::config::BridgeConfig;
use crate::transport::{FrameHandle, MessageEvent, ParentWindow};
use crate::utils::participant_uri;
use dispatcher::CallbackRegistry;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Per-window messaging context.
///
/// Not internally synchronized: all calls, inbound events included, are
/// expected to come from one execution context at a time.
pub struct FrameBridge {
	config: BridgeConfig,
	parent: Arc<dyn ParentWindow>,
	registry: Registry,
	store: LocalDataStore,
	global: GlobalData,
	callbacks: CallbackRegistry,
}

impl FrameBridge {
	/// Create a bridge for the document at `location`.
	pub fn new(
		config: BridgeConfig,
		location: &str,
		parent: Arc<dyn ParentWindow>,
	) -> Result<Self, BridgeError> {
		let uri = participant_uri(location)?;
		Ok(Self::with_identity(config, uri, parent))
	}

	/// Create a bridge with an already derived participant identity.
	pub fn with_identity(
		config: BridgeConfig,
		uri: impl Into<String>,
		parent: Arc<dyn ParentWindow>,
	) -> Self {
		let store = LocalDataStore::new(uri);
		info!("Frame bridge ready for {}", store.uri());
		Self {
			config,
			parent,
			registry: Registry::new(),
			store,
			global: GlobalData::new(),
			callbacks: CallbackRegistry::new(),
		}
	}

	pub fn identity(&self) -> &str {
		self.store.uri()
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn set_debug(&mut self, debug: bool) {
		self.config.debug = debug;
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Register a parent target and seed it with the current aggregate.
	pub fn add_father(&mut self, uri: impl Into<String>, name: impl Into<String>) {
		self.registry.add_father(uri, name);
		self.global.upsert(self.store.get().clone());
		self.post_global_to_fathers();
	}

	/// Register an embedded frame and seed the children with the current aggregate.
	pub fn add_child(&mut self, frame: Arc<dyn FrameHandle>, name: impl Into<String>) {
		self.registry.add_child(frame, name);
		self.global.upsert(self.store.get().clone());
		self.post_global_to_children();
	}

	pub fn set_on_message_callback<F>(&mut self, callback: F)
	where
		F: FnMut(&MessageEvent) + Send + 'static,
	{
		self.callbacks.set_custom(Box::new(callback));
	}

	/// Bind a callback to a non-reserved code. At most one callback per code.
	pub fn add_on_message_callback<F>(&mut self, code: &str, callback: F) -> Result<(), BridgeError>
	where
		F: FnMut(&MessageEvent) + Send + 'static,
	{
		self.callbacks.add(code, Box::new(callback))
	}

	pub fn remove_on_message_callback(&mut self, code: &str) -> bool {
		self.callbacks.remove(code)
	}

	pub fn message_to_father_by_name<T: Serialize>(
		&self,
		name: &str,
		message: &T,
		code: Option<&str>,
	) -> Result<(), BridgeError> {
		let payload = Self::wrap(message, code)?;
		match self.registry.father_by_name(name) {
			Some(father) => self.post_to_father(father, &payload),
			None => debug!("No father named '{}', message dropped", name),
		}
		Ok(())
	}

	pub fn message_to_child_by_name<T: Serialize>(
		&self,
		name: &str,
		message: &T,
		code: Option<&str>,
	) -> Result<(), BridgeError> {
		let payload = Self::wrap(message, code)?;
		match self.registry.child_by_name(name) {
			Some(child) => self.post_to_child(child, &payload),
			None => debug!("No child named '{}', message dropped", name),
		}
		Ok(())
	}

	pub fn message_to_all_fathers<T: Serialize>(
		&self,
		message: &T,
		code: Option<&str>,
	) -> Result<(), BridgeError> {
		let payload = Self::wrap(message, code)?;
		for father in self.registry.fathers() {
			self.post_to_father(father, &payload);
		}
		Ok(())
	}

	pub fn message_to_all_children<T: Serialize>(
		&self,
		message: &T,
		code: Option<&str>,
	) -> Result<(), BridgeError> {
		let payload = Self::wrap(message, code)?;
		for child in self.registry.children() {
			self.post_to_child(child, &payload);
		}
		Ok(())
	}

	/// Set a local key and propagate the updated aggregate.
	pub fn set_local_data<T: Serialize>(
		&mut self,
		key: impl Into<String>,
		value: &T,
	) -> Result<(), BridgeError> {
		let value = serde_json::to_value(value)?;
		self.store.set(key, value);
		self.sync_global();
		Ok(())
	}

	/// Remove one local key, or all of them, and propagate the updated aggregate.
	pub fn remove_local_data(&mut self, key: Option<&str>) {
		self.store.remove(key);
		self.sync_global();
	}

	pub fn local_data(&self) -> &LocalData {
		self.store.get()
	}

	pub fn global_data(&self) -> &GlobalData {
		&self.global
	}

	/// Handle one inbound event.
	///
	/// Events from unregistered origins are dropped before any handler runs.
	pub fn handle_message(&mut self, event: MessageEvent) -> DispatchOutcome {
		if self.config.debug {
			info!("Inbound message from {}: {}", event.origin, event.data);
		}

		if !self.registry.is_correct_origin(&event.origin) {
			trace!("Rejected message from unknown origin {}", event.origin);
			return DispatchOutcome::Rejected;
		}

		let envelope = Envelope::unwrap_data(&event.data);
		let outcome = match Route::classify(&envelope.code) {
			Route::Custom => DispatchOutcome::Custom {
				handled: self.callbacks.invoke_custom(&event),
			},
			Route::Sync(direction) => match GlobalData::from_message(&envelope.message) {
				Some(snapshot) => {
					self.apply_snapshot(direction, snapshot);
					DispatchOutcome::Sync(direction)
				}
				None => {
					debug!(
						"Ignoring {} from {}: payload is not a global data snapshot",
						envelope.code, event.origin
					);
					DispatchOutcome::Ignored
				}
			},
		};

		self.callbacks.invoke_for_code(&envelope.code, &event);
		outcome
	}

	/// Drop registrations, callbacks, local data and the aggregate.
	///
	/// Identity, transport and configuration are kept.
	pub fn reset(&mut self) {
		self.registry.clear();
		self.callbacks.clear();
		self.store.remove(None);
		self.global.clear();
	}

	fn apply_snapshot(&mut self, direction: SyncDirection, snapshot: GlobalData) {
		match direction {
			SyncDirection::FromChild => {
				self.global.merge_child_snapshot(snapshot, self.store.get());
				self.propagate();
			}
			SyncDirection::FromFather => {
				self.global
					.replace_with_father_snapshot(snapshot, self.store.get());
				// never back up, or father and child would echo each other forever
				self.post_global_to_children();
			}
		}
	}

	fn sync_global(&mut self) {
		self.global.upsert(self.store.get().clone());
		self.propagate();
	}

	/// Push the aggregate up to the fathers, or down to the children when there are none.
	fn propagate(&self) {
		if !self.registry.fathers().is_empty() {
			self.post_global_to_fathers();
		} else if !self.registry.children().is_empty() {
			self.post_global_to_children();
		}
	}

	fn post_global_to_fathers(&self) {
		if let Some(payload) = self.global_payload(CHILD_GLOBAL_DATA) {
			for father in self.registry.fathers() {
				self.post_to_father(father, &payload);
			}
		}
	}

	fn post_global_to_children(&self) {
		if let Some(payload) = self.global_payload(FATHER_GLOBAL_DATA) {
			for child in self.registry.children() {
				self.post_to_child(child, &payload);
			}
		}
	}

	fn global_payload(&self, code: &str) -> Option<Value> {
		match self.global.to_value() {
			Ok(snapshot) => Some(Envelope::wrap(snapshot, Some(code)).to_value()),
			Err(e) => {
				warn!("Failed to serialize global data: {}", e);
				None
			}
		}
	}

	fn post_to_father(&self, father: &Father, payload: &Value) {
		if let Err(e) = self.parent.post_message(payload, &father.uri) {
			debug!("Post to father '{}' ({}) dropped: {}", father.name, father.uri, e);
		}
	}

	fn post_to_child(&self, child: &Child, payload: &Value) {
		let Some(src) = child.src() else {
			debug!("Child '{}' has no src, message dropped", child.name);
			return;
		};
		if let Err(e) = child.frame.post_message(payload, &src) {
			debug!("Post to child '{}' ({}) dropped: {}", child.name, src, e);
		}
	}

	fn wrap<T: Serialize>(message: &T, code: Option<&str>) -> Result<Value, BridgeError> {
		let message = serde_json::to_value(message)?;
		Ok(Envelope::wrap(message, code).to_value())
	}
}

/// Holder for the one bridge a window runs.
///
/// The first [`BridgeSlot::init`] builds the bridge; later calls hand back the
/// same instance and only re-apply the debug flag.
#[derive(Default)]
pub struct BridgeSlot {
	bridge: Option<FrameBridge>,
}

impl BridgeSlot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn init(
		&mut self,
		config: BridgeConfig,
		location: &str,
		parent: Arc<dyn ParentWindow>,
	) -> Result<&mut FrameBridge, BridgeError> {
		let bridge = match self.bridge.take() {
			Some(mut bridge) => {
				bridge.set_debug(config.debug);
				bridge
			}
			None => FrameBridge::new(config, location, parent)?,
		};
		Ok(self.bridge.insert(bridge))
	}

	pub fn get(&self) -> Option<&FrameBridge> {
		self.bridge.as_ref()
	}

	pub fn get_mut(&mut self) -> Option<&mut FrameBridge> {
		self.bridge.as_mut()
	}

	pub fn reset(&mut self) {
		self.bridge = None;
	}
}
