//! In-process window hub.
//!
//! Stands in for the browser: every window registers an inbox under its
//! origin, parents and frames post through the hub, and each window handles
//! its inbox one event at a time through [`Participant`].

use crate::bridge::{BridgeError, FrameBridge, TransportError};
use crate::config::BridgeConfig;
use crate::transport::{FrameHandle, MessageEvent, ParentWindow};
use crate::utils::participant_uri;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Routing table from window origin to inbox.
#[derive(Clone, Default)]
pub struct MemoryHub {
	windows: Arc<RwLock<HashMap<String, UnboundedSender<MessageEvent>>>>,
}

impl MemoryHub {
	pub fn new() -> Self {
		Self::default()
	}

	/// Open a window at `origin`, replacing any window already there.
	pub fn open_window(&self, origin: &str) -> Result<UnboundedReceiver<MessageEvent>, TransportError> {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut windows = self.windows.write().map_err(|_| TransportError::Poisoned)?;
		windows.insert(origin.to_string(), tx);
		Ok(rx)
	}

	pub fn close_window(&self, origin: &str) -> Result<(), TransportError> {
		let mut windows = self.windows.write().map_err(|_| TransportError::Poisoned)?;
		windows.remove(origin);
		Ok(())
	}

	fn deliver(&self, from: &str, target_origin: &str, message: &Value) -> Result<(), TransportError> {
		let windows = self.windows.read().map_err(|_| TransportError::Poisoned)?;
		let inbox = windows
			.get(target_origin)
			.ok_or_else(|| TransportError::UnknownTarget(target_origin.to_string()))?;
		inbox
			.send(MessageEvent::new(from, message.clone()))
			.map_err(|_| TransportError::WindowClosed(target_origin.to_string()))
	}

	/// The parent window of the window at `origin`.
	pub fn parent_of(&self, origin: &str, parent_origin: Option<&str>) -> Arc<HubParent> {
		Arc::new(HubParent {
			hub: self.clone(),
			origin: origin.to_string(),
			parent_origin: parent_origin.map(str::to_string),
		})
	}

	/// A frame element embedded in the window at `owner_origin`.
	pub fn frame(&self, owner_origin: &str, src: Option<&str>) -> Arc<HubFrame> {
		Arc::new(HubFrame {
			hub: self.clone(),
			owner_origin: owner_origin.to_string(),
			src: RwLock::new(src.map(str::to_string)),
		})
	}

	/// Open a window for the document at `location` and attach a bridge to it.
	pub fn participant(
		&self,
		config: BridgeConfig,
		location: &str,
		parent_origin: Option<&str>,
	) -> Result<Participant, BridgeError> {
		let origin = participant_uri(location)?;
		let inbox = self
			.open_window(&origin)
			.map_err(|e| BridgeError::Config(e.to_string()))?;
		let parent = self.parent_of(&origin, parent_origin);
		let bridge = FrameBridge::with_identity(config, origin, parent);
		Ok(Participant::new(bridge, inbox))
	}
}

/// Parent window handle. Posts are only delivered when the target origin is
/// the real parent's origin.
pub struct HubParent {
	hub: MemoryHub,
	origin: String,
	parent_origin: Option<String>,
}

impl ParentWindow for HubParent {
	fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError> {
		match self.parent_origin.as_deref() {
			Some(parent) if parent == target_origin => {
				self.hub.deliver(&self.origin, target_origin, message)
			}
			_ => Err(TransportError::UnknownTarget(target_origin.to_string())),
		}
	}
}

/// Frame element handle whose `src` can be changed or removed.
pub struct HubFrame {
	hub: MemoryHub,
	owner_origin: String,
	src: RwLock<Option<String>>,
}

impl HubFrame {
	pub fn set_src(&self, src: Option<&str>) {
		if let Ok(mut current) = self.src.write() {
			*current = src.map(str::to_string);
		}
	}
}

impl FrameHandle for HubFrame {
	fn src(&self) -> Option<String> {
		self.src.read().ok().and_then(|src| src.clone())
	}

	fn post_message(&self, message: &Value, target_origin: &str) -> Result<(), TransportError> {
		self.hub.deliver(&self.owner_origin, target_origin, message)
	}
}

/// A bridge together with its window's inbox.
pub struct Participant {
	pub bridge: FrameBridge,
	inbox: UnboundedReceiver<MessageEvent>,
}

impl Participant {
	pub fn new(bridge: FrameBridge, inbox: UnboundedReceiver<MessageEvent>) -> Self {
		Self { bridge, inbox }
	}

	/// Handle every event already queued, one at a time. Returns how many ran.
	pub fn drain(&mut self) -> usize {
		let mut handled = 0;
		while let Ok(event) = self.inbox.try_recv() {
			self.bridge.handle_message(event);
			handled += 1;
		}
		handled
	}

	/// Handle events until none arrives within the configured idle timeout.
	pub async fn run_until_idle(&mut self) -> usize {
		let idle_timeout = self.bridge.config().idle_timeout;
		let mut last_event_time = tokio::time::Instant::now();
		let mut handled = 0;

		loop {
			let timeout = tokio::time::sleep_until(last_event_time + idle_timeout);
			tokio::pin!(timeout);

			tokio::select! {
				event = self.inbox.recv() => {
					let Some(event) = event else {
						debug!("Inbox of {} closed", self.bridge.identity());
						break;
					};
					last_event_time = tokio::time::Instant::now();
					self.bridge.handle_message(event);
					handled += 1;
				}
				_ = &mut timeout => {
					info!(
						"{} idle for {}ms after {} events",
						self.bridge.identity(),
						idle_timeout.as_millis(),
						handled
					);
					break;
				}
			}
		}

		handled
	}
}

/// Drain every participant until no window has anything queued.
pub fn settle(participants: &mut [&mut Participant]) -> usize {
	let mut total = 0;
	loop {
		let round: usize = participants.iter_mut().map(|p| p.drain()).sum();
		if round == 0 {
			return total;
		}
		total += round;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bridge::DispatchOutcome;
	use serde_json::json;
	use std::sync::Mutex;
	use std::time::Duration;

	fn entry_data<'a>(p: &'a Participant, uri: &str) -> Option<&'a serde_json::Map<String, Value>> {
		p.bridge.global_data().get(uri).map(|entry| &entry.data)
	}

	/// portal embeds cart and profile; cart embeds a payment widget
	fn tree(hub: &MemoryHub) -> (Participant, Participant, Participant, Participant) {
		let config = BridgeConfig::default();
		let mut portal = hub.participant(config.clone(), "http://portal/index.html", None).unwrap();
		let mut cart = hub
			.participant(config.clone(), "http://cart/index.html", Some("http://portal"))
			.unwrap();
		let mut profile = hub
			.participant(config.clone(), "http://profile/index.html", Some("http://portal"))
			.unwrap();
		let mut pay = hub
			.participant(config, "http://pay/index.html", Some("http://cart"))
			.unwrap();

		portal
			.bridge
			.add_child(hub.frame("http://portal", Some("http://cart")), "cart");
		portal
			.bridge
			.add_child(hub.frame("http://portal", Some("http://profile")), "profile");
		cart.bridge.add_father("http://portal", "portal");
		cart.bridge
			.add_child(hub.frame("http://cart", Some("http://pay")), "pay");
		profile.bridge.add_father("http://portal", "portal");
		pay.bridge.add_father("http://cart", "cart");

		(portal, cart, profile, pay)
	}

	#[test]
	fn test_tree_converges() {
		let hub = MemoryHub::new();
		let (mut portal, mut cart, mut profile, mut pay) = tree(&hub);
		settle(&mut [&mut portal, &mut cart, &mut profile, &mut pay]);

		portal.bridge.set_local_data("user", &"ada").unwrap();
		cart.bridge.set_local_data("items", &3).unwrap();
		pay.bridge.set_local_data("method", &"card").unwrap();
		settle(&mut [&mut portal, &mut cart, &mut profile, &mut pay]);

		for p in [&portal, &cart, &profile, &pay] {
			assert_eq!(p.bridge.global_data().len(), 4, "{}", p.bridge.identity());
			assert_eq!(entry_data(p, "http://portal").unwrap().get("user"), Some(&json!("ada")));
			assert_eq!(entry_data(p, "http://cart").unwrap().get("items"), Some(&json!(3)));
			assert_eq!(entry_data(p, "http://pay").unwrap().get("method"), Some(&json!("card")));
			assert!(entry_data(p, "http://profile").unwrap().is_empty());
		}

		profile.bridge.remove_local_data(None);
		cart.bridge.remove_local_data(Some("items"));
		settle(&mut [&mut portal, &mut cart, &mut profile, &mut pay]);
		for p in [&portal, &cart, &profile, &pay] {
			assert!(entry_data(p, "http://cart").unwrap().is_empty());
		}
	}

	#[test]
	fn test_custom_messages_between_windows() {
		let hub = MemoryHub::new();
		let (mut portal, mut cart, mut profile, mut pay) = tree(&hub);
		settle(&mut [&mut portal, &mut cart, &mut profile, &mut pay]);

		let received = Arc::new(Mutex::new(Vec::new()));
		let sink = received.clone();
		portal.bridge.set_on_message_callback(move |event| {
			sink.lock().unwrap().push((event.origin.clone(), event.data["message"].clone()))
		});

		cart.bridge
			.message_to_father_by_name("portal", &json!({"checkout": true}), None)
			.unwrap();
		// pay's parent is cart, so a post aimed at the portal never arrives
		pay.bridge.add_father("http://portal", "portal");
		pay.bridge
			.message_to_father_by_name("portal", &"skip", None)
			.unwrap();
		settle(&mut [&mut portal, &mut cart, &mut profile, &mut pay]);

		assert_eq!(
			*received.lock().unwrap(),
			vec![("http://cart".to_string(), json!({"checkout": true}))]
		);
	}

	#[test]
	fn test_navigated_frame_is_no_longer_trusted() {
		let hub = MemoryHub::new();
		let mut portal = hub
			.participant(BridgeConfig::default(), "http://portal/index.html", None)
			.unwrap();
		let mut rogue = hub
			.participant(BridgeConfig::default(), "http://rogue/index.html", Some("http://portal"))
			.unwrap();
		let frame = hub.frame("http://portal", Some("http://rogue"));
		portal.bridge.add_child(frame.clone(), "widget");
		rogue.bridge.add_father("http://portal", "portal");

		frame.set_src(Some("http://elsewhere"));
		rogue.bridge.set_local_data("x", &1).unwrap();

		// seed from add_father plus the local update
		let mut rejected = 0;
		while let Ok(event) = portal.inbox.try_recv() {
			assert_eq!(event.origin, "http://rogue");
			assert_eq!(portal.bridge.handle_message(event), DispatchOutcome::Rejected);
			rejected += 1;
		}
		assert_eq!(rejected, 2);
		assert!(portal.bridge.global_data().get("http://rogue").is_none());

		// the rogue window still trusts its parent
		assert_eq!(rogue.drain(), 1);
	}

	#[test]
	fn test_closed_window_drops_silently() {
		let hub = MemoryHub::new();
		let mut portal = hub
			.participant(BridgeConfig::default(), "http://portal/index.html", None)
			.unwrap();
		portal
			.bridge
			.add_child(hub.frame("http://portal", Some("http://gone")), "gone");
		portal.bridge.set_local_data("k", &1).unwrap();
		hub.close_window("http://portal").unwrap();
		assert_eq!(portal.drain(), 0);
	}

	#[tokio::test]
	async fn test_run_until_idle() {
		let hub = MemoryHub::new();
		let config = BridgeConfig {
			idle_timeout: Duration::from_millis(30),
			..BridgeConfig::default()
		};
		let mut portal = hub
			.participant(config.clone(), "http://portal/index.html", None)
			.unwrap();
		let mut cart = hub
			.participant(config, "http://cart/index.html", Some("http://portal"))
			.unwrap();
		portal
			.bridge
			.add_child(hub.frame("http://portal", Some("http://cart")), "cart");
		cart.bridge.add_father("http://portal", "portal");
		cart.bridge.set_local_data("items", &2).unwrap();

		// seed from add_child is already queued for cart, cart's two posts for portal
		assert_eq!(portal.run_until_idle().await, 2);
		assert_eq!(cart.run_until_idle().await, 3);
		assert_eq!(
			cart.bridge.global_data(),
			portal.bridge.global_data()
		);
		assert_eq!(portal.bridge.global_data().len(), 2);
	}
}
