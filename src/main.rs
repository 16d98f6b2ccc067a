use frame_state_sync::BridgeConfig;
use frame_state_sync::transport::memory::{MemoryHub, Participant};

use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	let config = match BridgeConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return;
		}
	};

	info!("Starting frame sync demo");
	let hub = MemoryHub::new();

	let windows = (
		hub.participant(config.clone(), "http://portal.local/index.html", None),
		hub.participant(
			config.clone(),
			"http://cart.local/index.html",
			Some("http://portal.local"),
		),
		hub.participant(config, "http://profile.local/index.html", Some("http://portal.local")),
	);
	let (mut portal, mut cart, mut profile) = match windows {
		(Ok(portal), Ok(cart), Ok(profile)) => (portal, cart, profile),
		(Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
			error!("Failed to open window: {}", e);
			return;
		}
	};

	portal
		.bridge
		.add_child(hub.frame("http://portal.local", Some("http://cart.local")), "cart");
	portal
		.bridge
		.add_child(hub.frame("http://portal.local", Some("http://profile.local")), "profile");
	cart.bridge.add_father("http://portal.local", "portal");
	profile.bridge.add_father("http://portal.local", "portal");

	portal.bridge.set_on_message_callback(|event| {
		info!("Portal received custom message from {}: {}", event.origin, event.data);
	});

	let updates = [
		portal.bridge.set_local_data("theme", &"dark"),
		cart.bridge.set_local_data("items", &3),
		profile.bridge.set_local_data("user", &"ada"),
		cart.bridge
			.message_to_father_by_name("portal", &"checkout started", None),
	];
	if let Some(Err(e)) = updates.into_iter().find(Result::is_err) {
		error!("Failed to publish update: {}", e);
		return;
	}

	let tasks = [portal, cart, profile].map(|mut participant| {
		tokio::spawn(async move {
			participant.run_until_idle().await;
			participant
		})
	});

	for task in tasks {
		match task.await {
			Ok(participant) => report(&participant),
			Err(e) => error!("Window task failed: {}", e),
		}
	}

	info!("Frame sync demo finished");
}

fn report(participant: &Participant) {
	info!("Global data seen by {}:", participant.bridge.identity());
	for entry in participant.bridge.global_data().entries() {
		info!("   - {}: {}", entry.uri, serde_json::Value::Object(entry.data.clone()));
	}
}
