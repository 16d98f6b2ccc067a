/// Errors raised by a transport while posting a message
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	#[error("Window closed: {0}")]
	WindowClosed(String),

	#[error("No window listening on origin: {0}")]
	UnknownTarget(String),

	#[error("Transport state lock poisoned")]
	Poisoned,
}

/// Errors surfaced at the bridge API boundary
///
/// Protocol traffic never fails loudly: dropped sends and rejected origins are
/// logged and swallowed. These variants only cover mistakes the caller can fix.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Invalid document location: {0}")]
	InvalidLocation(String),

	#[error("Code is reserved for built-in handling: {0}")]
	ReservedCode(String),

	#[error("Config error: {0}")]
	Config(String),
}
