//! Cross-window messaging between an embedding page and its frames.
//!
//! Windows exchange `{code, message}` envelopes and keep a shared, per-origin
//! view of each participant's key/value data. See [`bridge`] for the protocol
//! and [`transport`] for the host capabilities it runs on.

pub mod bridge;
pub mod config;
pub mod transport;
pub mod utils;

pub use bridge::{BridgeError, BridgeSlot, DispatchOutcome, Envelope, FrameBridge, GlobalData, LocalData};
pub use config::BridgeConfig;
pub use transport::{FrameHandle, MessageEvent, ParentWindow};
