//! Tracing targets used by the wallet.

/// Per-request tracing, at `debug` level when the wallet is built with `debug` set.
pub const RPC_TARGET: &str = "wallet::rpc";
/// JSON-RPC envelopes sent to the chain node.
pub const FORWARD_TARGET: &str = "wallet::forward";
/// Listener failures.
pub const EVENTS_TARGET: &str = "wallet::events";
/// Session transitions triggered through the control surface.
pub const CONTROL_TARGET: &str = "wallet::control";
/// The HTTP bridge.
pub const SERVER_TARGET: &str = "wallet::server";
