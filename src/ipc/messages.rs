//! IPC message types for client ↔ clock daemon communication

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::platform::DisplayState;

/// Requests sent from clients to the clock daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClockRequest {
    /// Launch request: capture, main or remote settings, selected by `operation`
    AppControl {
        operation: String,
        #[serde(default)]
        extra: HashMap<String, String>,
    },

    /// Display power state change
    DisplayState(DisplayState),

    /// Health check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Responses sent from the clock daemon to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClockResponse {
    /// Reply to an app-control request; `result` carries the capture dump path
    Reply {
        result: Option<String>,
        #[serde(default)]
        extra: HashMap<String, String>,
    },

    /// Health check response
    Pong,

    /// Acknowledgment that request was accepted
    Ready,

    /// Error occurred
    Error(String),
}
