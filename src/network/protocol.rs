//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON text frames, internally tagged by `type`.

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::Wei;
use crate::ledger::{Call, CallOutput, Commitment, ErrorKind, EventRecord, LedgerEvent};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authenticate with the server.
    Auth(AuthRequest),

    /// Submit a transaction as the authenticated caller.
    Submit(SubmitRequest),

    /// Read a commitment root.
    QueryRoot {
        /// Which root.
        commitment: Commitment,
    },

    /// Read the claimed-so-far amount of an account.
    QueryClaimed {
        /// Account to look up.
        account: Address,
        /// Token, or the native prize ledger when absent.
        #[serde(default)]
        token: Option<Address>,
    },

    /// Read committed events after a sequence number.
    QueryEvents {
        /// Exclusive lower bound.
        since: u64,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

/// Authentication request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    /// JWT whose subject is the caller address.
    pub token: String,
    /// Client version for diagnostics.
    #[serde(default)]
    pub client_version: Option<String>,
}

/// Transaction submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Correlation id; assigned by the server when absent.
    #[serde(default)]
    pub request_id: Option<Uuid>,
    /// Native currency attached to the call.
    #[serde(default)]
    pub value: Wei,
    /// Operation to execute.
    pub call: Call,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authentication result.
    AuthResult(AuthResult),

    /// Transaction committed.
    Receipt(ReceiptInfo),

    /// Transaction rejected with no effect.
    Rejected(Rejection),

    /// Commitment root.
    Root {
        /// Which root.
        commitment: Commitment,
        /// Active value.
        root: B256,
        /// Rotation count.
        version: u64,
    },

    /// Claimed-so-far amount.
    Claimed {
        /// Account looked up.
        account: Address,
        /// Token, absent for native prizes.
        token: Option<Address>,
        /// Amount claimed so far.
        amount: U256,
    },

    /// Committed events after a sequence.
    Events {
        /// Matching records (possibly truncated).
        records: Vec<EventRecord>,
        /// Latest committed sequence.
        sequence: u64,
    },

    /// Live event broadcast.
    Event(EventRecord),

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server time (Unix millis).
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Reason text.
        reason: String,
    },
}

/// Authentication result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResult {
    /// Whether auth succeeded.
    pub success: bool,
    /// Attested caller if successful.
    pub caller: Option<Address>,
    /// Error code if failed.
    #[serde(default)]
    pub code: Option<ErrorCode>,
    /// Error message if failed.
    pub error: Option<String>,
    /// Server version.
    pub server_version: String,
}

/// Committed transaction details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptInfo {
    /// Correlation id.
    pub request_id: Uuid,
    /// Global sequence number.
    pub sequence: u64,
    /// Call result.
    pub output: CallOutput,
    /// Events emitted.
    pub events: Vec<LedgerEvent>,
    /// Commit time.
    pub committed_at: DateTime<Utc>,
}

/// Rejected transaction details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    /// Correlation id.
    pub request_id: Uuid,
    /// Error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Build an error message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Authentication failed.
    AuthFailed,
    /// Not authenticated.
    NotAuthenticated,
    /// JWT token has expired.
    TokenExpired,
    /// Invalid JWT token (signature, format, claims).
    InvalidToken,
    /// Invalid input.
    InvalidInput,
    /// The transaction ran but could not be made durable; it was rolled back.
    PersistFailed,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Error message shorthand.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError::new(code, message))
    }
}
