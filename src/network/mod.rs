//! Network Layer
//!
//! WebSocket transaction submission for authenticated callers.
//! This layer is **non-deterministic** - all state changes run through `ledger/`.

pub mod auth;
pub mod protocol;
pub mod server;

pub use auth::{authenticate, validate_token, AuthConfig, AuthError, TokenClaims};
pub use protocol::{ClientMessage, ErrorCode, ServerMessage, SubmitRequest};
pub use server::{LedgerServer, LedgerServerError, LedgerService, ServerConfig};
