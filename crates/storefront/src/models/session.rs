//! Session-related types.
//!
//! Keys for values stored in the session.

/// Session keys for client identity.
pub mod keys {
    /// Key for the client id that owns the persisted cart.
    pub const CLIENT_ID: &str = "client_id";
}
