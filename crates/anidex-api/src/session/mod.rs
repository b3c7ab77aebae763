//! Account backend client module.
//!
//! Registration, login, profile lookup and list toggling. These calls
//! are low-traffic and go straight to the backend, unqueued.

mod api;
mod client;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalSessionApi, SessionApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{SessionClient, SessionClientBuilder};
pub use types::{
    AuthResponse, Credentials, ListKind, Membership, ParseListKindError, Profile, RegisterRequest,
    Session, ToggleResponse,
};
