//! Session identity store
//!
//! Owns the authenticated user and the loading/error flags around the
//! auth actions. The backend session cookie is HTTP-only and managed by
//! the transport; the store only tracks identity.

mod api;
mod state;
mod store;

pub use api::{HttpSessionApi, SessionApi};
pub use state::{Preferences, SessionSnapshot, SessionState, Theme, User};
pub use store::{PreferencesUpdate, SessionStore, UserUpdate, SESSION_STORAGE_KEY};
