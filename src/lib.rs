//! RoboVeda client-state core
//!
//! Explicit state containers for the RoboVeda platform client: the
//! session store, the wallet/chain store, and the streaming AI
//! conversation. Each store owns its slice of state exclusively,
//! exposes snapshot + subscribe reads, and drives its own async I/O
//! through injected collaborator traits.

pub mod chain;
pub mod chat;
pub mod error;
pub mod persist;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use error::{ErrorKind, StoreError};
pub use store::{StateCell, Subscription};
