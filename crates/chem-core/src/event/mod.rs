//! Definiciones de eventos de sesión y trait EventStore.

mod store;
mod types;

pub use store::EventStore;
pub use store::InMemoryEventStore;
pub use types::{SessionEvent, SessionEventKind};
