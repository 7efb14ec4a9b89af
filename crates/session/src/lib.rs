//! Bounded per-user conversational state.
//!
//! Sessions hold slot values for multi-turn personalization, a short FIFO
//! message history and an ask budget that keeps the bot from interrogating
//! users. Losing a session degrades UX, never correctness, so eviction is
//! a plain garbage-collection sweep.

mod slots;
mod state;
mod store;

pub use slots::{extract_slots, SlotKey, SlotValue};
pub use state::{HistoryTurn, Role, SessionConfig, SessionState};
pub use store::{InMemorySessionStore, SessionStore};
