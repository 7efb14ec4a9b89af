//! The dialogue policy: per-message routing, clarifying-question budget,
//! prompt assembly and reply rendering.
//!
//! One call to [`Router::handle_message`] is one complete turn. The router
//! never fails: every sub-step failure degrades to the next-lower-
//! confidence path and the turn always produces deliverable output.

mod compose;
mod config;
mod render;
mod router;

pub use compose::compose;
pub use config::PolicyConfig;
pub use render::{render_payload, Outbound};
pub use router::{Router, RouteState};
