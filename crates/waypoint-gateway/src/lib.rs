//! HTTP surface for the Waypoint supervisor: chat over server-sent events,
//! health, and the bundled index page.
pub mod chat_server;

pub use chat_server::*;
