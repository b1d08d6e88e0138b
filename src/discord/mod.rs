//! Discord side of the bot: text commands, rendering, and the link relay

pub mod commands;
pub mod handler;
pub mod relay;
pub mod render;

pub use handler::Handler;
pub use relay::{IncomingMessage, Relay, RelayChannel, RelayOutcome, RelayPlan};
