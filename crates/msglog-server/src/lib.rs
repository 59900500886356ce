//! HTTP server for msglog.
//!
//! Every client operation goes through `/` with a `method` query parameter:
//! `addMessage` (POST, JSON body), `getPage`, `getMessage` and
//! `downloadAttachment`. Newly created messages are pushed to WebSocket
//! clients connected at `/ws`.

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use command::Command;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::MsglogServer;
pub use state::AppState;
