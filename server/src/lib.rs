//! chessweb server: per-session chess games against a UCI engine, served
//! as a JSON API.

pub mod api;
pub mod config;
pub mod session;

pub use config::Config;
pub use session::{SessionError, SessionStore};
