//! Client side of linkstash: a session holding the signed-in user's links,
//! optimistic mutations with rollback, and the HTTP transport.

pub mod api;
pub mod error;
pub mod filter;
pub mod http;
pub mod optimistic;
pub mod session;

pub use api::LinkApi;
pub use error::ClientError;
pub use filter::{Tab, apply_tab_filter};
pub use http::HttpApi;
pub use session::{Session, SessionState, View};
