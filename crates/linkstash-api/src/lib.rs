pub mod accounts;
pub mod auth;
pub mod error;
pub mod health;
pub mod links;
pub mod middleware;
pub mod router;
pub mod state;

pub use accounts::Accounts;
pub use error::ApiError;
pub use middleware::TokenKeys;
pub use router::router;
pub use state::{AppState, AppStateInner};
