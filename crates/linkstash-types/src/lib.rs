pub mod api;
pub mod flag;
pub mod models;

pub use models::{Category, Link, LinkInputError, NewLink};
