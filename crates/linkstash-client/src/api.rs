use std::future::Future;

use linkstash_types::Link;
use linkstash_types::api::{AddLinkRequest, AuthResponse, UserSummary};

use crate::error::ClientError;

/// The remote operations the session depends on. `HttpApi` talks to the
/// server; tests substitute an in-memory fake.
pub trait LinkApi: Send + Sync {
    fn register(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ClientError>> + Send;

    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ClientError>> + Send;

    fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ClientError>> + Send;

    fn check_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<bool, ClientError>> + Send;

    fn verify(&self, token: &str)
    -> impl Future<Output = Result<UserSummary, ClientError>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn list_links(&self, token: &str)
    -> impl Future<Output = Result<Vec<Link>, ClientError>> + Send;

    fn add_link(
        &self,
        token: &str,
        link: &AddLinkRequest,
    ) -> impl Future<Output = Result<Link, ClientError>> + Send;

    fn delete_link(
        &self,
        token: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn mark_read(
        &self,
        token: &str,
        id: &str,
        is_read: bool,
    ) -> impl Future<Output = Result<Link, ClientError>> + Send;

    fn toggle_favorite(
        &self,
        token: &str,
        id: &str,
        is_favorite: bool,
    ) -> impl Future<Output = Result<Link, ClientError>> + Send;
}
