use linkstash_types::Link;
use linkstash_types::api::{
    AddLinkRequest, AuthResponse, CheckUserResponse, ErrorResponse, LinkResponse, LinksResponse,
    LoginRequest, MarkReadRequest, RegisterRequest, ResetPasswordRequest, SuccessResponse,
    ToggleFavoriteRequest, UserSummary, VerifyResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::LinkApi;
use crate::error::ClientError;

/// `LinkApi` over HTTP. The token is sent as a bearer credential and never
/// inspected.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base).map_err(|e| ClientError::BaseUrl(format!("{}: {}", base, e)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::BaseUrl(base.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    debug!("Request failed ({}): {}", status, message);
    Err(ClientError::from_status(status.as_u16(), message))
}

impl LinkApi for HttpApi {
    async fn register(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let url = self.endpoint(&["api", "auth", "register"])?;
        send(self.client.post(url).json(&body)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let url = self.endpoint(&["api", "auth", "login"])?;
        send(self.client.post(url).json(&body)).await
    }

    async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = ResetPasswordRequest {
            username: username.to_string(),
            new_password: new_password.to_string(),
        };
        let url = self.endpoint(&["api", "auth", "reset-password"])?;
        send(self.client.post(url).json(&body)).await
    }

    async fn check_username(&self, username: &str) -> Result<bool, ClientError> {
        let url = self.endpoint(&["api", "auth", "check", username])?;
        let resp: CheckUserResponse = send(self.client.get(url)).await?;
        Ok(resp.exists)
    }

    async fn verify(&self, token: &str) -> Result<UserSummary, ClientError> {
        let url = self.endpoint(&["api", "auth", "verify"])?;
        let resp: VerifyResponse = send(self.client.get(url).bearer_auth(token)).await?;
        Ok(resp.user)
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "auth", "logout"])?;
        let _: SuccessResponse = send(self.client.post(url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn list_links(&self, token: &str) -> Result<Vec<Link>, ClientError> {
        let url = self.endpoint(&["api", "links"])?;
        let resp: LinksResponse = send(self.client.get(url).bearer_auth(token)).await?;
        Ok(resp.links)
    }

    async fn add_link(&self, token: &str, link: &AddLinkRequest) -> Result<Link, ClientError> {
        let url = self.endpoint(&["api", "links"])?;
        let resp: LinkResponse = send(self.client.post(url).bearer_auth(token).json(link)).await?;
        Ok(resp.link)
    }

    async fn delete_link(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let mut url = self.endpoint(&["api", "links"])?;
        url.query_pairs_mut().append_pair("id", id);
        let _: SuccessResponse = send(self.client.delete(url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn mark_read(&self, token: &str, id: &str, is_read: bool) -> Result<Link, ClientError> {
        let body = MarkReadRequest {
            link_id: id.to_string(),
            is_read,
        };
        let url = self.endpoint(&["api", "links", "mark-read"])?;
        let resp: LinkResponse = send(self.client.post(url).bearer_auth(token).json(&body)).await?;
        Ok(resp.link)
    }

    async fn toggle_favorite(
        &self,
        token: &str,
        id: &str,
        is_favorite: bool,
    ) -> Result<Link, ClientError> {
        let body = ToggleFavoriteRequest {
            link_id: id.to_string(),
            is_favorite,
        };
        let url = self.endpoint(&["api", "links", "toggle-favorite"])?;
        let resp: LinkResponse = send(self.client.post(url).bearer_auth(token).json(&body)).await?;
        Ok(resp.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_joined_under_the_base_path() {
        let api = HttpApi::new("https://links.example.com/stash/").unwrap();
        let url = api.endpoint(&["api", "auth", "check", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://links.example.com/stash/api/auth/check/a%20b");

        let api = HttpApi::new("http://localhost:3000").unwrap();
        let url = api.endpoint(&["api", "links"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/links");
    }

    #[test]
    fn rejects_non_http_bases() {
        assert!(matches!(HttpApi::new("mailto:me@example.com"), Err(ClientError::BaseUrl(_))));
        assert!(matches!(HttpApi::new("not a url"), Err(ClientError::BaseUrl(_))));
    }
}
