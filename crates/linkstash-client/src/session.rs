//! The signed-in user's view of their links.
//!
//! Every mutation is applied to the local collection first and rendered, then
//! confirmed with the server. A failed confirmation applies the inverse
//! mutation. Any 401/403 drops the session back to `SignedOut`.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use linkstash_types::api::{AddLinkRequest, AuthResponse, UserSummary};
use linkstash_types::{Link, NewLink};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::LinkApi;
use crate::error::ClientError;
use crate::filter::{Tab, apply_tab_filter};
use crate::optimistic::Optimistic;

/// How long a fetched collection is served from cache by `reload`.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30);

/// Prefix of ids given to links the server has not confirmed yet.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// What the render hook is shown after every local change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub user: Option<UserSummary>,
    pub tab: Tab,
    /// Links under the current tab, newest first.
    pub links: Vec<Link>,
    /// Ids of links still waiting on the server.
    pub pending: Vec<String>,
}

pub type RenderHook = Box<dyn FnMut(&View) + Send>;

#[derive(Debug)]
pub struct SignedIn {
    pub token: String,
    pub user: UserSummary,
    pub links: Vec<Link>,
    pub pending: HashSet<String>,
    pub fetched_at: Option<Instant>,
}

impl SignedIn {
    fn new(token: String, user: UserSummary) -> Self {
        Self {
            token,
            user,
            links: Vec::new(),
            pending: HashSet::new(),
            fetched_at: None,
        }
    }
}

#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(SignedIn),
}

pub struct Session<A> {
    api: A,
    state: SessionState,
    tab: Tab,
    freshness: Duration,
    render: Option<RenderHook>,
}

impl<A: LinkApi> Session<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: SessionState::SignedOut,
            tab: Tab::default(),
            freshness: DEFAULT_FRESHNESS,
            render: None,
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn on_render<F>(&mut self, hook: F)
    where
        F: FnMut(&View) + Send + 'static,
    {
        self.render = Some(Box::new(hook));
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn(_))
    }

    pub fn current_user(&self) -> Option<&UserSummary> {
        match &self.state {
            SessionState::SignedIn(s) => Some(&s.user),
            SessionState::SignedOut => None,
        }
    }

    /// The bearer token, for the caller to persist and later `restore`.
    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::SignedIn(s) => Some(&s.token),
            SessionState::SignedOut => None,
        }
    }

    /// The whole cached collection, in local order.
    pub fn links(&self) -> &[Link] {
        match &self.state {
            SessionState::SignedIn(s) => &s.links,
            SessionState::SignedOut => &[],
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        match &self.state {
            SessionState::SignedIn(s) => s.pending.contains(id),
            SessionState::SignedOut => false,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.render();
    }

    /// Links under the current tab, newest first.
    pub fn visible(&self) -> Vec<Link> {
        apply_tab_filter(self.links(), self.tab)
    }

    pub fn view(&self) -> View {
        let mut pending: Vec<String> = match &self.state {
            SessionState::SignedIn(s) => s.pending.iter().cloned().collect(),
            SessionState::SignedOut => Vec::new(),
        };
        pending.sort();
        View {
            user: self.current_user().cloned(),
            tab: self.tab,
            links: self.visible(),
            pending,
        }
    }

    // -- Sign-in flows --

    /// Log in. An unknown username comes back as `UserNotFound` so the caller
    /// can offer registration instead.
    pub async fn sign_in(&mut self, username: &str, password: &str) -> Result<UserSummary, ClientError> {
        let auth = self
            .api
            .login(username, password)
            .await
            .map_err(not_found_as_unknown_user)?;
        Ok(self.establish(auth))
    }

    pub async fn register(&mut self, username: &str, password: &str) -> Result<UserSummary, ClientError> {
        let auth = self.api.register(username, password).await?;
        Ok(self.establish(auth))
    }

    pub async fn reset_password(
        &mut self,
        username: &str,
        new_password: &str,
    ) -> Result<UserSummary, ClientError> {
        let auth = self
            .api
            .reset_password(username, new_password)
            .await
            .map_err(not_found_as_unknown_user)?;
        Ok(self.establish(auth))
    }

    pub async fn check_username(&self, username: &str) -> Result<bool, ClientError> {
        self.api.check_username(username).await
    }

    /// Resume from a previously issued token.
    pub async fn restore(&mut self, token: String) -> Result<UserSummary, ClientError> {
        match self.api.verify(&token).await {
            Ok(user) => {
                debug!("Restored session for {}", user.username);
                self.state = SessionState::SignedIn(SignedIn::new(token, user.clone()));
                self.render();
                Ok(user)
            }
            Err(e) => self.finish(Err(e)),
        }
    }

    /// Local state is always cleared, even if the server can't be told.
    pub async fn sign_out(&mut self) {
        if let SessionState::SignedIn(s) = std::mem::take(&mut self.state) {
            if let Err(e) = self.api.logout(&s.token).await {
                warn!("Logout request for {} failed: {}", s.user.username, e);
            }
            info!("{} signed out", s.user.username);
        }
        self.tab = Tab::default();
        self.render();
    }

    fn establish(&mut self, auth: AuthResponse) -> UserSummary {
        info!("Signed in as {}", auth.user.username);
        self.state = SessionState::SignedIn(SignedIn::new(auth.token, auth.user.clone()));
        self.tab = Tab::default();
        self.render();
        auth.user
    }

    // -- Collection --

    /// Serve the cached collection if it is still fresh, otherwise refetch.
    pub async fn reload(&mut self) -> Result<Vec<Link>, ClientError> {
        let s = self.signed_in()?;
        if let Some(at) = s.fetched_at {
            if at.elapsed() < self.freshness {
                debug!("Serving {} cached links", s.links.len());
                return Ok(self.visible());
            }
        }
        self.reload_forced().await
    }

    pub async fn reload_forced(&mut self) -> Result<Vec<Link>, ClientError> {
        let token = self.signed_in()?.token.clone();
        let fetched = self.api.list_links(&token).await;
        let links = self.finish(fetched)?;

        let s = self.signed_in_mut()?;
        s.links = links;
        s.fetched_at = Some(Instant::now());
        self.render();
        Ok(self.visible())
    }

    // -- Optimistic mutations --

    /// Show the link at the head of the collection under a temporary id,
    /// then swap in the server's record, or drop it if the server refuses.
    pub async fn add_link(
        &mut self,
        url: &str,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<Link, ClientError> {
        let token = self.signed_in()?.token.clone();
        let new = NewLink::parse(url, title, category)?;
        let request = AddLinkRequest {
            url: new.url.clone(),
            title: title.map(str::to_string),
            category: category.map(str::to_string),
        };

        let temp_id = format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4());
        let op = Optimistic::add(Link::from_new(temp_id.clone(), new, Utc::now()));
        {
            let s = self.signed_in_mut()?;
            op.apply(&mut s.links);
            s.pending.insert(temp_id.clone());
        }
        self.render();

        let result = self.api.add_link(&token, &request).await;

        if let SessionState::SignedIn(s) = &mut self.state {
            s.pending.remove(&temp_id);
            match &result {
                Ok(link) => {
                    if let Some(slot) = s.links.iter_mut().find(|l| l.id == temp_id) {
                        *slot = link.clone();
                    }
                }
                Err(e) => {
                    debug!("Rolling back add of {}: {}", request.url, e);
                    op.revert(&mut s.links);
                }
            }
        }
        self.finish(result)
    }

    /// Remove locally, then on the server. A failure puts the link back at
    /// its old position.
    pub async fn delete_link(&mut self, id: &str) -> Result<(), ClientError> {
        let token = self.signed_in()?.token.clone();
        let op = {
            let s = self.signed_in_mut()?;
            let op = Optimistic::delete(&s.links, id)
                .ok_or_else(|| ClientError::UnknownLink(id.to_string()))?;
            op.apply(&mut s.links);
            op
        };
        self.render();

        let result = self.api.delete_link(&token, id).await;
        if let Err(e) = &result {
            debug!("Rolling back delete of {}: {}", id, e);
            if let SessionState::SignedIn(s) = &mut self.state {
                op.revert(&mut s.links);
            }
        }
        self.finish(result)
    }

    pub async fn toggle_read(&mut self, id: &str) -> Result<Link, ClientError> {
        let token = self.signed_in()?.token.clone();
        let (op, is_read) = {
            let s = self.signed_in_mut()?;
            let op = Optimistic::toggle_read(&s.links, id)
                .ok_or_else(|| ClientError::UnknownLink(id.to_string()))?;
            op.apply(&mut s.links);
            (op, s.links.iter().any(|l| l.id == id && l.is_read))
        };
        self.render();

        let result = self.api.mark_read(&token, id, is_read).await;
        self.confirm(&op, &result);
        self.finish(result)
    }

    pub async fn toggle_favorite(&mut self, id: &str) -> Result<Link, ClientError> {
        let token = self.signed_in()?.token.clone();
        let (op, is_favorite) = {
            let s = self.signed_in_mut()?;
            let op = Optimistic::toggle_favorite(&s.links, id)
                .ok_or_else(|| ClientError::UnknownLink(id.to_string()))?;
            op.apply(&mut s.links);
            (op, s.links.iter().any(|l| l.id == id && l.is_favorite))
        };
        self.render();

        let result = self.api.toggle_favorite(&token, id, is_favorite).await;
        self.confirm(&op, &result);
        self.finish(result)
    }

    /// Adopt the server's copy of an updated link, or undo the local edit.
    fn confirm(&mut self, op: &Optimistic, result: &Result<Link, ClientError>) {
        let SessionState::SignedIn(s) = &mut self.state else {
            return;
        };
        match result {
            Ok(link) => {
                if let Some(slot) = s.links.iter_mut().find(|l| l.id == link.id) {
                    *slot = link.clone();
                }
            }
            Err(e) => {
                debug!("Rolling back {:?}: {}", op.forward, e);
                op.revert(&mut s.links);
            }
        }
    }

    /// Common tail of every server round trip: drop the session on an auth
    /// failure, then render.
    fn finish<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            if e.is_auth_failure() && self.is_signed_in() {
                warn!("Server rejected the session: {}", e);
                self.state = SessionState::SignedOut;
            }
        }
        self.render();
        result
    }

    fn signed_in(&self) -> Result<&SignedIn, ClientError> {
        match &self.state {
            SessionState::SignedIn(s) => Ok(s),
            SessionState::SignedOut => Err(ClientError::NotSignedIn),
        }
    }

    fn signed_in_mut(&mut self) -> Result<&mut SignedIn, ClientError> {
        match &mut self.state {
            SessionState::SignedIn(s) => Ok(s),
            SessionState::SignedOut => Err(ClientError::NotSignedIn),
        }
    }

    fn render(&mut self) {
        if self.render.is_none() {
            return;
        }
        let view = self.view();
        if let Some(hook) = self.render.as_mut() {
            hook(&view);
        }
    }
}

fn not_found_as_unknown_user(e: ClientError) -> ClientError {
    match e {
        ClientError::NotFound(_) => ClientError::UserNotFound,
        other => other,
    }
}
