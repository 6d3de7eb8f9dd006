//! Repository-hosting API calls used by `fetch`, `fork` and `create`.

use crate::error::HubError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub private: bool,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

pub trait HostingApi {
    fn repo_exists(&self, user: &str, repo: &str) -> Result<bool, HubError>;
    fn fork_repo(&self, owner: &str, repo: &str) -> Result<(), HubError>;
    fn create_repo(&self, name: &str, opts: &CreateOptions) -> Result<(), HubError>;
}

/// Used when the crate is built without network support: nothing exists
/// and nothing can be created.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineApi;

impl HostingApi for OfflineApi {
    fn repo_exists(&self, _user: &str, _repo: &str) -> Result<bool, HubError> { Ok(false) }
    fn fork_repo(&self, _owner: &str, _repo: &str) -> Result<(), HubError> {
        Err(HubError::ApiError("hub was built without API support".into()))
    }
    fn create_repo(&self, _name: &str, _opts: &CreateOptions) -> Result<(), HubError> {
        Err(HubError::ApiError("hub was built without API support".into()))
    }
}

#[cfg(feature = "api")]
pub use github::GitHubApi;

#[cfg(feature = "api")]
mod github {
    use std::cell::OnceCell;

    use reqwest::blocking::{Client, RequestBuilder, Response};
    use serde::Deserialize;
    use serde_json::json;
    use tracing::debug;

    use super::{CreateOptions, HostingApi};
    use crate::config::{DEFAULT_HOST, VERSION};
    use crate::context::Context;
    use crate::error::HubError;

    #[derive(Deserialize)]
    struct ApiMessage {
        message: Option<String>,
    }

    /// GitHub v3 REST client. The HTTP client is built on first use so
    /// invocations that never touch the API pay nothing for it.
    pub struct GitHubApi<'a> {
        base: String,
        repo: &'a dyn Context,
        client: OnceCell<Client>,
    }

    impl<'a> GitHubApi<'a> {
        pub fn new(host: &str, repo: &'a dyn Context) -> Self {
            GitHubApi { base: api_base(host), repo, client: OnceCell::new() }
        }

        fn client(&self) -> Result<&Client, HubError> {
            if let Some(c) = self.client.get() {
                return Ok(c);
            }
            let c = Client::builder()
                .user_agent(format!("hub/{VERSION}"))
                .build()
                .map_err(|e| HubError::ApiError(e.to_string()))?;
            Ok(self.client.get_or_init(|| c))
        }

        fn authed(&self, req: RequestBuilder) -> RequestBuilder {
            match self.repo.github_token() {
                Some(token) => req.header("Authorization", format!("token {token}")),
                None => req,
            }
        }

        fn send(&self, req: RequestBuilder) -> Result<Response, HubError> {
            self.authed(req).send().map_err(|e| HubError::ApiError(e.to_string()))
        }
    }

    pub(super) fn api_base(host: &str) -> String {
        if host == DEFAULT_HOST {
            "https://api.github.com".to_string()
        } else {
            format!("https://{host}/api/v3")
        }
    }

    fn check(resp: Response) -> Result<(), HubError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = status.canonical_reason().unwrap_or("error").to_string();
        let message = resp
            .json::<ApiMessage>()
            .ok()
            .and_then(|m| m.message)
            .unwrap_or(reason);
        Err(HubError::ApiError(format!("{} (HTTP {})", message, status.as_u16())))
    }

    impl HostingApi for GitHubApi<'_> {
        fn repo_exists(&self, user: &str, repo: &str) -> Result<bool, HubError> {
            let url = format!("{}/repos/{user}/{repo}", self.base);
            let resp = self.send(self.client()?.get(&url))?;
            debug!(%url, status = resp.status().as_u16(), "repo lookup");
            Ok(resp.status().is_success())
        }

        fn fork_repo(&self, owner: &str, repo: &str) -> Result<(), HubError> {
            let url = format!("{}/repos/{owner}/{repo}/forks", self.base);
            debug!(%url, "forking");
            check(self.send(self.client()?.post(&url))?)
        }

        fn create_repo(&self, name: &str, opts: &CreateOptions) -> Result<(), HubError> {
            let url = format!("{}/user/repos", self.base);
            let mut body = json!({ "name": name, "private": opts.private });
            if let Some(d) = &opts.description {
                body["description"] = json!(d);
            }
            if let Some(h) = &opts.homepage {
                body["homepage"] = json!(h);
            }
            debug!(%url, "creating repository");
            check(self.send(self.client()?.post(&url).json(&body))?)
        }
    }

}
