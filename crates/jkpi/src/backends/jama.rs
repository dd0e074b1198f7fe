//! # 📡 THE JAMA BACKEND
//!
//! *Previously, on jkpi...*
//!
//! 🎬 COLD OPEN, INT. OPEN-PLAN OFFICE, 4:58 PM, FRIDAY
//!
//! "Can you pull the test-run numbers from Jama?" someone asked, putting on their coat.
//! Jama, for its part, was ready. It had a filter. It had OAuth. It had pagination capped
//! at fifty results, because generosity is a vice. And it had user ids instead of names,
//! because of course it did.
//!
//! 🚀 This module is the HTTP muscle behind both the record source and the directory
//! service. One `reqwest::Client`, one bearer token fetched up front, then:
//!
//! - `GET /rest/v1/filters/{id}/results?startAt=N&maxResults=M` until `pageInfo` says
//!   we've seen `totalResults` (or a page comes back empty, whichever sulks first)
//! - `GET /rest/v1/users/{id}` once per distinct user, thanks to the directory builder
//!
//! 🔒 Auth is tri-modal: OAuth client credentials (preferred), basic auth, or "I hope
//! anonymous works" (it won't, but you'll get a very clear 401 about it). Client id and
//! secret fall back to `JAMA_CLIENT_ID` / `JAMA_CLIENT_SECRET`, like the old script did.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::backends::{DirectoryService, RecordSource, UserProfile};
use crate::common::{RawRecord, UserId};

// 📡 JamaSourceConfig: "It's just a REST API", someone said, before the token expired.
#[derive(Debug, Deserialize, Clone)]
pub struct JamaSourceConfig {
    /// 📡 Base URL of the Jama instance, scheme included. `https://acme.jamacloud.com`.
    pub url: String,
    /// 🔒 OAuth client id. Falls back to `JAMA_CLIENT_ID`.
    #[serde(default)]
    pub client_id: Option<String>,
    /// 🔒 OAuth client secret. Falls back to `JAMA_CLIENT_SECRET`.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// 🔒 Basic auth, for instances where OAuth is a rumor.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 📦 Results per page. Jama caps this at 50 and ignores your ambition.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_page_size() -> u32 {
    50
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// 🔑 How each request proves who we are.
#[derive(Clone)]
enum JamaAuth {
    Bearer(String),
    Basic { username: String, password: Option<String> },
    Anonymous,
}

// -- 🎭 manual Debug so tokens and passwords never end up in a log line
impl std::fmt::Debug for JamaAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// 🧾 OAuth client credentials, from config first and the environment second.
fn client_credentials<F>(config: &JamaSourceConfig, env: F) -> Option<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let client_id = non_blank(config.client_id.clone()).or_else(|| non_blank(env("JAMA_CLIENT_ID")))?;
    let client_secret =
        non_blank(config.client_secret.clone()).or_else(|| non_blank(env("JAMA_CLIENT_SECRET")))?;
    Some((client_id, client_secret))
}

/// 🧭 `base` + path segments. Each segment is percent-encoded on its own, so an id like
/// `a/b?c` stays one segment instead of wandering off into another endpoint.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("💀 '{}' is not a URL Jama could live at", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("💀 '{}' cannot carry a path. A Jama instance needs http(s)://", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 📦 The Jama client: record source and directory service in one trench coat.
///
/// Clone is cheap: `reqwest::Client` is an `Arc` inside, the token is a short string.
#[derive(Debug, Clone)]
pub struct JamaClient {
    client: reqwest::Client,
    config: JamaSourceConfig,
    auth: JamaAuth,
}

impl JamaClient {
    /// 🚀 Build the HTTP client and authenticate.
    ///
    /// With client credentials this fires the OAuth token request right away, so a bad
    /// secret fails the run before a single record is fetched.
    pub async fn new(config: JamaSourceConfig) -> Result<Self> {
        Self::with_env(config, |key| std::env::var(key).ok()).await
    }

    pub(crate) async fn with_env<F>(config: JamaSourceConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. The architect shrugged.")?;

        let auth = if let Some((client_id, client_secret)) = client_credentials(&config, env) {
            let token = Self::fetch_token(&client, &config, &client_id, &client_secret).await?;
            JamaAuth::Bearer(token)
        } else if let Some(username) = config.username.clone() {
            JamaAuth::Basic {
                username,
                password: config.password.clone(),
            }
        } else {
            warn!("⚠️ no Jama credentials configured, going in anonymous. Expect a 401 and some character growth.");
            JamaAuth::Anonymous
        };
        info!("📡 Jama client ready for {} ({:?})", config.url, auth);

        Ok(Self { client, config, auth })
    }

    async fn fetch_token(
        client: &reqwest::Client,
        config: &JamaSourceConfig,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String> {
        let token_url = endpoint(&config.url, &["rest", "oauth", "token"])?;
        let response = client
            .post(token_url)
            .basic_auth(client_id, Some(client_secret))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .context("💀 The OAuth token request never made it to Jama. Check the URL, the VPN, and your feelings.")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("💀 The token response started arriving and then stopped. Half a token is no token.")?;
        if !status.is_success() {
            bail!(
                "💀 Jama turned down our OAuth handshake with '{}'. The body read: '{}'. \
                 Double-check the client id and secret.",
                status,
                body
            );
        }
        let token: TokenResponse = serde_json::from_str(&body)
            .context("💀 Jama answered the token request, but not with anything shaped like a token.")?;
        debug!("🔑 OAuth token acquired");
        Ok(token.access_token)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            JamaAuth::Bearer(token) => request.bearer_auth(token),
            JamaAuth::Basic { username, password } => request.basic_auth(username, password.as_ref()),
            JamaAuth::Anonymous => request,
        }
    }

    /// 📡 GET + status check + JSON parse. Non-2xx is an error with the body attached.
    async fn get_json(&self, url: Url) -> Result<Value> {
        trace!("📡 GET {}", url);
        let response = self
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("💀 GET {} never made it to Jama. The network is giving us the silent treatment.", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("💀 GET {} came back '{}' but the body was cut off mid-sentence", url, status))?;
        if !status.is_success() {
            bail!("💀 GET {} came back '{}'. The body read: '{}'.", url, status, body);
        }
        serde_json::from_str(&body).with_context(|| format!("💀 GET {} returned something that is not JSON", url))
    }
}

#[async_trait]
impl RecordSource for JamaClient {
    /// 📄 Every result of a saved filter, page by page.
    async fn fetch(&mut self, filter_id: u64) -> Result<Vec<RawRecord>> {
        let page_size = self.config.page_size.max(1);
        let mut records = Vec::new();
        let mut start_at: u64 = 0;

        loop {
            let filter_segment = filter_id.to_string();
            let mut url = endpoint(
                &self.config.url,
                &["rest", "v1", "filters", filter_segment.as_str(), "results"],
            )?;
            url.query_pairs_mut()
                .append_pair("startAt", &start_at.to_string())
                .append_pair("maxResults", &page_size.to_string());
            let mut page = self
                .get_json(url)
                .await
                .with_context(|| format!("💀 Could not fetch results of filter {}", filter_id))?;

            let data = match page.get_mut("data").map(Value::take) {
                Some(Value::Array(data)) => data,
                _ => bail!("💀 Filter {} page at {} has no 'data' array. Jama changed the script.", filter_id, start_at),
            };
            let page_len = data.len() as u64;
            records.extend(data);

            let total_results = page
                .pointer("/meta/pageInfo/totalResults")
                .and_then(Value::as_u64);
            trace!(
                "📄 filter {} page at {} → {} results (total: {:?})",
                filter_id, start_at, page_len, total_results
            );

            start_at += page_len;
            match total_results {
                Some(total) if page_len > 0 && start_at < total => continue,
                _ => break,
            }
        }

        info!("📥 filter {} fetched: {} records", filter_id, records.len());
        Ok(records)
    }
}

#[async_trait]
impl DirectoryService for JamaClient {
    async fn lookup(&mut self, user_id: &UserId) -> Result<UserProfile> {
        let url = endpoint(&self.config.url, &["rest", "v1", "users", user_id.as_str()])?;
        let mut body = self.get_json(url).await?;
        match body.get_mut("data").map(Value::take) {
            Some(profile @ Value::Object(_)) => Ok(profile),
            _ => bail!("💀 user {} came back without a 'data' object", user_id),
        }
    }
}
