//! MediaWiki action API backend.
//!
//! Reads go through `action=query` with `formatversion=2`; writes log in with
//! the bot account on first use and reuse the CSRF token until the wiki
//! rejects it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Revision, WikiConfig};
use crate::storage::{WikiStore, missing};
use crate::utils::http::create_async_client;

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(rename = "continue", default)]
    continuation: Option<BTreeMap<String, String>>,
    #[serde(default)]
    login: Option<LoginResult>,
    #[serde(default)]
    edit: Option<EditResult>,
}

#[derive(Debug, Default, Deserialize)]
struct Query {
    #[serde(default)]
    pages: Vec<ApiPage>,
    #[serde(default)]
    tokens: Option<Tokens>,
    #[serde(default)]
    categorymembers: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Default, Deserialize)]
struct Tokens {
    #[serde(default)]
    logintoken: Option<String>,
    #[serde(default)]
    csrftoken: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditResult {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    redirect: bool,
    #[serde(default)]
    revisions: Vec<ApiRevision>,
}

#[derive(Debug, Deserialize)]
struct ApiRevision {
    #[serde(default)]
    revid: u64,
    #[serde(default)]
    user: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    slots: Option<Slots>,
}

impl ApiRevision {
    fn into_revision(self) -> Option<Revision> {
        Some(Revision {
            revid: self.revid,
            user: self.user,
            timestamp: self.timestamp?,
            comment: self.comment,
            tags: self.tags,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Member {
    title: String,
}

/// Client for a live MediaWiki site.
pub struct MediaWikiClient {
    http: reqwest::Client,
    api_url: Url,
    base_url: Url,
    user: String,
    password: Option<String>,
    csrf_token: Mutex<Option<String>>,
}

impl MediaWikiClient {
    pub fn new(config: &WikiConfig) -> Result<Self> {
        Ok(Self {
            http: create_async_client(config)?,
            api_url: Url::parse(&config.api_url)?,
            base_url: Url::parse(&config.base_url)?,
            user: config.user.clone(),
            password: config.password(),
            csrf_token: Mutex::new(None),
        })
    }

    async fn get(&self, context: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let response = self
            .http
            .get(self.api_url.clone())
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Self::check(context, response.json().await?)
    }

    async fn post(&self, context: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let mut form: Vec<(&str, &str)> = vec![("format", "json"), ("formatversion", "2")];
        form.extend_from_slice(params);
        let response = self
            .http
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Self::check(context, response.json().await?)
    }

    fn check(context: &str, response: ApiResponse) -> Result<ApiResponse> {
        match &response.error {
            Some(error) => Err(AppError::wiki(
                context,
                format!("{}: {}", error.code, error.info),
            )),
            None => Ok(response),
        }
    }

    async fn token(&self, kind: &str) -> Result<String> {
        let response = self
            .get("tokens", &[("action", "query"), ("meta", "tokens"), ("type", kind)])
            .await?;
        let tokens = response.query.and_then(|q| q.tokens).unwrap_or_default();
        let token = match kind {
            "login" => tokens.logintoken,
            _ => tokens.csrftoken,
        };
        token.ok_or_else(|| AppError::wiki("tokens", format!("no {kind} token returned")))
    }

    async fn login(&self) -> Result<()> {
        let password = self.password.as_deref().ok_or_else(|| {
            AppError::config(format!("No password available for wiki user {}", self.user))
        })?;
        let login_token = self.token("login").await?;
        let response = self
            .post(
                "login",
                &[
                    ("action", "login"),
                    ("lgname", &self.user),
                    ("lgpassword", password),
                    ("lgtoken", &login_token),
                ],
            )
            .await?;
        match response.login {
            Some(login) if login.result == "Success" => {
                log::info!("Logged in to {} as {}", self.api_url, self.user);
                Ok(())
            }
            Some(login) => Err(AppError::wiki(
                "login",
                login.reason.unwrap_or(login.result),
            )),
            None => Err(AppError::wiki("login", "missing login result")),
        }
    }

    async fn csrf_token(&self) -> Result<String> {
        let mut cached = self.csrf_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        self.login().await?;
        let token = self.token("csrf").await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn edit(&self, title: &str, text: &str, summary: &str, token: &str) -> Result<ApiResponse> {
        self.post(
            title,
            &[
                ("action", "edit"),
                ("title", title),
                ("text", text),
                ("summary", summary),
                ("bot", "1"),
                ("token", token),
            ],
        )
        .await
    }

    async fn page_info(&self, title: &str) -> Result<Option<ApiPage>> {
        let response = self
            .get(title, &[("action", "query"), ("prop", "info"), ("titles", title)])
            .await?;
        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing && !p.invalid))
    }
}

#[async_trait]
impl WikiStore for MediaWikiClient {
    async fn exists(&self, title: &str) -> Result<bool> {
        Ok(self.page_info(title).await?.is_some())
    }

    async fn is_redirect(&self, title: &str) -> Result<bool> {
        Ok(self.page_info(title).await?.is_some_and(|p| p.redirect))
    }

    async fn get_text(&self, title: &str) -> Result<String> {
        let response = self
            .get(
                title,
                &[
                    ("action", "query"),
                    ("prop", "revisions"),
                    ("rvprop", "content"),
                    ("rvslots", "main"),
                    ("titles", title),
                ],
            )
            .await?;
        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing && !p.invalid)
            .ok_or_else(|| missing(title))?;
        page.revisions
            .into_iter()
            .next()
            .and_then(|r| r.slots)
            .map(|s| s.main.content)
            .ok_or_else(|| AppError::wiki(page.title, "no content in latest revision"))
    }

    async fn put_text(&self, title: &str, text: &str, summary: &str) -> Result<()> {
        let token = self.csrf_token().await?;
        let response = match self.edit(title, text, summary, &token).await {
            Err(AppError::Wiki { message, .. }) if message.starts_with("badtoken") => {
                log::warn!("CSRF token rejected, logging in again");
                *self.csrf_token.lock().await = None;
                let token = self.csrf_token().await?;
                self.edit(title, text, summary, &token).await?
            }
            other => other?,
        };
        match response.edit {
            Some(edit) if edit.result == "Success" => {
                log::debug!("Saved {title}: {summary}");
                Ok(())
            }
            Some(edit) => Err(AppError::wiki(title, format!("edit result {}", edit.result))),
            None => Err(AppError::wiki(title, "missing edit result")),
        }
    }

    async fn revisions(&self, title: &str) -> Result<Vec<Revision>> {
        let mut revisions = Vec::new();
        let mut continuation: BTreeMap<String, String> = BTreeMap::new();
        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "ids|timestamp|user|comment|tags"),
                ("rvlimit", "max"),
                ("titles", title),
            ];
            params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));

            let response = self.get(title, &params).await?;
            if let Some(page) = response.query.and_then(|q| q.pages.into_iter().next()) {
                revisions.extend(page.revisions.into_iter().filter_map(ApiRevision::into_revision));
            }
            match response.continuation {
                Some(next) => continuation = next,
                None => break,
            }
        }
        Ok(revisions)
    }

    async fn first_revision(&self, title: &str) -> Result<Option<Revision>> {
        let response = self
            .get(
                title,
                &[
                    ("action", "query"),
                    ("prop", "revisions"),
                    ("rvprop", "ids|timestamp|user|comment|tags"),
                    ("rvlimit", "1"),
                    ("rvdir", "newer"),
                    ("titles", title),
                ],
            )
            .await?;
        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .and_then(|p| p.revisions.into_iter().next())
            .and_then(ApiRevision::into_revision))
    }

    async fn category_members(&self, category: &str) -> Result<Vec<String>> {
        let mut members = Vec::new();
        let mut continuation: BTreeMap<String, String> = BTreeMap::new();
        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("action", "query"),
                ("list", "categorymembers"),
                ("cmtitle", category),
                ("cmlimit", "max"),
            ];
            params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));

            let response = self.get(category, &params).await?;
            if let Some(query) = response.query {
                members.extend(query.categorymembers.into_iter().map(|m| m.title));
            }
            match response.continuation {
                Some(next) => continuation = next,
                None => break,
            }
        }
        Ok(members)
    }

    fn page_url(&self, title: &str) -> String {
        // Url::join would read a namespace prefix as a scheme
        format!("{}{}", self.base_url, title.replace(' ', "_"))
    }
}
