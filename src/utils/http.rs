// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::WikiConfig;

/// Create a configured asynchronous HTTP client.
///
/// The cookie store carries the wiki session between the login and edit calls.
pub fn create_async_client(config: &WikiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .cookie_store(true)
        .gzip(true)
        .build()?;
    Ok(client)
}
