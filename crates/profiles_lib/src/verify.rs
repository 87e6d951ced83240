//! The identity verification gateway.
//!
//! The gateway is an external collaborator: it knows the external identity hash of a user,
//! and it can tell which hash among a set of candidates belongs to that identity.
//!
//! Its calls are network-bound, so they must never happen while a transaction is open.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ProfilesResult;

/// A provider of external identity verification.
pub trait UserVerifyProvider: Send + Sync {
    /// Returns the external identity hash of the user with the provided ID.
    fn get_hash(&self, user_id: i32) -> impl Future<Output = ProfilesResult<Option<String>>> + Send;

    /// Returns the hash among the `candidates` that corresponds to the `expected` identity hash,
    /// if any.
    fn validate_user(
        &self,
        candidates: &[String],
        expected: Option<&str>,
    ) -> impl Future<Output = ProfilesResult<Option<String>>> + Send;
}

/// The provider used when no verification provider is configured.
///
/// It doesn't know any identity, so no account can ever be verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotVerified;

impl UserVerifyProvider for NotVerified {
    async fn get_hash(&self, _: i32) -> ProfilesResult<Option<String>> {
        Ok(None)
    }

    async fn validate_user(&self, _: &[String], _: Option<&str>) -> ProfilesResult<Option<String>> {
        Ok(None)
    }
}

#[derive(Deserialize)]
struct HashResponse {
    hash: Option<String>,
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    candidates: &'a [String],
    expected: Option<&'a str>,
}

#[derive(Deserialize)]
struct ValidateResponse {
    matched: Option<String>,
}

/// A verification provider reached through HTTP.
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVerifier {
    /// Creates a provider sending its requests to the provided base URL.
    pub fn new(base_url: String, timeout: Duration) -> ProfilesResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl UserVerifyProvider for HttpVerifier {
    async fn get_hash(&self, user_id: i32) -> ProfilesResult<Option<String>> {
        let res: HashResponse = self
            .client
            .get(format!("{}/users/{user_id}/hash", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(res.hash)
    }

    async fn validate_user(
        &self,
        candidates: &[String],
        expected: Option<&str>,
    ) -> ProfilesResult<Option<String>> {
        let res: ValidateResponse = self
            .client
            .post(format!("{}/validate", self.base_url))
            .json(&ValidateBody {
                candidates,
                expected,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(res.matched)
    }
}

/// The verification provider chosen at startup.
#[derive(Debug, Clone)]
pub enum Verifier {
    /// No provider is configured.
    NotVerified(NotVerified),
    /// The provider is reached through HTTP.
    Http(HttpVerifier),
}

impl Verifier {
    /// Returns the HTTP provider if the URL isn't empty, or the no-op provider otherwise.
    pub fn from_url(url: String, timeout: Duration) -> ProfilesResult<Self> {
        if url.is_empty() {
            tracing::warn!("No verification provider configured, accounts can't be linked");
            Ok(Self::NotVerified(NotVerified))
        } else {
            HttpVerifier::new(url, timeout).map(Self::Http)
        }
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::NotVerified(NotVerified)
    }
}

impl UserVerifyProvider for Verifier {
    async fn get_hash(&self, user_id: i32) -> ProfilesResult<Option<String>> {
        match self {
            Self::NotVerified(v) => v.get_hash(user_id).await,
            Self::Http(v) => v.get_hash(user_id).await,
        }
    }

    async fn validate_user(
        &self,
        candidates: &[String],
        expected: Option<&str>,
    ) -> ProfilesResult<Option<String>> {
        match self {
            Self::NotVerified(v) => v.validate_user(candidates, expected).await,
            Self::Http(v) => v.validate_user(candidates, expected).await,
        }
    }
}
