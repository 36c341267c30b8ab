use crate::models::AuthSession;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SIGN_UP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum AuthError {
    #[error("network error: {0}")]
    Network(String),
    #[error("sign-in rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid sign-in response: {0}")]
    Parse(String),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignUpRequest {
    pub return_secure_token: bool,
}

/// Lifetime assumed when the server omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// `accounts:signUp` without credentials creates an anonymous user.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignUpResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub local_id: String,
    /// Seconds, sent as a string.
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// The token endpoint answers in snake_case.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}

fn expires_at(issued_at_ms: i64, expires_in: Option<&str>) -> i64 {
    let secs = expires_in
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    issued_at_ms + secs * 1000
}

impl SignUpResponse {
    pub fn into_session(self, issued_at_ms: i64) -> AuthSession {
        AuthSession {
            expires_at_ms: expires_at(issued_at_ms, self.expires_in.as_deref()),
            uid: self.local_id,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

impl RefreshResponse {
    pub fn into_session(self, issued_at_ms: i64) -> AuthSession {
        AuthSession {
            expires_at_ms: expires_at(issued_at_ms, self.expires_in.as_deref()),
            uid: self.user_id,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AuthClient {
    api_key: String,
}

impl AuthClient {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }

    fn endpoint(&self, base: &str) -> String {
        format!("{}?key={}", base, urlencoding::encode(&self.api_key))
    }

    async fn post<T: serde::de::DeserializeOwned>(
        req: reqwest::RequestBuilder,
    ) -> Result<T, AuthError> {
        let res = req
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if res.status().is_success() {
            res.json().await.map_err(|e| AuthError::Parse(e.to_string()))
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(AuthError::Rejected { status, body })
        }
    }

    pub async fn sign_in_anonymously(&self) -> Result<AuthSession, AuthError> {
        let req = reqwest::Client::new()
            .post(self.endpoint(SIGN_UP_URL))
            .json(&SignUpRequest {
                return_secure_token: true,
            });
        let res: SignUpResponse = Self::post(req).await?;
        Ok(res.into_session(now_ms()))
    }

    /// Exchanges a stored refresh token for a fresh id token. The uid is unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let req = reqwest::Client::new()
            .post(self.endpoint(REFRESH_URL))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(refresh_form(refresh_token));
        let res: RefreshResponse = Self::post(req).await?;
        Ok(res.into_session(now_ms()))
    }

    /// Resumes a persisted session when possible, otherwise signs in as a new anonymous user.
    pub async fn restore_or_sign_in(
        &self,
        stored: Option<AuthSession>,
    ) -> Result<AuthSession, AuthError> {
        if let Some(stored) = stored {
            match self.refresh(&stored.refresh_token).await {
                Ok(session) => return Ok(session),
                Err(e) => log::warn!("could not resume session for {}: {e}", stored.uid),
            }
        }
        self.sign_in_anonymously().await
    }
}

fn refresh_form(refresh_token: &str) -> String {
    format!(
        "grant_type=refresh_token&refresh_token={}",
        urlencoding::encode(refresh_token)
    )
}
