//! Authentication session.
//!
//! The identity provider hands out a JWT-style ID token. A [`Session`] holds
//! that token, its decoded claims and the profile fetched from `/me`. It is
//! an ordinary value passed to whoever needs it; [`SessionStore`] persists it
//! between CLI invocations.
//!
//! # Lifecycle
//!
//! 1. **Login** - `Session::from_token` decodes the token, `SessionStore::save`
//! 2. **Load** - `SessionStore::load` restores it, rejecting expired tokens
//! 3. **Refresh** - `Session::refresh` re-fetches and caches the profile
//! 4. **Clear** - `SessionStore::clear` removes it (logout)
//!
//! # Storage Layout
//!
//! ```text
//! ~/.local/share/lookbook/
//! └── session.json    # { "token": "...", "profile": { "kind": "creator", ... } }
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::{ApiError, ProfileApi};
use crate::models::Profile;

const SESSION_FILE: &str = "session.json";

/// Errors that can occur while loading, saving or refreshing a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file '{}': {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse session file '{}': {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Malformed ID token: {0}")]
    MalformedToken(String),

    #[error("Session expired. Run `lookbook auth login` again.")]
    Expired,

    #[error("Not logged in. Run `lookbook auth login` first.")]
    NotLoggedIn,

    #[error("Cannot determine the acting user; refresh the session profile")]
    UnknownActor,

    #[error("Failed to refresh profile: {0}")]
    Api(#[from] ApiError),
}

/// Claims read from the ID token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decodes the payload segment of a `header.payload.signature` token.
    /// The signature is not verified; the backend does that.
    pub fn decode(token: &str) -> Result<Self, SessionError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => {
                return Err(SessionError::MalformedToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| SessionError::MalformedToken(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(e.to_string()))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    claims: TokenClaims,
    profile: Option<Profile>,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();
        let claims = TokenClaims::decode(&token)?;
        Ok(Self {
            token,
            claims,
            profile: None,
        })
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.claims.expires_at().is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The id the backend knows the caller by. Prefers the cached profile and
    /// falls back to a numeric token subject.
    pub fn actor_id(&self) -> Result<i64, SessionError> {
        if let Some(profile) = &self.profile {
            return Ok(profile.actor_id());
        }
        self.claims
            .sub
            .parse()
            .map_err(|_| SessionError::UnknownActor)
    }

    /// Re-fetches the profile from `/me` and caches it.
    pub async fn refresh<A: ProfileApi>(&mut self, api: &A) -> Result<&Profile, SessionError> {
        let profile = api.me().await?;
        tracing::debug!("Refreshed profile: {}", profile);
        let profile: &Profile = self.profile.insert(profile);
        Ok(profile)
    }
}

/// On-disk shape of a session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    #[serde(default)]
    profile: Option<Profile>,
}

/// File-backed session persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Stores the session as `session.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session, `None` when logged out.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Io(self.path.clone(), e))?;
        let stored: StoredSession = serde_json::from_str(&contents)
            .map_err(|e| SessionError::Json(self.path.clone(), e))?;

        let mut session = Session::from_token(stored.token)?;
        session.profile = stored.profile;

        if session.is_expired() {
            return Err(SessionError::Expired);
        }

        Ok(Some(session))
    }

    /// Loads the stored session, failing when logged out.
    pub fn require(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or(SessionError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Io(parent.into(), e))?;
        }

        let stored = StoredSession {
            token: session.token.clone(),
            profile: session.profile.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| SessionError::Json(self.path.clone(), e))?;

        std::fs::write(&self.path, json).map_err(|e| SessionError::Io(self.path.clone(), e))
    }

    /// Removes the stored session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path).map_err(|e| SessionError::Io(self.path.clone(), e))?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) fn make_token(sub: &str, exp: Option<i64>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = serde_json::json!({"sub": sub, "email": "ana@example.com", "exp": exp});
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}
