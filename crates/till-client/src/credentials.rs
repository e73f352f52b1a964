//! # Credentials
//!
//! The bearer token issued by `/api/auth/login`, and where it is kept
//! between runs.
//!
//! ## Token Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Credential Lifecycle                               │
//! │                                                                         │
//! │  till login ──► POST /api/auth/login ──► token ──► TokenStore::save     │
//! │                                                                         │
//! │  till <cmd> ──► TokenStore::load ──► Credential::new(token)             │
//! │                                          │                              │
//! │                                          ├── shop_id claim (for drafts) │
//! │                                          └── ApiClient::new(.., Some)   │
//! │                                                                         │
//! │  till logout ─► TokenStore::clear                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The signature is NOT verified here. The server issued the token and
//! checks it on every request; the client only reads claims it needs to
//! build requests.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Claims
// =============================================================================

/// Claims the client reads from the token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Expiry (seconds since the epoch), if the server sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Decodes the payload of a JWT without checking its signature or expiry.
    pub fn decode(token: &str) -> ClientResult<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }
}

// =============================================================================
// Credential
// =============================================================================

/// An opaque bearer token plus the claims read from it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    claims: TokenClaims,
}

impl Credential {
    /// Wraps a token.
    ///
    /// A token whose payload cannot be read is still usable for requests;
    /// it simply carries no shop identity.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let claims = TokenClaims::decode(&token).unwrap_or_else(|e| {
            warn!(error = %e, "Could not read claims from token");
            TokenClaims::default()
        });
        Credential { token, claims }
    }

    /// Raw bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Shop the token was issued for.
    pub fn shop_id(&self) -> Option<&str> {
        self.claims
            .shop_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

/// Debug output never includes the token itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

// =============================================================================
// Token Store
// =============================================================================

/// File-backed storage for the bearer token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    /// Store at the configured path, or the platform data directory.
    pub fn open(configured: Option<PathBuf>) -> ClientResult<Self> {
        configured
            .or_else(Self::default_path)
            .map(TokenStore::new)
            .ok_or_else(|| ClientError::TokenStore("No token path available".into()))
    }

    /// Returns the default token file path.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.till.pos/token`
    /// - **Windows**: `%APPDATA%\till\pos\data\token`
    /// - **Linux**: `~/.local/share/pos/token`
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos").map(|dirs| dirs.data_dir().join("token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the token, replacing any previous one.
    pub fn save(&self, credential: &Credential) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(token_store_error)?;
        }
        std::fs::write(&self.path, credential.token()).map_err(token_store_error)?;
        info!(path = ?self.path, shop_id = ?credential.shop_id(), "Token saved");
        Ok(())
    }

    /// Loads the stored token. A missing or empty file means "not logged in".
    pub fn load(&self) -> ClientResult<Option<Credential>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    debug!(path = ?self.path, "Token file is empty");
                    return Ok(None);
                }
                Ok(Some(Credential::new(token)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No stored token");
                Ok(None)
            }
            Err(e) => Err(token_store_error(e)),
        }
    }

    /// Removes the stored token. Clearing an absent token is not an error.
    pub fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = ?self.path, "Token cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(token_store_error(e)),
        }
    }
}

fn token_store_error(err: std::io::Error) -> ClientError {
    ClientError::TokenStore(err.to_string())
}
