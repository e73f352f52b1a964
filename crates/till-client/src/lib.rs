//! # till-client: Remote API Client for Till
//!
//! Async I/O around [`till_core`]: configuration, the stored bearer token,
//! the HTTP client for the remote POS API, debounced search, and the
//! new-sale screen session that ties them to a [`till_core::SaleDraft`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          till-client                                    │
//! │                                                                         │
//! │   `till` CLI ─────────────┐                                             │
//! │        │                  │                                             │
//! │        ▼                  ▼                                             │
//! │   ClientConfig       TokenStore ──► Credential (token + shop_id)        │
//! │        │                                 │                              │
//! │        └──────────────┬──────────────────┘                              │
//! │                       ▼                                                 │
//! │                   ApiClient ─────────────────► Remote POS API           │
//! │                       │                                                 │
//! │          ┌────────────┴────────────┐                                    │
//! │          ▼                         ▼                                    │
//! │   DebouncedSearch<T>         NewSaleSession                             │
//! │   (latest query wins)        (lookups + SaleDraft + submit)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - `ApiClient`, one method per endpoint
//! - [`config`] - `ClientConfig` (TOML + environment)
//! - [`credentials`] - `Credential` and the file-backed `TokenStore`
//! - [`error`] - Client error types
//! - [`sale_screen`] - `NewSaleSession`
//! - [`search`] - `DebouncedSearch`
//!
//! ## Usage Example
//! ```rust,no_run
//! use till_client::{ApiClient, ClientConfig, NewSaleSession, TokenStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load_or_default(None);
//! let credential = TokenStore::open(config.auth.token_path.clone())?.load()?;
//! let api = ApiClient::new(&config, credential)?;
//!
//! let mut session = NewSaleSession::new(api, config.exchange_rate()?);
//! session.load().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod sale_screen;
pub mod search;

pub use api::{ApiClient, LoginResponse};
pub use config::ClientConfig;
pub use credentials::{Credential, TokenStore};
pub use error::{ClientError, ClientResult};
pub use sale_screen::{LoadError, NewSaleSession, SubmitError};
pub use search::{DebouncedSearch, SearchResults};
