//! # API Client
//!
//! Typed access to the remote POS API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path                      Response shape                       │
//! │  ──────  ────                      ──────────────                       │
//! │  POST    /api/auth/login           {ok, token, user, shop}              │
//! │  GET     /api/devices              {data: [Device]}                     │
//! │  GET     /api/cash-sessions        [CashSession]                        │
//! │  GET     /api/stores               [Store]                              │
//! │  GET     /api/currencies           {currencies: [CurrencyInfo]}         │
//! │  GET     /api/accounts?limit=N     {data: [Account]}                    │
//! │  GET     /api/products?q=&limit=N  {data: [Product]}                    │
//! │  GET     /api/customers?q=         {data: [Customer]}                   │
//! │  POST    /api/sales                {sale: {id}} or {sale_id}            │
//! │  GET     /api/sales                {data: [SaleSummary]}                │
//! │  GET     /api/reports/today        TodayReport (ok: false = failure)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Mapping
//! A non-2xx response becomes [`ClientError::Api`] whose message is the
//! response body, or `HTTP <status>` when the body is empty. A list field
//! that is missing or not an array is read as an empty list.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use till_core::validation::validate_search_query;
use till_core::{
    Account, CashSession, CurrencyInfo, Customer, Device, LookupData, Product, SaleSubmission,
    SaleSummary, Store, TodayReport,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::Credential;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// User block of the login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub shop_id: Option<String>,
}

/// Shop block of the login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginShop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub credential: Credential,
    pub user: LoginUser,
    pub shop: Option<LoginShop>,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<LoginUser>,
    #[serde(default)]
    shop: Option<LoginShop>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct CurrenciesEnvelope {
    #[serde(default)]
    currencies: Value,
}

#[derive(Debug, Deserialize)]
struct CreatedSale {
    #[serde(default)]
    sale: Option<CreatedSaleRef>,
    #[serde(default)]
    sale_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedSaleRef {
    id: String,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the remote POS API.
///
/// The credential is fixed at construction; nothing here reads the token
/// store. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credential: Option<Credential>,
    product_limit: usize,
    account_limit: usize,
}

impl ApiClient {
    /// Creates a client from configuration and an optional credential.
    pub fn new(config: &ClientConfig, credential: Option<Credential>) -> ClientResult<Self> {
        Url::parse(config.base_url())?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(ApiClient {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            credential,
            product_limit: config.api.product_search_limit,
            account_limit: config.api.account_limit,
        })
    }

    /// The credential attached to every request, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Exchanges username and password for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let url = self.url("/api/auth/login")?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let envelope: Option<LoginEnvelope> = serde_json::from_str(&body).ok();

        let failed = |envelope: Option<LoginEnvelope>| {
            let message = envelope
                .and_then(|e| e.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Login failed".to_string());
            warn!(status = %status, message = %message, "Login refused");
            ClientError::LoginFailed(message)
        };

        let envelope = match envelope {
            Some(e) if status.is_success() && e.ok => e,
            other => return Err(failed(other)),
        };

        let (Some(token), Some(user)) = (envelope.token, envelope.user) else {
            return Err(ClientError::UnexpectedResponse(
                "login response is missing token or user".into(),
            ));
        };

        info!(username = %user.username, shop_id = ?user.shop_id, "Logged in");
        Ok(LoginResponse {
            credential: Credential::new(token),
            user,
            shop: envelope.shop,
        })
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub async fn devices(&self) -> ClientResult<Vec<Device>> {
        let envelope: DataEnvelope = self.get("/api/devices", &[]).await?;
        list_from(envelope.data)
    }

    pub async fn cash_sessions(&self) -> ClientResult<Vec<CashSession>> {
        let body: Value = self.get("/api/cash-sessions", &[]).await?;
        list_from(body)
    }

    pub async fn stores(&self) -> ClientResult<Vec<Store>> {
        let body: Value = self.get("/api/stores", &[]).await?;
        list_from(body)
    }

    pub async fn currencies(&self) -> ClientResult<Vec<CurrencyInfo>> {
        let envelope: CurrenciesEnvelope = self.get("/api/currencies", &[]).await?;
        list_from(envelope.currencies)
    }

    pub async fn accounts(&self) -> ClientResult<Vec<Account>> {
        let limit = self.account_limit.to_string();
        let envelope: DataEnvelope = self.get("/api/accounts", &[("limit", limit.as_str())]).await?;
        list_from(envelope.data)
    }

    /// Fetches every lookup the new-sale screen needs, concurrently.
    ///
    /// Fails as a whole if any single lookup fails.
    pub async fn lookups(&self) -> ClientResult<LookupData> {
        let (devices, cash_sessions, stores, currencies, accounts) = tokio::try_join!(
            self.devices(),
            self.cash_sessions(),
            self.stores(),
            self.currencies(),
            self.accounts(),
        )?;

        debug!(
            devices = devices.len(),
            cash_sessions = cash_sessions.len(),
            stores = stores.len(),
            accounts = accounts.len(),
            "Lookups loaded"
        );

        Ok(LookupData {
            devices,
            cash_sessions,
            stores,
            currencies,
            accounts,
        })
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Products matching a name or SKU query.
    pub async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        let limit = self.product_limit.to_string();
        let envelope: DataEnvelope = self
            .get("/api/products", &[("q", query.as_str()), ("limit", limit.as_str())])
            .await?;
        list_from(envelope.data)
    }

    /// Customers matching a query. An empty query lists customers.
    pub async fn search_customers(&self, query: &str) -> ClientResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        let envelope: DataEnvelope = self
            .get("/api/customers", &[("q", query.as_str())])
            .await?;
        list_from(envelope.data)
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    /// Creates a sale and returns its server id.
    pub async fn create_sale(&self, submission: &SaleSubmission) -> ClientResult<String> {
        let url = self.url("/api/sales")?;
        let request = self.authorize(self.http.post(url).json(submission));
        let created: CreatedSale = read_json(request.send().await?).await?;

        let id = created
            .sale
            .map(|s| s.id)
            .or(created.sale_id)
            .ok_or_else(|| ClientError::UnexpectedResponse("response has no sale id".into()))?;

        info!(
            sale_id = %id,
            lines = submission.lines.len(),
            currency = %submission.pay.currency,
            amount_usd = %submission.pay.amount_usd,
            "Sale created"
        );
        Ok(id)
    }

    /// Recent sales.
    pub async fn list_sales(&self) -> ClientResult<Vec<SaleSummary>> {
        let envelope: DataEnvelope = self.get("/api/sales", &[]).await?;
        list_from(envelope.data)
    }

    /// Server-computed figures for the current UTC day.
    pub async fn today_report(&self) -> ClientResult<TodayReport> {
        let body: Value = self.get("/api/reports/today", &[]).await?;

        if body.get("ok").and_then(Value::as_bool) == Some(false) {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Failed to load")
                .to_string();
            return Err(ClientError::Rejected(message));
        }

        Ok(serde_json::from_value(body)?)
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(credential) => request.bearer_auth(credential.token()),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<T> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        debug!(url = %url, "GET");
        let response = self.authorize(self.http.get(url)).send().await?;
        read_json(response).await
    }
}

/// Reads a response body, mapping non-2xx statuses to [`ClientError::Api`].
async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            body
        };
        warn!(status = %status, message = %message, "API request failed");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Reads a JSON array; anything else is an empty list.
fn list_from<T: DeserializeOwned>(value: Value) -> ClientResult<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(Vec::new()),
    }
}
