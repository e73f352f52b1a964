//! # New Sale Session
//!
//! The "new sale" screen without a UI: lookups, the draft, the catalog cache
//! and submission, wired to one [`ApiClient`].
//!
//! ## Screen Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSaleSession::new(api, rate)     draft.shop_id ← credential claim    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  load()  ── try_join(devices, sessions, stores, currencies, accounts)   │
//! │        │     └── Err → LoadError "Failed to load dropdowns: ..."        │
//! │        ▼                                                                │
//! │  draft.apply_lookup_defaults()                                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  product_search() ──► results ──► pick_product() ──► catalog + line     │
//! │  customer_search() ─► results ──► draft_mut().set_customer()            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  submit() ── validate ── POST /api/sales ── clear_after_submission      │
//! │        └── Err → SubmitError (rejection or server message)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use till_core::{
    CashSession, Catalog, Customer, DraftRejection, ExchangeRate, LookupData, Product, SaleDraft,
};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::SearchSettings;
use crate::error::ClientError;
use crate::search::DebouncedSearch;

// =============================================================================
// Errors
// =============================================================================

/// Lookups could not be loaded.
#[derive(Debug, Error)]
#[error("Failed to load dropdowns: {0}")]
pub struct LoadError(#[from] pub ClientError);

/// Why a sale was not created.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The draft is incomplete; nothing was sent.
    #[error(transparent)]
    Rejected(#[from] DraftRejection),

    /// The server refused the sale or could not be reached.
    #[error(transparent)]
    Api(#[from] ClientError),
}

// =============================================================================
// Session
// =============================================================================

/// One operator's new-sale screen.
#[derive(Debug)]
pub struct NewSaleSession {
    api: ApiClient,
    draft: SaleDraft,
    catalog: Catalog,
    lookups: LookupData,
}

impl NewSaleSession {
    /// Starts an empty draft for the shop named in the client's credential.
    pub fn new(api: ApiClient, exchange_rate: ExchangeRate) -> Self {
        let shop_id = api
            .credential()
            .and_then(|c| c.shop_id())
            .map(str::to_string);

        let mut draft = SaleDraft::new(shop_id);
        draft.set_exchange_rate(exchange_rate);

        NewSaleSession {
            api,
            draft,
            catalog: Catalog::new(),
            lookups: LookupData::default(),
        }
    }

    /// Loads every lookup and preselects defaults the operator has not
    /// chosen yet.
    pub async fn load(&mut self) -> Result<(), LoadError> {
        let lookups = self.api.lookups().await.map_err(|e| {
            warn!(error = %e, "Failed to load lookups");
            LoadError(e)
        })?;

        self.draft.apply_lookup_defaults(&lookups);
        self.lookups = lookups;
        Ok(())
    }

    pub fn draft(&self) -> &SaleDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SaleDraft {
        &mut self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn lookups(&self) -> &LookupData {
        &self.lookups
    }

    /// Sessions offered in the cash-session picker.
    pub fn open_sessions(&self) -> impl Iterator<Item = &CashSession> {
        self.lookups.cash_sessions.iter().filter(|s| s.is_open())
    }

    /// Caches search results so lines can show names and be priced.
    pub fn merge_search_results(&mut self, products: &[Product]) {
        self.catalog.merge(products.iter().cloned());
    }

    /// Adds one unit of a picked product, or bumps its line.
    pub fn pick_product(&mut self, product: Product) -> usize {
        let product_id = product.id.clone();
        self.catalog.insert(product);
        self.draft.add_or_increment_line(&product_id, &self.catalog)
    }

    /// Picks the customer for the sale.
    pub fn pick_customer(&mut self, customer: Customer) {
        self.draft.set_customer(Some(customer));
    }

    /// Debounced product search bound to this session's client.
    pub fn product_search(&self, settings: &SearchSettings) -> DebouncedSearch<Product> {
        let api = self.api.clone();
        DebouncedSearch::new(settings.debounce(), settings.min_chars, move |query: String| {
            let api = api.clone();
            async move { api.search_products(&query).await }
        })
    }

    /// Debounced customer search. Any query, including an empty one, is sent.
    pub fn customer_search(&self, settings: &SearchSettings) -> DebouncedSearch<Customer> {
        let api = self.api.clone();
        DebouncedSearch::new(settings.debounce(), 0, move |query: String| {
            let api = api.clone();
            async move { api.search_customers(&query).await }
        })
    }

    /// Validates and submits the draft.
    ///
    /// On success the per-sale fields are cleared and the created sale id
    /// is returned. On failure the draft is left untouched.
    pub async fn submit(&mut self) -> Result<String, SubmitError> {
        let payload = self.draft.to_submission_payload()?;
        let sale_id = self.api.create_sale(&payload).await?;

        self.draft.clear_after_submission();
        info!(sale_id = %sale_id, "Sale submitted, draft reset");
        Ok(sale_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_load_error_message() {
        let err = LoadError(ClientError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(err.to_string(), "Failed to load dropdowns: boom");
    }

    #[test]
    fn test_submit_error_shows_rejection_text() {
        let err = SubmitError::from(DraftRejection::MissingCustomer);
        assert_eq!(err.to_string(), "Pick a customer.");
    }

    #[test]
    fn test_pick_product_prices_from_catalog() {
        let api = ApiClient::new(&ClientConfig::default(), None).unwrap();
        let mut session = NewSaleSession::new(api, ExchangeRate::default());

        let coke = Product {
            id: "p1".into(),
            sku: "COKE".into(),
            name: "Coke".into(),
            price_usd: Some(till_core::Money::from_cents(125)),
        };
        session.pick_product(coke.clone());
        session.pick_product(coke);

        assert_eq!(session.draft().lines()[0].quantity, 2);
        assert_eq!(session.draft().compute_total().cents(), 250);
        assert_eq!(session.catalog().label_of("p1"), "Coke");
        assert_eq!(session.draft().shop_id(), None);
    }
}
