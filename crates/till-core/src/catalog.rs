//! # Catalog Cache
//!
//! Local lookup cache of every product seen in search results.
//!
//! The cache is for pricing new lines and rendering line names/SKUs. It is
//! never authoritative: the server re-prices on submission, and refreshing an
//! entry here never changes a line already in the draft.

use std::collections::HashMap;

use crate::draft::PriceLookup;
use crate::money::Money;
use crate::types::Product;

/// Products keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a single product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Merges a batch of search results; later entries win.
    pub fn merge<I>(&mut self, products: I)
    where
        I: IntoIterator<Item = Product>,
    {
        for product in products {
            self.insert(product);
        }
    }

    /// Returns the cached product.
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    /// Returns the cached reference-currency price, if known.
    pub fn price_of(&self, product_id: &str) -> Option<Money> {
        self.get(product_id).and_then(|p| p.price_usd)
    }

    /// Display label for a line: product name, or the raw id when unseen.
    pub fn label_of<'a>(&'a self, product_id: &'a str) -> &'a str {
        self.get(product_id)
            .map(|p| p.name.as_str())
            .unwrap_or(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl PriceLookup for Catalog {
    fn unit_price(&self, product_id: &str) -> Option<Money> {
        self.price_of(product_id)
    }
}
