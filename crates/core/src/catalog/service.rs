//! Catalog upserts keyed by resource code.

use std::sync::Arc;

use starledger_shared::FieldErrors;
use starledger_shared::types::ResourceId;
use tracing::info;

use super::error::CatalogError;
use crate::auth::{Capabilities, Policy, evaluate};
use crate::clock::Clock;
use crate::records::{Resource, ResourceFields};
use crate::store::CatalogStore;

/// One entry of an upsert batch, before validation.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Natural key.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub resource_type: String,
    /// Buy price.
    pub price_buy: f64,
    /// Sell price.
    pub price_sell: f64,
}

impl CatalogEntry {
    fn validate(&self, index: usize, errors: &mut FieldErrors) {
        let mut fail = |field: &str, message: &str| {
            errors
                .entry(format!("[{index}].{field}"))
                .or_default()
                .push(message.to_string());
        };

        let code_len = self.code.chars().count();
        if !(1..=4).contains(&code_len) {
            fail("code", "Code must be between 1 and 4 characters");
        }
        let name_len = self.name.chars().count();
        if !(1..=100).contains(&name_len) {
            fail("name", "Name must be between 1 and 100 characters");
        }
        if self.resource_type.chars().count() > 50 {
            fail("type", "Type must be at most 50 characters");
        }
        for (field, price) in [("priceBuy", self.price_buy), ("priceSell", self.price_sell)] {
            if !price.is_finite() || price < 0.0 {
                fail(field, "Price must be a finite, non-negative number");
            }
        }
    }

    fn into_fields(self) -> ResourceFields {
        ResourceFields {
            code: self.code,
            name: self.name,
            resource_type: self.resource_type,
            price_buy: self.price_buy,
            price_sell: self.price_sell,
        }
    }
}

/// Maintains the resource catalog.
pub struct CatalogManager<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: CatalogStore> CatalogManager<S> {
    /// Creates a manager over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Full catalog ordered by id.
    pub async fn list(&self) -> Result<Vec<Resource>, CatalogError> {
        Ok(self.store.list_resources().await?)
    }

    /// One catalog entry.
    pub async fn get(&self, resource_id: ResourceId) -> Result<Resource, CatalogError> {
        self.store
            .find_resource(resource_id)
            .await?
            .ok_or(CatalogError::NotFound(resource_id))
    }

    /// Inserts or overwrites each entry by code and returns the refreshed catalog.
    ///
    /// Every entry is validated before anything is written. Requires
    /// [`Policy::Developer`].
    pub async fn upsert<C: Capabilities + ?Sized>(
        &self,
        caller: &C,
        entries: Vec<CatalogEntry>,
    ) -> Result<Vec<Resource>, CatalogError> {
        evaluate(Policy::Developer, caller)?;

        let mut errors = FieldErrors::new();
        for (index, entry) in entries.iter().enumerate() {
            entry.validate(index, &mut errors);
        }
        if !errors.is_empty() {
            return Err(CatalogError::Invalid(errors));
        }

        let (mut inserted, mut updated) = (0usize, 0usize);
        for entry in entries {
            let fields = entry.into_fields();
            let now = self.clock.now();
            match self.store.find_resource_by_code(&fields.code).await? {
                Some(existing) => {
                    self.store.update_resource(existing.id, &fields, now).await?;
                    updated += 1;
                }
                None => {
                    self.store.insert_resource(&fields, now).await?;
                    inserted += 1;
                }
            }
        }

        info!(inserted, updated, "Catalog upserted");
        self.list().await
    }
}
