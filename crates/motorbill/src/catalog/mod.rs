//! Vehicle catalog: the read-only pricing attributes every bill snapshots.
//!
//! Catalog rows are authoritative. Whether a vehicle owes the registration
//! fee or may be financed is decided by the stored `VehicleClass` and
//! `lease_eligible` flag, never by inspecting the model name.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statutory category of a vehicle model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Standard,
    Exempt,
}

impl VehicleClass {
    pub const fn label(self) -> &'static str {
        match self {
            VehicleClass::Standard => "standard",
            VehicleClass::Exempt => "registration_exempt",
        }
    }
}

/// Catalog row describing a sellable vehicle model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub name: String,
    pub base_price: Decimal,
    pub vehicle_class: VehicleClass,
    pub lease_eligible: bool,
}

impl VehicleModel {
    /// Reject rows that could never produce a lawful bill.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::BlankName);
        }
        if self.base_price <= Decimal::ZERO {
            return Err(CatalogError::InvalidPrice {
                model: self.name.clone(),
                price: self.base_price,
            });
        }
        if self.vehicle_class == VehicleClass::Exempt && self.lease_eligible {
            return Err(CatalogError::ExemptLeaseEligible {
                model: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Errors raised by catalog lookups and administration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("vehicle model '{0}' is not in the catalog")]
    NotFound(String),
    #[error("vehicle model name must be provided")]
    BlankName,
    #[error("vehicle model '{model}' must have a positive base price, found {price}")]
    InvalidPrice { model: String, price: Decimal },
    #[error("exempt vehicle model '{model}' can never be lease eligible")]
    ExemptLeaseEligible { model: String },
    #[error("vehicle model '{model}' is referenced by {bills} issued bill(s)")]
    ModelInUse { model: String, bills: usize },
}

/// Lookup abstraction so the billing service can be exercised in isolation.
pub trait VehicleCatalog: Send + Sync {
    fn find_by_name(&self, name: &str) -> Result<VehicleModel, CatalogError>;
    fn upsert(&self, model: VehicleModel) -> Result<(), CatalogError>;
    fn remove(&self, name: &str) -> Result<(), CatalogError>;
}

/// Catalog backed by a process-local map, used by tests and the demo CLI.
#[derive(Default, Clone)]
pub struct InMemoryVehicleCatalog {
    models: Arc<Mutex<BTreeMap<String, VehicleModel>>>,
}

impl InMemoryVehicleCatalog {
    pub fn with_models(models: Vec<VehicleModel>) -> Result<Self, CatalogError> {
        let catalog = Self::default();
        for model in models {
            catalog.upsert(model)?;
        }
        Ok(catalog)
    }
}

impl VehicleCatalog for InMemoryVehicleCatalog {
    fn find_by_name(&self, name: &str) -> Result<VehicleModel, CatalogError> {
        let guard = self.models.lock().expect("catalog mutex poisoned");
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    fn upsert(&self, model: VehicleModel) -> Result<(), CatalogError> {
        model.validate()?;
        let mut guard = self.models.lock().expect("catalog mutex poisoned");
        guard.insert(model.name.clone(), model);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), CatalogError> {
        let mut guard = self.models.lock().expect("catalog mutex poisoned");
        guard
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }
}
