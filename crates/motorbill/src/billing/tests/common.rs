use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::billing::domain::{
    Bill, BillChannel, BillDraft, BillId, BillStatus, CustomerDetails, SettlementChannel,
};
use crate::billing::lifecycle::BillingService;
use crate::billing::repository::{BillRepository, InMemoryBillRepository, RepositoryError};
use crate::catalog::{InMemoryVehicleCatalog, VehicleClass, VehicleModel};
use crate::config::PricingConfig;

pub(super) fn standard_model() -> VehicleModel {
    VehicleModel {
        name: "Falcon 125".to_string(),
        base_price: dec!(100000),
        vehicle_class: VehicleClass::Standard,
        lease_eligible: true,
    }
}

pub(super) fn exempt_model() -> VehicleModel {
    VehicleModel {
        name: "E-Trike 48V".to_string(),
        base_price: dec!(50000),
        vehicle_class: VehicleClass::Exempt,
        lease_eligible: false,
    }
}

pub(super) fn catalog() -> InMemoryVehicleCatalog {
    InMemoryVehicleCatalog::with_models(vec![standard_model(), exempt_model()])
        .expect("fixture models are valid")
}

pub(super) fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "N. Wijesinghe".to_string(),
        national_id: "851234567V".to_string(),
        address: "72 Temple Lane, Kandy".to_string(),
    }
}

pub(super) fn delivery_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 15).expect("valid date")
}

pub(super) fn cash_draft(model_name: &str) -> BillDraft {
    BillDraft {
        channel: BillChannel::Cash,
        settlement: None,
        customer: customer(),
        model_name: model_name.to_string(),
        engine_number: "EN-77120".to_string(),
        chassis_number: "CH-90553".to_string(),
        down_payment: None,
        advance_amount: None,
        estimated_delivery_date: None,
    }
}

pub(super) fn leasing_draft(model_name: &str) -> BillDraft {
    BillDraft {
        down_payment: Some(dec!(20000)),
        channel: BillChannel::Leasing,
        ..cash_draft(model_name)
    }
}

pub(super) fn advance_cash_draft(model_name: &str) -> BillDraft {
    BillDraft {
        channel: BillChannel::Advance,
        settlement: Some(SettlementChannel::Cash),
        advance_amount: Some(dec!(30000)),
        estimated_delivery_date: Some(delivery_date()),
        ..cash_draft(model_name)
    }
}

pub(super) fn advance_leasing_draft(model_name: &str) -> BillDraft {
    BillDraft {
        channel: BillChannel::Advance,
        settlement: Some(SettlementChannel::Leasing),
        down_payment: Some(dec!(25000)),
        advance_amount: Some(dec!(10000)),
        estimated_delivery_date: Some(delivery_date()),
        ..cash_draft(model_name)
    }
}

pub(super) type MemoryBillingService =
    BillingService<InMemoryBillRepository, InMemoryVehicleCatalog>;

pub(super) fn build_service() -> (
    Arc<MemoryBillingService>,
    Arc<InMemoryBillRepository>,
    Arc<InMemoryVehicleCatalog>,
) {
    let repository = Arc::new(InMemoryBillRepository::default());
    let catalog = Arc::new(catalog());
    let service = Arc::new(BillingService::new(
        repository.clone(),
        catalog.clone(),
        PricingConfig::default(),
    ));
    (service, repository, catalog)
}

/// Repository double whose every operation reports the store as down.
pub(super) struct UnavailableRepository;

impl BillRepository for UnavailableRepository {
    fn insert(&self, _bill: Bill) -> Result<Bill, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn update(&self, _bill: Bill) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn update_status(&self, _id: &BillId, _status: BillStatus) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Bill>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn delete(&self, _id: &BillId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn successor_of(&self, _id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

/// Repository double that accepts every write except the status flip,
/// exercising the compensating rollback inside conversion.
#[derive(Default)]
pub(super) struct StatusFlipFailsRepository {
    pub(super) inner: InMemoryBillRepository,
}

impl BillRepository for StatusFlipFailsRepository {
    fn insert(&self, bill: Bill) -> Result<Bill, RepositoryError> {
        self.inner.insert(bill)
    }

    fn update(&self, bill: Bill) -> Result<(), RepositoryError> {
        self.inner.update(bill)
    }

    fn update_status(&self, _id: &BillId, _status: BillStatus) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable(
            "status write rejected".to_string(),
        ))
    }

    fn fetch(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn all(&self) -> Result<Vec<Bill>, RepositoryError> {
        self.inner.all()
    }

    fn delete(&self, id: &BillId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn successor_of(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        self.inner.successor_of(id)
    }
}

/// Repository double whose full-record updates fail, for the reconciliation
/// failure-count path.
#[derive(Default)]
pub(super) struct UpdateFailsRepository {
    pub(super) inner: InMemoryBillRepository,
}

impl BillRepository for UpdateFailsRepository {
    fn insert(&self, bill: Bill) -> Result<Bill, RepositoryError> {
        self.inner.insert(bill)
    }

    fn update(&self, _bill: Bill) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable(
            "record write rejected".to_string(),
        ))
    }

    fn update_status(&self, id: &BillId, status: BillStatus) -> Result<(), RepositoryError> {
        self.inner.update_status(id, status)
    }

    fn fetch(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn all(&self) -> Result<Vec<Bill>, RepositoryError> {
        self.inner.all()
    }

    fn delete(&self, id: &BillId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn successor_of(&self, id: &BillId) -> Result<Option<Bill>, RepositoryError> {
        self.inner.successor_of(id)
    }
}
