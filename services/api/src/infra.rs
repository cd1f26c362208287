use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal_macros::dec;

use motorbill::billing::{BillingService, InMemoryBillRepository};
use motorbill::catalog::{InMemoryVehicleCatalog, VehicleClass, VehicleModel};
use motorbill::config::PricingConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ShowroomBillingService =
    BillingService<InMemoryBillRepository, InMemoryVehicleCatalog>;

/// Showroom stock used by `serve` (until a durable store is wired in) and
/// by the demo subcommands.
pub(crate) fn seeded_catalog() -> InMemoryVehicleCatalog {
    InMemoryVehicleCatalog::with_models(vec![
        VehicleModel {
            name: "Falcon 125".to_string(),
            base_price: dec!(458000),
            vehicle_class: VehicleClass::Standard,
            lease_eligible: true,
        },
        VehicleModel {
            name: "Metro 110".to_string(),
            base_price: dec!(392500),
            vehicle_class: VehicleClass::Standard,
            lease_eligible: true,
        },
        VehicleModel {
            name: "E-Trike 48V".to_string(),
            base_price: dec!(287000),
            vehicle_class: VehicleClass::Exempt,
            lease_eligible: false,
        },
    ])
    .expect("seeded catalog rows are valid")
}

pub(crate) fn build_showroom_service(
    pricing: PricingConfig,
) -> (Arc<ShowroomBillingService>, Arc<InMemoryBillRepository>) {
    let repository = Arc::new(InMemoryBillRepository::default());
    let catalog = Arc::new(seeded_catalog());
    let service = Arc::new(BillingService::new(repository.clone(), catalog, pricing));
    (service, repository)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
