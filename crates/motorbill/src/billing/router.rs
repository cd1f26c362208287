use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Bill, BillDraft, BillId, BillStatus};
use super::lifecycle::{BillingError, BillingService, ConversionDirective};
use super::render::DocumentFormat;
use super::repository::{BillRepository, RepositoryError};
use crate::catalog::{CatalogError, VehicleCatalog};

/// Router builder exposing HTTP endpoints for the billing operations.
pub fn billing_router<R, C>(service: Arc<BillingService<R, C>>) -> Router
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/bills",
            post(create_handler::<R, C>).get(list_handler::<R, C>),
        )
        .route(
            "/api/v1/bills/:bill_id",
            get(fetch_handler::<R, C>).delete(delete_handler::<R, C>),
        )
        .route(
            "/api/v1/bills/:bill_id/complete",
            post(complete_handler::<R, C>),
        )
        .route(
            "/api/v1/bills/:bill_id/convert",
            post(convert_handler::<R, C>),
        )
        .route(
            "/api/v1/bills/:bill_id/cancel",
            post(cancel_handler::<R, C>),
        )
        .route(
            "/api/v1/bills/:bill_id/document",
            get(document_handler::<R, C>),
        )
        .route(
            "/api/v1/reconciliation/run",
            post(reconcile_handler::<R, C>),
        )
        .with_state(service)
}

/// Sanitized bill summary exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct BillView {
    pub bill_id: BillId,
    pub status: &'static str,
    pub channel: &'static str,
    pub model_name: String,
    pub total_amount: Decimal,
    pub balance_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_bill_id: Option<BillId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Bill> for BillView {
    fn from(bill: &Bill) -> Self {
        Self {
            bill_id: bill.id.clone(),
            status: bill.status.label(),
            channel: bill.channel.label(),
            model_name: bill.vehicle.model_name.clone(),
            total_amount: bill.financials.total_amount,
            balance_amount: bill.financials.balance_amount,
            original_bill_id: bill.original_bill_id.clone(),
            created_at: bill.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DocumentQuery {
    #[serde(default)]
    format: DocumentFormat,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<BillStatus>,
}

pub(crate) async fn create_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Json(draft): Json<BillDraft>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.create_bill(draft) {
        Ok(bill) => (StatusCode::CREATED, Json(BillView::from(&bill))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.list_bills() {
        Ok(bills) => {
            let views: Vec<BillView> = bills
                .iter()
                .filter(|bill| query.status.map_or(true, |status| bill.status == status))
                .map(BillView::from)
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.get_bill(&BillId(bill_id)) {
        Ok(bill) => (StatusCode::OK, Json(BillView::from(&bill))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.delete_bill(&BillId(bill_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.complete_bill(&BillId(bill_id)) {
        Ok(bill) => (StatusCode::OK, Json(BillView::from(&bill))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn convert_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
    Json(directive): Json<ConversionDirective>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.convert_bill(&BillId(bill_id), directive) {
        Ok(outcome) => {
            let payload = json!({
                "source": BillView::from(&outcome.source),
                "successor": BillView::from(&outcome.successor),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.cancel_bill(&BillId(bill_id)) {
        Ok(bill) => (StatusCode::OK, Json(BillView::from(&bill))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
    Path(bill_id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.render_document(&BillId(bill_id), query.format) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, query.format.content_type())],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reconcile_handler<R, C>(
    State(service): State<Arc<BillingService<R, C>>>,
) -> Response
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    match service.reconcile() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: BillingError) -> Response {
    let status = status_for(&error);
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn status_for(error: &BillingError) -> StatusCode {
    match error {
        BillingError::Policy(_) | BillingError::Draft(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BillingError::BillNotFound(_)
        | BillingError::Catalog(CatalogError::NotFound(_))
        | BillingError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        BillingError::InvalidTransition { .. }
        | BillingError::AdvanceRequiresConversion(_)
        | BillingError::NotAnAdvanceBill(_)
        | BillingError::ReferentialConflict { .. }
        | BillingError::Repository(RepositoryError::Conflict)
        | BillingError::Catalog(CatalogError::ModelInUse { .. }) => StatusCode::CONFLICT,
        BillingError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        BillingError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BillingError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
