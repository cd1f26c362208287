use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{VehicleClass, VehicleModel};

/// Identifier wrapper for issued bills.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillId(pub String);

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment mechanism declared when the bill is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillChannel {
    Cash,
    Leasing,
    Advance,
}

impl BillChannel {
    pub const fn label(self) -> &'static str {
        match self {
            BillChannel::Cash => "cash",
            BillChannel::Leasing => "leasing",
            BillChannel::Advance => "advance",
        }
    }
}

/// Channel an advance bill settles into once the customer pays the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementChannel {
    Cash,
    Leasing,
}

impl SettlementChannel {
    pub const fn label(self) -> &'static str {
        match self {
            SettlementChannel::Cash => "cash",
            SettlementChannel::Leasing => "leasing",
        }
    }

    pub const fn as_bill_channel(self) -> BillChannel {
        match self {
            SettlementChannel::Cash => BillChannel::Cash,
            SettlementChannel::Leasing => BillChannel::Leasing,
        }
    }
}

/// Purchaser identity captured on the bill. Opaque strings, presence-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub national_id: String,
    pub address: String,
}

impl CustomerDetails {
    pub fn validate(&self) -> Result<(), DraftError> {
        for (field, value) in [
            ("name", &self.name),
            ("national id", &self.national_id),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(DraftError::MissingCustomerField { field });
            }
        }
        Ok(())
    }
}

/// Point-in-time copy of the catalog row plus the unit serials.
///
/// Bills never hold a live catalog reference: catalog prices move over time
/// while an issued bill is a historical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub model_name: String,
    pub base_price: Decimal,
    pub vehicle_class: VehicleClass,
    pub lease_eligible: bool,
    pub engine_number: String,
    pub chassis_number: String,
}

impl VehicleSnapshot {
    pub fn capture(model: &VehicleModel, engine_number: String, chassis_number: String) -> Self {
        Self {
            model_name: model.name.clone(),
            base_price: model.base_price,
            vehicle_class: model.vehicle_class,
            lease_eligible: model.lease_eligible,
            engine_number,
            chassis_number,
        }
    }

    /// Same unit, re-read at a newer catalog price.
    pub fn repriced(&self, base_price: Decimal) -> Self {
        Self {
            base_price,
            ..self.clone()
        }
    }
}

/// How the registration fee participates in this bill's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeTreatment {
    /// Statutorily exempt vehicle: no fee on any channel.
    Exempt,
    /// Fee collected from the customer and added to the total.
    Collected(Decimal),
    /// Fee settled by the financing company; recorded but never billed.
    Financed(Decimal),
}

impl SurchargeTreatment {
    /// Portion of the fee that enters the customer-facing total.
    pub fn billed_amount(&self) -> Decimal {
        match self {
            SurchargeTreatment::Collected(fee) => *fee,
            SurchargeTreatment::Exempt | SurchargeTreatment::Financed(_) => Decimal::ZERO,
        }
    }

    /// Fee amount kept for bookkeeping regardless of who pays it.
    pub fn recorded_amount(&self) -> Decimal {
        match self {
            SurchargeTreatment::Exempt => Decimal::ZERO,
            SurchargeTreatment::Collected(fee) | SurchargeTreatment::Financed(fee) => *fee,
        }
    }
}

/// Financial outcome computed by the pricing policy. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub base_price: Decimal,
    pub surcharge: SurchargeTreatment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_amount: Option<Decimal>,
    pub total_amount: Decimal,
    pub balance_amount: Decimal,
}

/// Lifecycle position of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Completed,
    Converted,
    Cancelled,
}

impl BillStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Completed => "completed",
            BillStatus::Converted => "converted",
            BillStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, BillStatus::Pending)
    }
}

/// An issued sales bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub channel: BillChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementChannel>,
    pub customer: CustomerDetails,
    pub vehicle: VehicleSnapshot,
    pub financials: Breakdown,
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_bill_id: Option<BillId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Inbound request describing the sale to invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillDraft {
    pub channel: BillChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementChannel>,
    pub customer: CustomerDetails,
    pub model_name: String,
    pub engine_number: String,
    pub chassis_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_date: Option<NaiveDate>,
}

impl BillDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        self.customer.validate()?;
        if self.engine_number.trim().is_empty() || self.chassis_number.trim().is_empty() {
            return Err(DraftError::MissingSerials);
        }
        Ok(())
    }
}

/// Validation errors for inbound drafts, surfaced as client-input failures.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("customer {field} must be provided")]
    MissingCustomerField { field: &'static str },
    #[error("engine and chassis numbers must be provided")]
    MissingSerials,
}
