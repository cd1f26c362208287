//! Deterministic transformation of a `(Bill, Breakdown)` pair into invoice
//! documents.
//!
//! The renderer owns the content model only; the physical encoding belongs
//! to a [`DocumentComposer`]. Every date on the document comes from the
//! bill itself, never from the clock, so re-rendering a stored bill always
//! reproduces the same bytes.

mod composer;
mod content;

pub use composer::{DocumentComposer, PlainComposer};
pub use content::{
    ChargeRow, CustomerBlock, FooterBlock, HeaderBlock, InvoiceDocument, RowValue, VehicleBlock,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Bill, BillChannel, Breakdown, SettlementChannel, SurchargeTreatment};

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl Default for DocumentFormat {
    fn default() -> Self {
        DocumentFormat::Pdf
    }
}

/// Rendering failures (composition layer).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("document composition failed: {0}")]
    Compose(String),
}

/// Letterhead identity stamped on every rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerIdentity {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for IssuerIdentity {
    fn default() -> Self {
        Self {
            name: "Sunrise Motor Traders".to_string(),
            address: "214 Galle Road, Colombo 04".to_string(),
            phone: "011-2504771".to_string(),
        }
    }
}

const STANDARD_TERMS: [&str; 3] = [
    "Goods once sold are not returnable or exchangeable.",
    "The vehicle remains the property of the seller until payment is received in full.",
    "Warranty claims are honored only against the original invoice.",
];

/// Builds invoice content and delegates the encoding to a composer.
pub struct DocumentRenderer {
    issuer: IssuerIdentity,
    composer: Arc<dyn DocumentComposer>,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(IssuerIdentity::default(), Arc::new(PlainComposer))
    }
}

impl DocumentRenderer {
    pub fn new(issuer: IssuerIdentity, composer: Arc<dyn DocumentComposer>) -> Self {
        Self { issuer, composer }
    }

    /// Build the logical document for a bill and its financial breakdown.
    ///
    /// Pure: the same inputs always produce the same content, and the issue
    /// date is the bill's own creation date.
    pub fn document(&self, bill: &Bill, financials: &Breakdown) -> InvoiceDocument {
        InvoiceDocument {
            header: HeaderBlock {
                issuer_name: self.issuer.name.clone(),
                issuer_address: self.issuer.address.clone(),
                issuer_phone: self.issuer.phone.clone(),
                bill_number: bill.id.0.clone(),
                channel: bill.channel.label(),
                issued_on: bill.created_at.date_naive(),
            },
            customer: CustomerBlock {
                name: bill.customer.name.clone(),
                national_id: bill.customer.national_id.clone(),
                address: bill.customer.address.clone(),
            },
            vehicle: VehicleBlock {
                model_name: bill.vehicle.model_name.clone(),
                vehicle_class: bill.vehicle.vehicle_class.label(),
                engine_number: bill.vehicle.engine_number.clone(),
                chassis_number: bill.vehicle.chassis_number.clone(),
                base_price: bill.vehicle.base_price,
            },
            charges: charge_rows(bill, financials),
            terms: terms(bill, financials),
            footer: FooterBlock {
                signatures: vec!["Authorized officer", "Customer"],
                notice: "This invoice is system generated and forms part of the sale record.",
            },
        }
    }

    /// Encode the bill into document bytes in the requested format.
    pub fn render(
        &self,
        bill: &Bill,
        financials: &Breakdown,
        format: DocumentFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let document = self.document(bill, financials);
        self.composer.compose(&document, format)
    }
}

/// The financial table, row order fixed per channel.
///
/// An exempt vehicle's fee row is omitted entirely rather than printed as
/// zero; leasing prints the fee as a marker because the financier settles it.
fn charge_rows(bill: &Bill, financials: &Breakdown) -> Vec<ChargeRow> {
    let mut rows = Vec::new();

    match bill.channel {
        BillChannel::Advance => {
            match bill.settlement {
                Some(SettlementChannel::Leasing) => {
                    if let Some(down_payment) = financials.down_payment {
                        rows.push(ChargeRow::money("Down payment", down_payment));
                    }
                }
                _ => rows.push(ChargeRow::money("Vehicle price", financials.base_price)),
            }
            if let Some(advance) = financials.advance_amount {
                rows.push(ChargeRow::money("Advance received", advance));
            }
            rows.push(ChargeRow::money(
                "Balance due on delivery",
                financials.balance_amount,
            ));
            if let Some(date) = bill.estimated_delivery_date {
                rows.push(ChargeRow::date("Estimated delivery", date));
            }
        }
        BillChannel::Cash => {
            rows.push(ChargeRow::money("Vehicle price", financials.base_price));
            if let SurchargeTreatment::Collected(fee) = financials.surcharge {
                rows.push(ChargeRow::money("Registration fee", fee));
            }
        }
        BillChannel::Leasing => {
            if let Some(down_payment) = financials.down_payment {
                rows.push(ChargeRow::money("Down payment", down_payment));
            }
            if let SurchargeTreatment::Financed(_) = financials.surcharge {
                rows.push(ChargeRow::marker(
                    "Registration fee",
                    "settled by the financing company",
                ));
            }
        }
    }

    rows.push(ChargeRow::total(financials.total_amount));
    rows
}

/// Fixed boilerplate plus at most one channel-specific clause.
fn terms(bill: &Bill, financials: &Breakdown) -> Vec<String> {
    let mut clauses: Vec<String> = STANDARD_TERMS.iter().map(|s| s.to_string()).collect();

    match bill.channel {
        BillChannel::Advance => {
            if let Some(date) = bill.estimated_delivery_date {
                clauses.push(format!(
                    "The balance of {} is payable on delivery, expected by {}.",
                    composer::fmt_amount(financials.balance_amount),
                    date.format("%Y-%m-%d"),
                ));
            }
        }
        BillChannel::Leasing => {
            clauses.push(
                "The outstanding balance is settled directly by the financing company."
                    .to_string(),
            );
        }
        BillChannel::Cash => {
            // Exempt-class sales carry no registration obligations at all.
            if matches!(financials.surcharge, SurchargeTreatment::Collected(_)) {
                clauses.push(
                    "Registration of the vehicle will be completed once the registration fee is settled."
                        .to_string(),
                );
            }
        }
    }

    clauses
}
