//! Layout-free invoice content handed to a page composer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDocument {
    pub header: HeaderBlock,
    pub customer: CustomerBlock,
    pub vehicle: VehicleBlock,
    pub charges: Vec<ChargeRow>,
    pub terms: Vec<String>,
    pub footer: FooterBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderBlock {
    pub issuer_name: String,
    pub issuer_address: String,
    pub issuer_phone: String,
    pub bill_number: String,
    pub channel: &'static str,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerBlock {
    pub name: String,
    pub national_id: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleBlock {
    pub model_name: String,
    pub vehicle_class: &'static str,
    pub engine_number: String,
    pub chassis_number: String,
    pub base_price: Decimal,
}

/// One line of the financial table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRow {
    pub label: &'static str,
    pub value: RowValue,
    pub emphasis: bool,
}

impl ChargeRow {
    pub fn money(label: &'static str, amount: Decimal) -> Self {
        Self {
            label,
            value: RowValue::Money(amount),
            emphasis: false,
        }
    }

    pub fn total(amount: Decimal) -> Self {
        Self {
            label: "Total",
            value: RowValue::Money(amount),
            emphasis: true,
        }
    }

    pub fn marker(label: &'static str, note: &'static str) -> Self {
        Self {
            label,
            value: RowValue::Marker(note),
            emphasis: false,
        }
    }

    pub fn date(label: &'static str, date: NaiveDate) -> Self {
        Self {
            label,
            value: RowValue::Date(date),
            emphasis: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowValue {
    Money(Decimal),
    Marker(&'static str),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FooterBlock {
    pub signatures: Vec<&'static str>,
    pub notice: &'static str,
}
