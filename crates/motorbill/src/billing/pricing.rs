//! Single source of truth for bill totals.
//!
//! Every path that needs a surcharge, total, or balance goes through
//! [`PricingPolicy::breakdown`]. The exemption rule outranks everything:
//! an exempt vehicle pays no registration fee on any channel.

use rust_decimal::Decimal;

use super::domain::{Breakdown, SettlementChannel, SurchargeTreatment, VehicleSnapshot};
use crate::catalog::VehicleClass;
use crate::config::PricingConfig;

/// Payment inputs accompanying a draft, shaped per channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentTerms {
    Cash,
    Leasing {
        down_payment: Decimal,
    },
    Advance {
        settlement: SettlementChannel,
        down_payment: Option<Decimal>,
        advance_amount: Decimal,
    },
}

impl PaymentTerms {
    fn settles_by_leasing(&self) -> bool {
        matches!(
            self,
            PaymentTerms::Leasing { .. }
                | PaymentTerms::Advance {
                    settlement: SettlementChannel::Leasing,
                    ..
                }
        )
    }
}

/// Client-input failures from the pricing rules. Never retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("vehicle model '{model}' cannot be financed through leasing")]
    NotLeaseEligible { model: String },
    #[error("a positive down payment is required for leasing")]
    MissingDownPayment,
    #[error("advance bills require a settlement channel, a positive advance amount, and an estimated delivery date")]
    MissingAdvanceDetails,
    #[error("advance amount {advance} exceeds the bill total {total}")]
    NegativeBalance { total: Decimal, advance: Decimal },
}

/// Pure pricing rules parameterized by the configured registration fees.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    config: PricingConfig,
}

impl PricingPolicy {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Compute the financial breakdown for a vehicle under the given terms.
    pub fn breakdown(
        &self,
        vehicle: &VehicleSnapshot,
        terms: &PaymentTerms,
    ) -> Result<Breakdown, PolicyViolation> {
        if terms.settles_by_leasing() && !vehicle.lease_eligible {
            return Err(PolicyViolation::NotLeaseEligible {
                model: vehicle.model_name.clone(),
            });
        }

        let surcharge = self.surcharge_for(vehicle, terms);

        match terms {
            PaymentTerms::Cash => Ok(Breakdown {
                base_price: vehicle.base_price,
                surcharge,
                down_payment: None,
                advance_amount: None,
                total_amount: vehicle.base_price + surcharge.billed_amount(),
                balance_amount: Decimal::ZERO,
            }),
            PaymentTerms::Leasing { down_payment } => {
                let down_payment = positive_down_payment(*down_payment)?;
                Ok(Breakdown {
                    base_price: vehicle.base_price,
                    surcharge,
                    down_payment: Some(down_payment),
                    advance_amount: None,
                    // The customer-facing total is the down payment; the
                    // remainder is the financing company's concern.
                    total_amount: down_payment,
                    balance_amount: Decimal::ZERO,
                })
            }
            PaymentTerms::Advance {
                settlement,
                down_payment,
                advance_amount,
            } => {
                if *advance_amount <= Decimal::ZERO {
                    return Err(PolicyViolation::MissingAdvanceDetails);
                }
                let (down_payment, total_amount) = match settlement {
                    SettlementChannel::Cash => {
                        (None, vehicle.base_price + surcharge.billed_amount())
                    }
                    SettlementChannel::Leasing => {
                        let down = positive_down_payment(
                            down_payment.ok_or(PolicyViolation::MissingDownPayment)?,
                        )?;
                        (Some(down), down)
                    }
                };
                let balance_amount = total_amount - *advance_amount;
                if balance_amount < Decimal::ZERO {
                    return Err(PolicyViolation::NegativeBalance {
                        total: total_amount,
                        advance: *advance_amount,
                    });
                }
                Ok(Breakdown {
                    base_price: vehicle.base_price,
                    surcharge,
                    down_payment,
                    advance_amount: Some(*advance_amount),
                    total_amount,
                    balance_amount,
                })
            }
        }
    }

    fn surcharge_for(&self, vehicle: &VehicleSnapshot, terms: &PaymentTerms) -> SurchargeTreatment {
        if vehicle.vehicle_class == VehicleClass::Exempt {
            return SurchargeTreatment::Exempt;
        }
        if terms.settles_by_leasing() {
            SurchargeTreatment::Financed(self.config.lease_registration_fee)
        } else {
            SurchargeTreatment::Collected(self.config.cash_registration_fee)
        }
    }
}

fn positive_down_payment(value: Decimal) -> Result<Decimal, PolicyViolation> {
    if value <= Decimal::ZERO {
        return Err(PolicyViolation::MissingDownPayment);
    }
    Ok(value)
}
