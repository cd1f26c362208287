//! Bill lifecycle: creation, completion, the one-way conversion of advance
//! bills, cancellation, and reference-guarded deletion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::domain::{
    Bill, BillChannel, BillDraft, BillId, BillStatus, DraftError, SettlementChannel,
    VehicleSnapshot,
};
use super::pricing::{PaymentTerms, PolicyViolation, PricingPolicy};
use super::reconciliation::{ReconciliationJob, ReconciliationSummary};
use super::render::{DocumentFormat, DocumentRenderer, RenderError};
use super::repository::{BillRepository, RepositoryError};
use crate::catalog::{CatalogError, VehicleCatalog};
use crate::config::PricingConfig;

static BILL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_bill_id() -> BillId {
    let id = BILL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BillId(format!("bill-{id:06}"))
}

/// Operator instructions for settling an advance bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionDirective {
    pub settlement: SettlementChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Decimal>,
    /// Re-read the catalog price instead of honoring the original snapshot.
    /// Off by default so the quoted price never changes under the customer.
    #[serde(default)]
    pub reprice: bool,
}

/// Both sides of a finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutcome {
    pub source: Bill,
    pub successor: Bill,
}

/// Lifecycle transitions, named for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Complete,
    Convert,
    Cancel,
}

impl Transition {
    pub const fn label(self) -> &'static str {
        match self {
            Transition::Complete => "complete",
            Transition::Convert => "convert",
            Transition::Cancel => "cancel",
        }
    }
}

/// Error raised by the billing service.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("bill '{0}' was not found")]
    BillNotFound(BillId),
    #[error("cannot {} a bill in status '{}'", .attempted.label(), .from.label())]
    InvalidTransition {
        attempted: Transition,
        from: BillStatus,
    },
    #[error("bill '{0}' is an advance bill and settles through conversion, not completion")]
    AdvanceRequiresConversion(BillId),
    #[error("bill '{0}' is not an advance bill and cannot be converted")]
    NotAnAdvanceBill(BillId),
    #[error("bill '{id}' is referenced by successor '{successor}' and cannot be deleted")]
    ReferentialConflict { id: BillId, successor: BillId },
}

/// Service composing the catalog, pricing policy, repository, and renderer.
pub struct BillingService<R, C> {
    repository: Arc<R>,
    catalog: Arc<C>,
    policy: PricingPolicy,
    renderer: DocumentRenderer,
}

impl<R, C> BillingService<R, C>
where
    R: BillRepository + 'static,
    C: VehicleCatalog + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<C>, config: PricingConfig) -> Self {
        Self::with_renderer(repository, catalog, config, DocumentRenderer::default())
    }

    pub fn with_renderer(
        repository: Arc<R>,
        catalog: Arc<C>,
        config: PricingConfig,
        renderer: DocumentRenderer,
    ) -> Self {
        Self {
            repository,
            catalog,
            policy: PricingPolicy::new(config),
            renderer,
        }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Raise a bill for a sale. Non-advance bills settle immediately and are
    /// created `Completed`; advance bills start `Pending` until converted.
    pub fn create_bill(&self, draft: BillDraft) -> Result<Bill, BillingError> {
        draft.validate()?;

        let model = self.catalog.find_by_name(&draft.model_name)?;
        let vehicle = VehicleSnapshot::capture(
            &model,
            draft.engine_number.clone(),
            draft.chassis_number.clone(),
        );
        let terms = payment_terms(&draft)?;
        let financials = self.policy.breakdown(&vehicle, &terms)?;

        let status = match draft.channel {
            BillChannel::Advance => BillStatus::Pending,
            BillChannel::Cash | BillChannel::Leasing => BillStatus::Completed,
        };
        let settlement = match draft.channel {
            BillChannel::Advance => draft.settlement,
            BillChannel::Cash | BillChannel::Leasing => None,
        };

        let bill = Bill {
            id: next_bill_id(),
            channel: draft.channel,
            settlement,
            customer: draft.customer,
            vehicle,
            financials,
            status,
            original_bill_id: None,
            estimated_delivery_date: draft.estimated_delivery_date,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(bill)?;
        info!(bill = %stored.id, channel = stored.channel.label(), total = %stored.financials.total_amount, "bill created");
        Ok(stored)
    }

    /// Move a pending non-advance bill to `Completed`.
    pub fn complete_bill(&self, id: &BillId) -> Result<Bill, BillingError> {
        let mut bill = self.fetch_bill(id)?;
        if bill.channel == BillChannel::Advance {
            return Err(BillingError::AdvanceRequiresConversion(bill.id));
        }
        if bill.status != BillStatus::Pending {
            return Err(BillingError::InvalidTransition {
                attempted: Transition::Complete,
                from: bill.status,
            });
        }
        self.repository
            .update_status(&bill.id, BillStatus::Completed)?;
        bill.status = BillStatus::Completed;
        Ok(bill)
    }

    /// Settle an advance bill: create the final bill on the chosen channel
    /// and retire the source. The two writes are all-or-nothing; a failure
    /// flipping the source compensates by removing the successor.
    pub fn convert_bill(
        &self,
        id: &BillId,
        directive: ConversionDirective,
    ) -> Result<ConversionOutcome, BillingError> {
        let mut source = self.fetch_bill(id)?;
        if source.channel != BillChannel::Advance {
            return Err(BillingError::NotAnAdvanceBill(source.id));
        }
        if source.status != BillStatus::Pending {
            return Err(BillingError::InvalidTransition {
                attempted: Transition::Convert,
                from: source.status,
            });
        }

        let vehicle = if directive.reprice {
            let model = self.catalog.find_by_name(&source.vehicle.model_name)?;
            source.vehicle.repriced(model.base_price)
        } else {
            source.vehicle.clone()
        };

        let terms = match directive.settlement {
            SettlementChannel::Cash => PaymentTerms::Cash,
            SettlementChannel::Leasing => PaymentTerms::Leasing {
                down_payment: directive
                    .down_payment
                    .ok_or(PolicyViolation::MissingDownPayment)?,
            },
        };
        let financials = self.policy.breakdown(&vehicle, &terms)?;

        let successor = Bill {
            id: next_bill_id(),
            channel: directive.settlement.as_bill_channel(),
            settlement: None,
            customer: source.customer.clone(),
            vehicle,
            financials,
            status: BillStatus::Completed,
            original_bill_id: Some(source.id.clone()),
            estimated_delivery_date: None,
            created_at: Utc::now(),
        };

        let successor = self.repository.insert(successor)?;
        if let Err(failure) = self
            .repository
            .update_status(&source.id, BillStatus::Converted)
        {
            if let Err(compensation) = self.repository.delete(&successor.id) {
                error!(
                    source = %source.id,
                    successor = %successor.id,
                    %failure,
                    %compensation,
                    "conversion rollback failed; successor may be orphaned"
                );
            }
            return Err(failure.into());
        }

        source.status = BillStatus::Converted;
        info!(source = %source.id, successor = %successor.id, settlement = directive.settlement.label(), "advance bill converted");
        Ok(ConversionOutcome { source, successor })
    }

    /// Manual override: abandon a pending bill without recomputation.
    pub fn cancel_bill(&self, id: &BillId) -> Result<Bill, BillingError> {
        let mut bill = self.fetch_bill(id)?;
        if bill.status != BillStatus::Pending {
            return Err(BillingError::InvalidTransition {
                attempted: Transition::Cancel,
                from: bill.status,
            });
        }
        self.repository
            .update_status(&bill.id, BillStatus::Cancelled)?;
        bill.status = BillStatus::Cancelled;
        Ok(bill)
    }

    /// Remove a bill, refusing while a successor still references it.
    pub fn delete_bill(&self, id: &BillId) -> Result<(), BillingError> {
        let bill = self.fetch_bill(id)?;
        if let Some(successor) = self.repository.successor_of(&bill.id)? {
            return Err(BillingError::ReferentialConflict {
                id: bill.id,
                successor: successor.id,
            });
        }
        self.repository.delete(&bill.id)?;
        Ok(())
    }

    pub fn get_bill(&self, id: &BillId) -> Result<Bill, BillingError> {
        self.fetch_bill(id)
    }

    pub fn list_bills(&self) -> Result<Vec<Bill>, BillingError> {
        Ok(self.repository.all()?)
    }

    /// Remove a catalog model, refusing while issued bills still carry it.
    pub fn remove_model(&self, name: &str) -> Result<(), BillingError> {
        let referencing = self
            .repository
            .all()?
            .iter()
            .filter(|bill| bill.vehicle.model_name == name)
            .count();
        if referencing > 0 {
            return Err(CatalogError::ModelInUse {
                model: name.to_string(),
                bills: referencing,
            }
            .into());
        }
        self.catalog.remove(name)?;
        Ok(())
    }

    /// Render the stored bill into document bytes.
    pub fn render_document(
        &self,
        id: &BillId,
        format: DocumentFormat,
    ) -> Result<Vec<u8>, BillingError> {
        let bill = self.fetch_bill(id)?;
        let bytes = self.renderer.render(&bill, &bill.financials, format)?;
        Ok(bytes)
    }

    /// Run the consistency sweep over the whole store.
    pub fn reconcile(&self) -> Result<ReconciliationSummary, BillingError> {
        let job = ReconciliationJob::new(self.policy.clone());
        Ok(job.reconcile(self.repository.as_ref())?)
    }

    fn fetch_bill(&self, id: &BillId) -> Result<Bill, BillingError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| BillingError::BillNotFound(id.clone()))
    }
}

fn payment_terms(draft: &BillDraft) -> Result<PaymentTerms, PolicyViolation> {
    match draft.channel {
        BillChannel::Cash => Ok(PaymentTerms::Cash),
        BillChannel::Leasing => Ok(PaymentTerms::Leasing {
            down_payment: draft
                .down_payment
                .ok_or(PolicyViolation::MissingDownPayment)?,
        }),
        BillChannel::Advance => {
            let settlement = draft
                .settlement
                .ok_or(PolicyViolation::MissingAdvanceDetails)?;
            let advance_amount = draft
                .advance_amount
                .ok_or(PolicyViolation::MissingAdvanceDetails)?;
            if draft.estimated_delivery_date.is_none() {
                return Err(PolicyViolation::MissingAdvanceDetails);
            }
            Ok(PaymentTerms::Advance {
                settlement,
                down_payment: draft.down_payment,
                advance_amount,
            })
        }
    }
}
