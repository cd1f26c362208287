//! Bill pricing, lifecycle, reconciliation, and invoice rendering.
//!
//! The modules compose leaf-first: `pricing` is pure and owns every total,
//! `lifecycle` drives state transitions through a repository, and `render`
//! turns stored bills into documents through a composer collaborator.

pub mod domain;
pub mod lifecycle;
pub mod pricing;
pub mod reconciliation;
pub mod render;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    Bill, BillChannel, BillDraft, BillId, BillStatus, Breakdown, CustomerDetails, DraftError,
    SettlementChannel, SurchargeTreatment, VehicleSnapshot,
};
pub use lifecycle::{
    BillingError, BillingService, ConversionDirective, ConversionOutcome, Transition,
};
pub use pricing::{PaymentTerms, PolicyViolation, PricingPolicy};
pub use reconciliation::{ReconciliationJob, ReconciliationSummary};
pub use render::{
    DocumentComposer, DocumentFormat, DocumentRenderer, InvoiceDocument, IssuerIdentity,
    PlainComposer, RenderError,
};
pub use repository::{BillRepository, InMemoryBillRepository, RepositoryError};
pub use router::{billing_router, BillView};
