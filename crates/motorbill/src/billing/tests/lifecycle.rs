use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::common::*;
use crate::billing::domain::{BillChannel, BillStatus, SettlementChannel, SurchargeTreatment};
use crate::billing::lifecycle::{BillingError, BillingService, ConversionDirective};
use crate::billing::pricing::PolicyViolation;
use crate::billing::repository::{BillRepository, RepositoryError};
use crate::catalog::CatalogError;
use crate::catalog::VehicleCatalog;
use crate::config::PricingConfig;

#[test]
fn cash_bills_are_created_completed_with_the_fee_collected() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(cash_draft("Falcon 125"))
        .expect("draft is valid");

    assert_eq!(bill.status, BillStatus::Completed);
    assert_eq!(bill.financials.total_amount, dec!(113000));
    assert_eq!(bill.financials.balance_amount, Decimal::ZERO);
    assert_eq!(
        bill.financials.surcharge,
        SurchargeTreatment::Collected(dec!(13000))
    );
}

#[test]
fn exempt_cash_bills_total_the_base_price_alone() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(cash_draft("E-Trike 48V"))
        .expect("draft is valid");

    assert_eq!(bill.financials.total_amount, dec!(50000));
    assert_eq!(bill.financials.surcharge, SurchargeTreatment::Exempt);
}

#[test]
fn leasing_bills_total_the_down_payment() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(leasing_draft("Falcon 125"))
        .expect("draft is valid");

    assert_eq!(bill.status, BillStatus::Completed);
    assert_eq!(bill.financials.total_amount, dec!(20000));
    assert_eq!(bill.financials.balance_amount, Decimal::ZERO);
}

#[test]
fn advance_bills_start_pending_and_track_the_balance() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.financials.total_amount, dec!(113000));
    assert_eq!(bill.financials.balance_amount, dec!(83000));
    assert_eq!(bill.estimated_delivery_date, Some(delivery_date()));
}

#[test]
fn advance_drafts_without_a_delivery_date_are_rejected() {
    let (service, _, _) = build_service();
    let mut draft = advance_cash_draft("Falcon 125");
    draft.estimated_delivery_date = None;

    let err = service.create_bill(draft).expect_err("incomplete advance");
    assert!(matches!(
        err,
        BillingError::Policy(PolicyViolation::MissingAdvanceDetails)
    ));
}

#[test]
fn unknown_models_surface_a_catalog_not_found() {
    let (service, _, _) = build_service();
    let err = service
        .create_bill(cash_draft("Phantom 250"))
        .expect_err("model is not cataloged");
    assert!(matches!(
        err,
        BillingError::Catalog(CatalogError::NotFound(_))
    ));
}

#[test]
fn blank_customer_details_are_rejected_before_pricing() {
    let (service, _, _) = build_service();
    let mut draft = cash_draft("Falcon 125");
    draft.customer.national_id = "  ".to_string();

    let err = service.create_bill(draft).expect_err("incomplete customer");
    assert!(matches!(err, BillingError::Draft(_)));
}

#[test]
fn converting_to_cash_settlement_produces_a_completed_successor() {
    let (service, repository, _) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let outcome = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect("conversion succeeds");

    assert_eq!(outcome.source.status, BillStatus::Converted);
    assert_eq!(outcome.successor.status, BillStatus::Completed);
    assert_eq!(outcome.successor.channel, BillChannel::Cash);
    assert_eq!(outcome.successor.financials.total_amount, dec!(113000));
    assert_eq!(outcome.successor.financials.balance_amount, Decimal::ZERO);
    assert_eq!(outcome.successor.original_bill_id, Some(source.id.clone()));

    let stored_source = repository
        .fetch(&source.id)
        .expect("store reachable")
        .expect("source still stored");
    assert_eq!(stored_source.status, BillStatus::Converted);

    let successor = repository
        .successor_of(&source.id)
        .expect("store reachable")
        .expect("successor exists");
    assert_eq!(successor.id, outcome.successor.id);
}

#[test]
fn converting_to_leasing_requires_a_down_payment() {
    let (service, _, _) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let err = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Leasing,
                down_payment: None,
                reprice: false,
            },
        )
        .expect_err("no down payment supplied");
    assert!(matches!(
        err,
        BillingError::Policy(PolicyViolation::MissingDownPayment)
    ));
}

#[test]
fn conversion_reuses_the_original_price_snapshot_by_default() {
    let (service, _, catalog) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let mut repriced = standard_model();
    repriced.base_price = dec!(120000);
    catalog.upsert(repriced).expect("price update is valid");

    let outcome = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect("conversion succeeds");

    assert_eq!(outcome.successor.vehicle.base_price, dec!(100000));
    assert_eq!(outcome.successor.financials.total_amount, dec!(113000));
}

#[test]
fn conversion_repricing_reads_the_current_catalog_price_on_request() {
    let (service, _, catalog) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let mut repriced = standard_model();
    repriced.base_price = dec!(120000);
    catalog.upsert(repriced).expect("price update is valid");

    let outcome = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: true,
            },
        )
        .expect("conversion succeeds");

    assert_eq!(outcome.successor.vehicle.base_price, dec!(120000));
    assert_eq!(outcome.successor.financials.total_amount, dec!(133000));
}

#[test]
fn non_advance_bills_cannot_be_converted() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(cash_draft("Falcon 125"))
        .expect("draft is valid");

    let err = service
        .convert_bill(
            &bill.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect_err("cash bills never convert");
    assert!(matches!(err, BillingError::NotAnAdvanceBill(_)));
}

#[test]
fn converted_bills_cannot_be_converted_again() {
    let (service, _, _) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");
    let directive = ConversionDirective {
        settlement: SettlementChannel::Cash,
        down_payment: None,
        reprice: false,
    };
    service
        .convert_bill(&source.id, directive.clone())
        .expect("first conversion succeeds");

    let err = service
        .convert_bill(&source.id, directive)
        .expect_err("already converted");
    assert!(matches!(
        err,
        BillingError::InvalidTransition {
            from: BillStatus::Converted,
            ..
        }
    ));
}

#[test]
fn advance_bills_cannot_be_completed_directly() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let err = service
        .complete_bill(&bill.id)
        .expect_err("advance settles through conversion");
    assert!(matches!(err, BillingError::AdvanceRequiresConversion(_)));
}

#[test]
fn cancelled_bills_accept_no_further_transitions() {
    let (service, _, _) = build_service();
    let bill = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");
    service.cancel_bill(&bill.id).expect("pending bills cancel");

    let err = service
        .convert_bill(
            &bill.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect_err("cancelled is terminal");
    assert!(matches!(
        err,
        BillingError::InvalidTransition {
            from: BillStatus::Cancelled,
            ..
        }
    ));
}

#[test]
fn a_failed_status_flip_rolls_the_successor_back() {
    let repository = Arc::new(StatusFlipFailsRepository::default());
    let catalog = Arc::new(catalog());
    let service = BillingService::new(
        repository.clone(),
        catalog,
        PricingConfig::default(),
    );

    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");

    let err = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect_err("status flip is rejected");
    assert!(matches!(
        err,
        BillingError::Repository(RepositoryError::Unavailable(_))
    ));

    let bills = repository.all().expect("store reachable");
    assert_eq!(bills.len(), 1, "the successor write was compensated");
    assert_eq!(bills[0].id, source.id);
    assert_eq!(bills[0].status, BillStatus::Pending);
    assert!(repository
        .successor_of(&source.id)
        .expect("store reachable")
        .is_none());
}

#[test]
fn deleting_a_converted_bill_is_blocked_by_its_successor() {
    let (service, _, _) = build_service();
    let source = service
        .create_bill(advance_cash_draft("Falcon 125"))
        .expect("draft is valid");
    let outcome = service
        .convert_bill(
            &source.id,
            ConversionDirective {
                settlement: SettlementChannel::Cash,
                down_payment: None,
                reprice: false,
            },
        )
        .expect("conversion succeeds");

    let err = service
        .delete_bill(&source.id)
        .expect_err("successor still references the source");
    assert!(matches!(err, BillingError::ReferentialConflict { .. }));

    service
        .delete_bill(&outcome.successor.id)
        .expect("the successor itself is unreferenced");
    service
        .delete_bill(&source.id)
        .expect("deletable once the successor is gone");
}

#[test]
fn catalog_models_cannot_be_removed_while_bills_reference_them() {
    let (service, _, _) = build_service();
    service
        .create_bill(cash_draft("Falcon 125"))
        .expect("draft is valid");

    let err = service
        .remove_model("Falcon 125")
        .expect_err("bills still reference the model");
    assert!(matches!(
        err,
        BillingError::Catalog(CatalogError::ModelInUse { bills: 1, .. })
    ));

    service
        .remove_model("E-Trike 48V")
        .expect("unreferenced models are removable");
}

#[test]
fn an_unavailable_store_is_surfaced_as_a_persistence_failure() {
    let repository = Arc::new(UnavailableRepository);
    let catalog = Arc::new(catalog());
    let service = BillingService::new(repository, catalog, PricingConfig::default());

    let err = service
        .create_bill(cash_draft("Falcon 125"))
        .expect_err("store is down");
    assert!(matches!(
        err,
        BillingError::Repository(RepositoryError::Unavailable(_))
    ));
}
