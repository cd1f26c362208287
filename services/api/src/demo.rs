use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use rust_decimal_macros::dec;

use motorbill::billing::{
    BillChannel, BillDraft, BillRepository, ConversionDirective, CustomerDetails, DocumentFormat,
    SettlementChannel, SurchargeTreatment,
};
use motorbill::config::PricingConfig;
use motorbill::error::AppError;

use crate::infra::{build_showroom_service, parse_date};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Render the sample invoice as DOCX instead of PDF
    #[arg(long)]
    pub(crate) docx: bool,
    /// Estimated delivery date for the advance sale (YYYY-MM-DD, defaults to 30 days out)
    #[arg(long, value_parser = parse_date)]
    pub(crate) delivery_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReconcileArgs {
    /// Number of drifted legacy records to seed before the sweep
    #[arg(long, default_value_t = 1)]
    pub(crate) drifted: usize,
}

fn walk_in_customer(name: &str, national_id: &str) -> CustomerDetails {
    CustomerDetails {
        name: name.to_string(),
        national_id: national_id.to_string(),
        address: "72 Temple Lane, Kandy".to_string(),
    }
}

fn draft(channel: BillChannel, model_name: &str, serial_suffix: &str) -> BillDraft {
    BillDraft {
        channel,
        settlement: None,
        customer: walk_in_customer("N. Wijesinghe", "851234567V"),
        model_name: model_name.to_string(),
        engine_number: format!("EN-{serial_suffix}"),
        chassis_number: format!("CH-{serial_suffix}"),
        down_payment: None,
        advance_amount: None,
        estimated_delivery_date: None,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let (service, _repository) = build_showroom_service(PricingConfig::default());
    let format = if args.docx {
        DocumentFormat::Docx
    } else {
        DocumentFormat::Pdf
    };
    let delivery_date = args
        .delivery_date
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(30));

    println!("== Cash sale, standard class ==");
    let cash = service.create_bill(draft(BillChannel::Cash, "Falcon 125", "77120"))?;
    println!(
        "{} | {} | total {} (fee collected: {})",
        cash.id,
        cash.status.label(),
        cash.financials.total_amount,
        cash.financials.surcharge.billed_amount(),
    );

    println!("\n== Cash sale, registration-exempt class ==");
    let exempt = service.create_bill(draft(BillChannel::Cash, "E-Trike 48V", "20018"))?;
    println!(
        "{} | {} | total {} (no registration fee)",
        exempt.id,
        exempt.status.label(),
        exempt.financials.total_amount,
    );

    println!("\n== Leasing sale ==");
    let mut leasing = draft(BillChannel::Leasing, "Metro 110", "41207");
    leasing.customer = walk_in_customer("S. Perera", "927654321V");
    leasing.down_payment = Some(dec!(90000));
    let leased = service.create_bill(leasing)?;
    println!(
        "{} | {} | customer total {} (registration fee {} settled by the financier)",
        leased.id,
        leased.status.label(),
        leased.financials.total_amount,
        leased.financials.surcharge.recorded_amount(),
    );

    println!("\n== Advance sale settling to cash ==");
    let mut advance = draft(BillChannel::Advance, "Falcon 125", "88340");
    advance.customer = walk_in_customer("K. Jayasuriya", "880011223V");
    advance.settlement = Some(SettlementChannel::Cash);
    advance.advance_amount = Some(dec!(150000));
    advance.estimated_delivery_date = Some(delivery_date);
    let advance = service.create_bill(advance)?;
    println!(
        "{} | {} | total {} | balance {} | delivery {}",
        advance.id,
        advance.status.label(),
        advance.financials.total_amount,
        advance.financials.balance_amount,
        delivery_date,
    );

    let outcome = service.convert_bill(
        &advance.id,
        ConversionDirective {
            settlement: SettlementChannel::Cash,
            down_payment: None,
            reprice: false,
        },
    )?;
    println!(
        "converted: {} -> {} | successor total {}",
        outcome.source.id, outcome.successor.id, outcome.successor.financials.total_amount,
    );

    println!(
        "\n== Rendered invoice for {} ({}) ==",
        outcome.successor.id,
        format.label()
    );
    let bytes = service.render_document(&outcome.successor.id, format)?;
    println!("{}", String::from_utf8_lossy(&bytes));

    let summary = service.reconcile()?;
    println!(
        "consistency sweep: inspected {} corrected {} failed {}",
        summary.inspected, summary.corrected, summary.failed,
    );

    Ok(())
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let (service, repository) = build_showroom_service(PricingConfig::default());

    // Seed legacy records the way drifted data actually looked: exempt
    // vehicles billed before the exemption flag existed, fee still baked in.
    for index in 0..args.drifted {
        let bill = service.create_bill(draft(
            BillChannel::Cash,
            "E-Trike 48V",
            &format!("5{index:04}"),
        ))?;
        let mut drifted = bill.clone();
        drifted.financials.surcharge = SurchargeTreatment::Collected(dec!(13000));
        drifted.financials.total_amount = drifted.financials.base_price + dec!(13000);
        repository
            .update(drifted)
            .map_err(motorbill::billing::BillingError::from)?;
    }
    service.create_bill(draft(BillChannel::Cash, "Falcon 125", "99021"))?;

    let first = service.reconcile()?;
    println!(
        "first sweep: inspected {} corrected {} failed {}",
        first.inspected, first.corrected, first.failed,
    );

    let second = service.reconcile()?;
    println!(
        "second sweep: inspected {} corrected {} failed {} (idempotent)",
        second.inspected, second.corrected, second.failed,
    );

    Ok(())
}
