use super::content::{InvoiceDocument, RowValue};
use super::{DocumentFormat, RenderError};
use rust_decimal::Decimal;

/// Page-layout collaborator: turns invoice content into encoded bytes.
///
/// The engine never places text or draws rules itself; a composer owns
/// fonts, pagination, and the physical encoding.
pub trait DocumentComposer: Send + Sync {
    fn compose(
        &self,
        document: &InvoiceDocument,
        format: DocumentFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Reference composer producing a stable line-oriented encoding.
///
/// Output is a pure function of the document content, which makes it the
/// fixture backend for audit-replay tests and the demo CLI. Production
/// deployments plug real PDF/DOCX engines in behind [`DocumentComposer`].
#[derive(Debug, Default, Clone)]
pub struct PlainComposer;

impl DocumentComposer for PlainComposer {
    fn compose(
        &self,
        document: &InvoiceDocument,
        format: DocumentFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let mut out = String::new();
        let push = |out: &mut String, line: String| {
            out.push_str(&line);
            out.push('\n');
        };

        push(&mut out, format!("%invoice format={}", format.label()));
        push(&mut out, format!("= {} =", document.header.issuer_name));
        push(&mut out, document.header.issuer_address.clone());
        push(&mut out, document.header.issuer_phone.clone());
        push(
            &mut out,
            format!(
                "Bill {} | {} | issued {}",
                document.header.bill_number,
                document.header.channel,
                document.header.issued_on.format("%Y-%m-%d")
            ),
        );

        push(&mut out, "-- customer --".to_string());
        push(&mut out, document.customer.name.clone());
        push(&mut out, format!("NIC: {}", document.customer.national_id));
        push(&mut out, document.customer.address.clone());

        push(&mut out, "-- vehicle --".to_string());
        push(
            &mut out,
            format!(
                "{} ({})",
                document.vehicle.model_name, document.vehicle.vehicle_class
            ),
        );
        push(
            &mut out,
            format!("Engine no: {}", document.vehicle.engine_number),
        );
        push(
            &mut out,
            format!("Chassis no: {}", document.vehicle.chassis_number),
        );

        push(&mut out, "-- charges --".to_string());
        for row in &document.charges {
            let value = match &row.value {
                RowValue::Money(amount) => fmt_amount(*amount),
                RowValue::Marker(note) => (*note).to_string(),
                RowValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            };
            let marker = if row.emphasis { "==" } else { "  " };
            push(&mut out, format!("{marker} {:<28} {value}", row.label));
        }

        push(&mut out, "-- terms --".to_string());
        for (index, clause) in document.terms.iter().enumerate() {
            push(&mut out, format!("{}. {clause}", index + 1));
        }

        push(&mut out, "-- signatures --".to_string());
        for line in &document.footer.signatures {
            push(&mut out, format!("____________________  {line}"));
        }
        push(&mut out, document.footer.notice.to_string());

        Ok(out.into_bytes())
    }
}

/// Format a monetary value with thousands separators: 113000 -> "113,000.00".
pub(crate) fn fmt_amount(value: Decimal) -> String {
    let text = format!("{:.2}", value.round_dp(2));
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text.as_str(), "00"),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).expect("ascii digits"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{sign}{grouped}.{frac_part}")
}
