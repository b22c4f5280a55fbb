use serde::Serialize;
use serde_json::Value;

use crate::config::TaxCodes;
use crate::error::MalformedInputError;
use crate::money;
use crate::normalizer::{normalize, InvoiceLineInput, InvoiceSummary, TaxableStatus};
use crate::request::Fields;

/// Largest integer every `f64` below it represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// The record handed back to the caller, keyed the way the downstream
/// QuickBooks step reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedInvoice {
    pub invoice_line_amounts_as_string: String,
    pub invoice_line_amounts: Vec<String>,
    pub invoice_sub_total: String,
    pub invoice_discount_total: String,
    pub taxable_total: String,
    pub tax_amount: String,
    pub invoice_line_quantities: Vec<String>,
    pub invoice_line_quantities_as_decimals: Vec<String>,
    pub invoice_line_tax1_percentages: Vec<String>,
    pub invoice_line_tax2_percentages: Vec<String>,
    pub invoice_line_combined_tax_percentages: Vec<Value>,
    pub invoice_line_taxable_status: Vec<TaxableStatus>,
    pub quickbooks_tax_code: i64,
}

impl SanitizedInvoice {
    pub fn new(input: &InvoiceLineInput, summary: &InvoiceSummary) -> Self {
        SanitizedInvoice {
            invoice_line_amounts_as_string: input.line_amounts_as_string.clone(),
            invoice_line_amounts: input.line_amounts.clone(),
            invoice_sub_total: money::to_two_decimal_string(&summary.subtotal),
            invoice_discount_total: money::to_two_decimal_string(&summary.discount_total),
            taxable_total: money::to_two_decimal_string(&summary.taxable_total),
            tax_amount: money::to_two_decimal_string(&summary.tax_amount),
            invoice_line_quantities: input.line_quantities.clone(),
            invoice_line_quantities_as_decimals: summary.line_quantities_decimal.clone(),
            invoice_line_tax1_percentages: input.line_tax1_percentages.clone(),
            invoice_line_tax2_percentages: input.line_tax2_percentages.clone(),
            invoice_line_combined_tax_percentages: summary
                .line_combined_tax_percentages
                .iter()
                .map(|percentage| percentage_to_json(*percentage))
                .collect(),
            invoice_line_taxable_status: summary.line_taxable_status.clone(),
            quickbooks_tax_code: summary.tax_code,
        }
    }
}

/// Normalizes one request's fields into the single-record response body.
pub fn sanitize(
    fields: &Fields,
    tax_codes: &TaxCodes,
) -> Result<Vec<SanitizedInvoice>, MalformedInputError> {
    let input = InvoiceLineInput::from_fields(fields)?;
    let summary = normalize(&input, tax_codes)?;
    Ok(vec![SanitizedInvoice::new(&input, &summary)])
}

// Integral percentages stay JSON integers, so `5` is not rendered as `5.0`.
fn percentage_to_json(percentage: f64) -> Value {
    if percentage.fract() == 0.0 && percentage.abs() < MAX_SAFE_INTEGER {
        Value::from(percentage as i64)
    } else {
        Value::from(percentage)
    }
}
