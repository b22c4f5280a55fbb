//! Invoice normalization: turns the comma-delimited line item strings of a
//! FreshBooks export into the totals, quantities and tax codes QuickBooks
//! expects.
//!
//! Every step is a pure function of its arguments. Amounts are exact
//! rationals and are rounded to cents at each step, in the same order the
//! upstream accounting flow applies them: discount first, then tax.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::TaxCodes;
use crate::error::MalformedInputError;
use crate::money::{self, Money, ParseMoneyError};
use crate::request::{
    INVOICE_AMOUNT, INVOICE_DISCOUNT_PERCENTAGE, INVOICE_LINE_AMOUNTS,
    INVOICE_LINE_QUANTITIES, INVOICE_LINE_TAX1_PERCENTAGES, INVOICE_LINE_TAX2_PERCENTAGES,
};

/// One invoice as received: parallel per-line sequences plus invoice-level
/// values, all still as the literal strings of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLineInput {
    pub line_amounts_as_string: String,
    pub line_amounts: Vec<String>,
    pub line_quantities: Vec<String>,
    pub line_tax1_percentages: Vec<String>,
    pub line_tax2_percentages: Vec<String>,
    pub discount_percentage: String,
    pub invoice_amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub subtotal: Money,
    pub discount_total: Money,
    pub taxable_total: Money,
    pub tax_amount: Money,
    pub line_quantities_decimal: Vec<String>,
    /// Always finite, and non-zero exactly when the exact sum is.
    pub line_combined_tax_percentages: Vec<f64>,
    pub line_taxable_status: Vec<TaxableStatus>,
    pub tax_code: i64,
}

/// QuickBooks line-level tax flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaxableStatus {
    #[serde(rename = "TAX")]
    Taxable,
    #[serde(rename = "NON")]
    NonTaxable,
}

impl TaxableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxableStatus::Taxable => "TAX",
            TaxableStatus::NonTaxable => "NON",
        }
    }
}

impl fmt::Display for TaxableStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn normalize(
    input: &InvoiceLineInput,
    tax_codes: &TaxCodes,
) -> Result<InvoiceSummary, MalformedInputError> {
    let lines = input.line_amounts.len();
    ensure_line_count(INVOICE_LINE_QUANTITIES, &input.line_quantities, lines)?;
    ensure_line_count(INVOICE_LINE_TAX1_PERCENTAGES, &input.line_tax1_percentages, lines)?;
    ensure_line_count(INVOICE_LINE_TAX2_PERCENTAGES, &input.line_tax2_percentages, lines)?;

    let subtotal = sum_line_amounts(&input.line_amounts)?;
    let discount_percentage =
        parse_value(INVOICE_DISCOUNT_PERCENTAGE, 0, &input.discount_percentage)?;
    let invoice_amount = parse_value(INVOICE_AMOUNT, 0, &input.invoice_amount)?;

    let discount_total = compute_discount_total(&subtotal, &discount_percentage);
    let taxable_total = compute_taxable_total(&subtotal, &discount_total);
    let tax_amount = compute_tax_amount(&invoice_amount, &taxable_total);

    let line_quantities_decimal = parse_values(INVOICE_LINE_QUANTITIES, &input.line_quantities)?
        .iter()
        .map(money::to_two_decimal_string)
        .collect();

    let line_combined_tax_percentages =
        combine_tax_percentages(&input.line_tax1_percentages, &input.line_tax2_percentages)?;
    let line_taxable_status = classify_taxable_status(&line_combined_tax_percentages);
    let tax_code = select_tax_code(&line_taxable_status, tax_codes);

    debug!(
        lines,
        subtotal = %money::to_two_decimal_string(&subtotal),
        taxable_total = %money::to_two_decimal_string(&taxable_total),
        tax_amount = %money::to_two_decimal_string(&tax_amount),
        tax_code,
        "normalized invoice"
    );

    Ok(InvoiceSummary {
        subtotal,
        discount_total,
        taxable_total,
        tax_amount,
        line_quantities_decimal,
        line_combined_tax_percentages,
        line_taxable_status,
        tax_code,
    })
}

/// Splits on commas, keeping every component verbatim (including empty ones).
pub fn parse_decimal_list(csv: &str) -> Vec<String> {
    csv.split(',').map(str::to_owned).collect()
}

pub fn sum_line_amounts(amounts: &[String]) -> Result<Money, MalformedInputError> {
    let total = parse_values(INVOICE_LINE_AMOUNTS, amounts)?
        .into_iter()
        .fold(money::zero(), |total, amount| total + amount);
    Ok(money::round_to_cents(&total))
}

pub fn compute_discount_total(subtotal: &Money, discount_percentage: &Money) -> Money {
    money::round_to_cents(&(subtotal * (discount_percentage / money::from(100))))
}

pub fn compute_taxable_total(subtotal: &Money, discount_total: &Money) -> Money {
    money::round_to_cents(&(subtotal - discount_total))
}

/// Tax is whatever the upstream invoice total holds beyond the taxable total.
pub fn compute_tax_amount(invoice_amount: &Money, taxable_total: &Money) -> Money {
    money::round_to_cents(&(invoice_amount - taxable_total))
}

/// Sums are exact; a sum that has no faithful `f64` form is rejected, naming
/// the first token that cannot be represented on its own (or the second
/// token when only the sum overflows).
pub fn combine_tax_percentages(
    tax1: &[String],
    tax2: &[String],
) -> Result<Vec<f64>, MalformedInputError> {
    ensure_line_count(INVOICE_LINE_TAX2_PERCENTAGES, tax2, tax1.len())?;
    tax1.iter()
        .zip(tax2)
        .enumerate()
        .map(|(index, (raw1, raw2))| {
            let first = parse_value(INVOICE_LINE_TAX1_PERCENTAGES, index, raw1)?;
            let second = parse_value(INVOICE_LINE_TAX2_PERCENTAGES, index, raw2)?;
            if let Some(combined) = money::to_f64(&(&first + &second)) {
                return Ok(combined);
            }
            let (field, token) = if money::to_f64(&first).is_none() {
                (INVOICE_LINE_TAX1_PERCENTAGES, raw1)
            } else {
                (INVOICE_LINE_TAX2_PERCENTAGES, raw2)
            };
            Err(MalformedInputError::InvalidNumber {
                field,
                index,
                token: token.clone(),
                source: ParseMoneyError::NotRepresentable(token.trim().to_owned()),
            })
        })
        .collect()
}

pub fn classify_taxable_status(combined_percentages: &[f64]) -> Vec<TaxableStatus> {
    combined_percentages
        .iter()
        .map(|percentage| {
            if *percentage > 0.0 {
                TaxableStatus::Taxable
            } else {
                TaxableStatus::NonTaxable
            }
        })
        .collect()
}

pub fn select_tax_code(statuses: &[TaxableStatus], tax_codes: &TaxCodes) -> i64 {
    if statuses.contains(&TaxableStatus::Taxable) {
        tax_codes.taxable_code
    } else {
        tax_codes.non_taxable_code
    }
}

fn ensure_line_count(
    field: &'static str,
    values: &[String],
    expected: usize,
) -> Result<(), MalformedInputError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(MalformedInputError::LengthMismatch {
            field,
            expected,
            actual: values.len(),
        })
    }
}

fn parse_values(
    field: &'static str,
    tokens: &[String],
) -> Result<Vec<Money>, MalformedInputError> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| parse_value(field, index, token))
        .collect()
}

fn parse_value(
    field: &'static str,
    index: usize,
    token: &str,
) -> Result<Money, MalformedInputError> {
    money::parse(token).map_err(|source| MalformedInputError::InvalidNumber {
        field,
        index,
        token: token.to_owned(),
        source,
    })
}
