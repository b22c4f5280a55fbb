//! Request boundary: decodes a POSTed body into a flat field map and picks
//! the invoice fields out of it.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::error::MalformedInputError;
use crate::normalizer::{parse_decimal_list, InvoiceLineInput};

pub const INVOICE_LINE_AMOUNTS: &str = "invoiceLineAmountsAsString";
pub const INVOICE_DISCOUNT_PERCENTAGE: &str = "invoiceDiscountPercentage";
pub const INVOICE_AMOUNT: &str = "invoiceAmount";
pub const INVOICE_LINE_QUANTITIES: &str = "invoiceLineQuantitiesAsString";
pub const INVOICE_LINE_TAX1_PERCENTAGES: &str = "invoiceLineTax1PercentagesAsString";
pub const INVOICE_LINE_TAX2_PERCENTAGES: &str = "invoiceLineTax2PercentagesAsString";

pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON body must be an object")]
    NotAnObject,
    #[error("field `{0}` must be a string, number or boolean")]
    UnsupportedValue(String),
}

/// `application/x-www-form-urlencoded`; the last of repeated keys wins.
pub fn parse_form_body(body: &[u8]) -> Fields {
    form_urlencoded::parse(body).into_owned().collect()
}

pub fn parse_json_body(body: &[u8]) -> Result<Fields, BodyError> {
    let object = match serde_json::from_slice(body)? {
        Value::Object(object) => object,
        _ => return Err(BodyError::NotAnObject),
    };
    object
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(BodyError::UnsupportedValue(key)),
            };
            Ok((key, text))
        })
        .collect()
}

/// JSON for `application/json` (any parameters ignored), form decoding for
/// everything else.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Fields, BodyError> {
    let is_json = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if is_json {
        parse_json_body(body)
    } else {
        Ok(parse_form_body(body))
    }
}

impl InvoiceLineInput {
    pub fn from_fields(fields: &Fields) -> Result<Self, MalformedInputError> {
        let required = |field: &'static str| {
            fields
                .get(field)
                .map(String::as_str)
                .ok_or(MalformedInputError::MissingField { field })
        };

        let line_amounts_as_string = required(INVOICE_LINE_AMOUNTS)?;
        Ok(InvoiceLineInput {
            line_amounts_as_string: line_amounts_as_string.to_owned(),
            line_amounts: parse_decimal_list(line_amounts_as_string),
            line_quantities: parse_decimal_list(required(INVOICE_LINE_QUANTITIES)?),
            line_tax1_percentages: parse_decimal_list(required(INVOICE_LINE_TAX1_PERCENTAGES)?),
            line_tax2_percentages: parse_decimal_list(required(INVOICE_LINE_TAX2_PERCENTAGES)?),
            discount_percentage: required(INVOICE_DISCOUNT_PERCENTAGE)?.to_owned(),
            invoice_amount: required(INVOICE_AMOUNT)?.to_owned(),
        })
    }
}
