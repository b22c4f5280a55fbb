//! Deployment configuration, read from the environment.

use std::env;

use thiserror::Error;

pub const TAXABLE_CODE_VAR: &str = "QUICKBOOKS_TAXABLE_CODE";
pub const NON_TAXABLE_CODE_VAR: &str = "QUICKBOOKS_NON_TAXABLE_CODE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// QuickBooks tax codes: one for invoices with any taxable line, one for
/// invoices without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxCodes {
    pub taxable_code: i64,
    pub non_taxable_code: i64,
}

impl Default for TaxCodes {
    /// Ohio + Medina sales tax (QuickBooks id 16), or no tax (0).
    fn default() -> Self {
        TaxCodes {
            taxable_code: 16,
            non_taxable_code: 0,
        }
    }
}

impl TaxCodes {
    pub fn new(taxable_code: i64, non_taxable_code: i64) -> Self {
        TaxCodes {
            taxable_code,
            non_taxable_code,
        }
    }

    /// Unset or blank variables keep the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TaxCodes::default();
        let read = |key: &'static str, default: i64| -> Result<i64, ConfigError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue { key, value })
                }
                _ => Ok(default),
            }
        };
        Ok(TaxCodes {
            taxable_code: read(TAXABLE_CODE_VAR, defaults.taxable_code)?,
            non_taxable_code: read(NON_TAXABLE_CODE_VAR, defaults.non_taxable_code)?,
        })
    }
}
