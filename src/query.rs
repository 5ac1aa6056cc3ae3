//! Prepare → Approve hand-off carried in the navigation query string.

use crate::recipients::{RecipientEntry, ValidationResult};
use anyhow::{Context, Result};
use url::form_urlencoded;

const VALID_PARAM: &str = "validAddresses";
const INVALID_PARAM: &str = "invalidAddresses";
const TOKEN_PARAM: &str = "selectedToken";

/// Data carried from the Prepare page to the Approve page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproveQuery {
    pub valid: Vec<RecipientEntry>,
    pub invalid: Vec<RecipientEntry>,
    pub selected_token: String,
}

impl ApproveQuery {
    pub fn new(result: &ValidationResult, selected_token: impl Into<String>) -> Self {
        Self {
            valid: result.valid.clone(),
            invalid: result.invalid.clone(),
            selected_token: selected_token.into(),
        }
    }

    pub fn validation(&self) -> ValidationResult {
        ValidationResult {
            valid: self.valid.clone(),
            invalid: self.invalid.clone(),
        }
    }

    /// Encode as `validAddresses=[..]&invalidAddresses=[..]&selectedToken=..`
    pub fn to_query_string(&self) -> Result<String> {
        let valid = serde_json::to_string(&self.valid)?;
        let invalid = serde_json::to_string(&self.invalid)?;
        Ok(form_urlencoded::Serializer::new(String::new())
            .append_pair(VALID_PARAM, &valid)
            .append_pair(INVALID_PARAM, &invalid)
            .append_pair(TOKEN_PARAM, &self.selected_token)
            .finish())
    }

    /// Decode a query string; absent parameters decode as empty
    pub fn from_query_string(query: &str) -> Result<Self> {
        let mut parsed = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                VALID_PARAM if !value.is_empty() => {
                    parsed.valid = serde_json::from_str(&value).context("Malformed validAddresses parameter")?;
                }
                INVALID_PARAM if !value.is_empty() => {
                    parsed.invalid =
                        serde_json::from_str(&value).context("Malformed invalidAddresses parameter")?;
                }
                TOKEN_PARAM => parsed.selected_token = value.into_owned(),
                _ => {}
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipients::validate_csv;

    #[test]
    fn test_query_carries_lists_and_token() {
        let result = validate_csv("0x1111111111111111111111111111111111111111, 1.5\n\nbad, 2");
        let query = ApproveQuery::new(&result, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let encoded = query.to_query_string().unwrap();

        assert!(encoded.starts_with("validAddresses="));
        assert!(encoded.contains("&selectedToken=0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));

        let decoded = ApproveQuery::from_query_string(&format!("?{encoded}")).unwrap();
        assert_eq!(decoded, query);
        assert_eq!(decoded.validation(), result);
    }

    #[test]
    fn test_blank_entry_omits_amount_in_json() {
        let query = ApproveQuery::new(&validate_csv(""), "");
        let encoded = query.to_query_string().unwrap();
        let pairs: Vec<(String, String)> = form_urlencoded::parse(encoded.as_bytes()).into_owned().collect();
        assert_eq!(pairs[1], (INVALID_PARAM.to_string(), r#"[{"address":""}]"#.to_string()));
    }

    #[test]
    fn test_missing_params_decode_empty() {
        let decoded = ApproveQuery::from_query_string("selectedToken=0xabc").unwrap();
        assert!(decoded.valid.is_empty());
        assert!(decoded.invalid.is_empty());
        assert_eq!(decoded.selected_token, "0xabc");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = ApproveQuery::from_query_string("validAddresses=%5Bnot-json").unwrap_err();
        assert!(err.to_string().contains("validAddresses"));
    }
}
