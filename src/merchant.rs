//! Merchant identity extraction.
//!
//! Identity data is advisory: extraction never fails. Anything missing or
//! malformed resolves to the documented default instead of propagating.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::tlv::{
    ParsedPayload, SUB_TAG_GLOBAL_ID, SUB_TAG_TERMINAL_LABEL, TAG_ADDITIONAL_DATA,
    TAG_COUNTRY_CODE, TAG_CURRENCY_CODE, TAG_MERCHANT_CITY, TAG_MERCHANT_NAME,
};

pub const DEFAULT_NAME: &str = "MERCHANT";
pub const DEFAULT_CITY: &str = "KOTA";
pub const DEFAULT_MERCHANT_ID: &str = "ID0000000000000";
pub const DEFAULT_AREA_CODE: &str = "A01";
pub const DEFAULT_COUNTRY_CODE: &str = "ID";
pub const DEFAULT_CURRENCY_CODE: &str = "360";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantInfo {
    pub name: String,
    pub city: String,
    pub merchant_id: String,
    pub area_code: String,
    pub country_code: String,
    pub currency_code: String,
}

impl Default for MerchantInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            city: DEFAULT_CITY.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            area_code: DEFAULT_AREA_CODE.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            currency_code: DEFAULT_CURRENCY_CODE.to_string(),
        }
    }
}

/// Maps decoded fields to a [`MerchantInfo`] record.
pub fn extract(payload: &ParsedPayload) -> MerchantInfo {
    let mut info = MerchantInfo::default();

    if let Some(name) = payload.get(TAG_MERCHANT_NAME) {
        info.name = name.to_string();
    }
    if let Some(city) = payload.get(TAG_MERCHANT_CITY) {
        info.city = city.to_string();
    }
    if let Some(country) = payload.get(TAG_COUNTRY_CODE) {
        info.country_code = country.to_string();
    }
    if let Some(currency) = payload.get(TAG_CURRENCY_CODE) {
        info.currency_code = currency.to_string();
    }
    if let Some(id) = structured_merchant_id(payload).or_else(|| heuristic_merchant_id(payload)) {
        info.merchant_id = id;
    }
    if let Some(area) = area_code(payload) {
        info.area_code = area;
    }

    info
}

/// Primary path: sub-tag `01` of the first Merchant Account Information
/// template that decodes cleanly. Templates that fail to sub-decode are
/// skipped, not reported.
fn structured_merchant_id(payload: &ParsedPayload) -> Option<String> {
    payload
        .fields()
        .iter()
        .filter(|f| f.is_merchant_account())
        .filter_map(|f| f.subfields().ok())
        .find_map(|subs| {
            subs.into_iter()
                .find(|s| s.tag == SUB_TAG_GLOBAL_ID)
                .map(|s| s.value)
        })
}

/// Secondary heuristic, used only when the structured pass yields nothing:
/// the first run of a 2-letter country prefix followed by 13-15 digits
/// anywhere in the field values.
fn heuristic_merchant_id(payload: &ParsedPayload) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"[A-Z]{2}[0-9]{13,15}").expect("merchant id pattern is valid")
    });

    payload
        .fields()
        .iter()
        .find_map(|f| pattern.find(&f.value))
        .map(|m| m.as_str().to_string())
}

fn area_code(payload: &ParsedPayload) -> Option<String> {
    payload
        .fields()
        .iter()
        .filter(|f| f.tag == TAG_ADDITIONAL_DATA)
        .filter_map(|f| f.subfields().ok())
        .find_map(|subs| {
            subs.into_iter()
                .find(|s| s.tag == SUB_TAG_TERMINAL_LABEL)
                .map(|s| s.value)
        })
}
