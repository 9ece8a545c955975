//! Payment injection: rewrites a decoded payload with a transaction amount
//! and a freshly computed checksum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checksum;
use crate::error::{QrisError, Result};
use crate::tlv::{
    ParsedPayload, TAG_COUNTRY_CODE, TAG_CRC, TAG_CURRENCY_CODE, TAG_MERCHANT_CATEGORY,
    TAG_MERCHANT_CITY, TAG_MERCHANT_NAME, TAG_PAYLOAD_FORMAT, TAG_TRANSACTION_AMOUNT, TlvField,
};

/// Root tags a complete payload is expected to carry. Their absence does not
/// stop a rebuild; it is reported on the result instead.
const MANDATORY_ROOT_TAGS: [&str; 6] = [
    TAG_PAYLOAD_FORMAT,
    TAG_MERCHANT_CATEGORY,
    TAG_CURRENCY_CODE,
    TAG_COUNTRY_CODE,
    TAG_MERCHANT_NAME,
    TAG_MERCHANT_CITY,
];

/// Widest amount the 2-digit length octets can describe.
const MAX_AMOUNT_DIGITS: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeKind {
    Flat,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSpec {
    pub amount: Decimal,
    pub kind: FeeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub base_amount: Decimal,
    pub fee: FeeSpec,
}

impl PaymentRequest {
    pub fn total_amount(&self) -> Decimal {
        match self.fee.kind {
            FeeKind::Flat => self.base_amount + self.fee.amount,
            FeeKind::Percentage => {
                self.base_amount + self.base_amount * self.fee.amount / Decimal::ONE_HUNDRED
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuiltPayload {
    /// The re-serialized payload, checksum included.
    pub payload: String,
    /// The injected tag-54 value, in whole currency units.
    pub amount: String,
    /// Mandatory root tags the source payload lacked. Non-fatal.
    pub missing_tags: Vec<String>,
}

/// Replaces the transaction amount and checksum of `original`.
///
/// Every field other than `54` and `63` survives in its original relative
/// order; the new amount field is appended, then the checksum field. The
/// survivors are never re-sorted: downstream parsers and the checksum are
/// both order-sensitive.
pub fn rebuild(original: &ParsedPayload, request: &PaymentRequest) -> Result<RebuiltPayload> {
    let amount = amount_value(request)?;

    let mut fields: Vec<TlvField> = original
        .fields()
        .iter()
        .filter(|f| f.tag != TAG_TRANSACTION_AMOUNT && f.tag != TAG_CRC)
        .cloned()
        .collect();

    let missing_tags = MANDATORY_ROOT_TAGS
        .iter()
        .filter(|tag| !fields.iter().any(|f| &f.tag == *tag))
        .map(|tag| tag.to_string())
        .collect();

    fields.push(TlvField::new(TAG_TRANSACTION_AMOUNT, amount.clone()));

    let mut payload = ParsedPayload::new(fields).serialize()?;
    payload.push_str(TAG_CRC);
    payload.push_str("04");
    let crc = checksum::checksum(payload.as_bytes());
    payload.push_str(&crc);

    Ok(RebuiltPayload {
        payload,
        amount,
        missing_tags,
    })
}

/// Validates the request and renders the total as whole currency units:
/// decimal digits only, no grouping, no leading zeros.
fn amount_value(request: &PaymentRequest) -> Result<String> {
    if request.base_amount <= Decimal::ZERO {
        return Err(QrisError::InvalidAmount(format!(
            "base amount {} must be positive",
            request.base_amount
        )));
    }
    if request.fee.amount < Decimal::ZERO {
        return Err(QrisError::InvalidAmount(format!(
            "fee {} must not be negative",
            request.fee.amount
        )));
    }

    let total = request.total_amount();
    if total <= Decimal::ZERO {
        return Err(QrisError::InvalidAmount(format!(
            "total {total} must be positive"
        )));
    }

    let rendered = total.trunc().normalize().to_string();
    if rendered.len() > MAX_AMOUNT_DIGITS {
        return Err(QrisError::InvalidAmount(format!(
            "total needs {} digits, exceeds the 2-digit length",
            rendered.len()
        )));
    }
    Ok(rendered)
}
