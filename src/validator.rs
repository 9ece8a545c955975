//! Structural and checksum classification of payloads.

use serde::Serialize;

use crate::checksum;
use crate::error::{QrisError, Result};
use crate::tlv::{ParsedPayload, TAG_CRC, TAG_PAYLOAD_FORMAT};

/// Identifier Indonesian acquirers carry inside a Merchant Account
/// Information template.
pub const QRIS_DOMESTIC_IDENTIFIER: &str = "ID.CO.QRIS";

/// Value the first field (tag `00`) must hold.
const PAYLOAD_FORMAT_VERSION: &str = "01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QrStatus {
    QrisDomestic,
    EmvGeneric,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub status: QrStatus,
    pub checksum_valid: bool,
}

/// Classifies a payload. Undecodable input fails with `MalformedPayload`;
/// a decodable payload always classifies, with structural violations
/// reported as `QrStatus::Invalid` rather than an error.
pub fn classify(payload: &str) -> Result<Classification> {
    let parsed = ParsedPayload::decode(payload)?;
    let checksum_valid = checksum::verify(payload);

    let status = if !structure_ok(&parsed) {
        QrStatus::Invalid
    } else if is_domestic(&parsed) {
        QrStatus::QrisDomestic
    } else {
        QrStatus::EmvGeneric
    };

    Ok(Classification {
        status,
        checksum_valid,
    })
}

/// The strict form of [`classify`]: structural violations become
/// `UnsupportedFormat` and a failed checksum becomes `ChecksumMismatch`, so
/// callers that refuse unofficial payloads get a typed rejection.
pub fn validate(payload: &str) -> Result<Classification> {
    let classification = classify(payload)?;
    if classification.status == QrStatus::Invalid {
        return Err(QrisError::UnsupportedFormat(
            "payload is not an EMVCo merchant-presented QR".to_string(),
        ));
    }
    if !classification.checksum_valid {
        let split = payload.len() - 4;
        return Err(QrisError::ChecksumMismatch {
            expected: checksum::checksum(payload[..split].as_bytes()),
            found: payload[split..].to_string(),
        });
    }
    Ok(classification)
}

/// First field must be tag `00` with value `"01"`; exactly one CRC field,
/// last, with a 4-character value.
fn structure_ok(parsed: &ParsedPayload) -> bool {
    let fields = parsed.fields();
    let first_ok = fields
        .first()
        .is_some_and(|f| f.tag == TAG_PAYLOAD_FORMAT && f.value == PAYLOAD_FORMAT_VERSION);

    let crc_count = fields.iter().filter(|f| f.tag == TAG_CRC).count();
    let last_ok = fields
        .last()
        .is_some_and(|f| f.tag == TAG_CRC && f.value.len() == 4);

    first_ok && crc_count == 1 && last_ok
}

fn is_domestic(parsed: &ParsedPayload) -> bool {
    parsed
        .fields()
        .iter()
        .filter(|f| f.is_merchant_account())
        .any(|f| f.value.contains(QRIS_DOMESTIC_IDENTIFIER))
}
