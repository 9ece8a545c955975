//! Tag-Length-Value codec for EMVCo Merchant Presented QR payloads.
//!
//! Every record on the wire is `TT LL V...`: a 2-digit ASCII tag, a 2-digit
//! ASCII decimal byte length, then exactly that many value bytes. Field order
//! is semantically significant and is preserved through decode/serialize.

use crate::error::{QrisError, Result};

pub const TAG_PAYLOAD_FORMAT: &str = "00";
pub const TAG_POINT_OF_INITIATION: &str = "01";
pub const TAG_MERCHANT_CATEGORY: &str = "52";
pub const TAG_CURRENCY_CODE: &str = "53";
pub const TAG_TRANSACTION_AMOUNT: &str = "54";
pub const TAG_COUNTRY_CODE: &str = "58";
pub const TAG_MERCHANT_NAME: &str = "59";
pub const TAG_MERCHANT_CITY: &str = "60";
pub const TAG_ADDITIONAL_DATA: &str = "62";
pub const TAG_CRC: &str = "63";

/// Sub-tag carrying the globally unique identifier inside a Merchant
/// Account Information template.
pub const SUB_TAG_GLOBAL_ID: &str = "01";
/// Sub-tag carrying the terminal label inside the Additional Data Field
/// Template; QRIS issuers put the area code there.
pub const SUB_TAG_TERMINAL_LABEL: &str = "07";

/// Shortest decodable payload: one `6304` header plus its 4 checksum
/// characters. Applies to top-level payloads only; nested template bodies
/// may be shorter.
const MIN_PAYLOAD_LEN: usize = 8;

/// Longest value a single field can carry, bounded by the 2-digit length.
const MAX_VALUE_LEN: usize = 99;

/// One decoded field. The wire length is not stored: it is derived from the
/// value at encode time, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvField {
    pub tag: String,
    pub value: String,
}

impl TlvField {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// True for tags in the Merchant Account Information range (`02`-`51`).
    pub fn is_merchant_account(&self) -> bool {
        matches!(self.tag.parse::<u8>(), Ok(2..=51))
    }

    /// True for fields whose value is itself TLV-encoded: the Merchant
    /// Account Information range and the Additional Data Field Template.
    pub fn is_template(&self) -> bool {
        self.is_merchant_account() || self.tag == TAG_ADDITIONAL_DATA
    }

    /// Decodes the value as a nested TLV sequence. Only meaningful for
    /// template fields; never invoked implicitly by the decoder.
    pub fn subfields(&self) -> Result<Vec<TlvField>> {
        walk(&self.value)
    }

    /// Appends `tag + length + value` to `out`.
    fn encode_into(&self, out: &mut String) -> Result<()> {
        let len = self.value.len();
        if len > MAX_VALUE_LEN {
            return Err(QrisError::MalformedPayload(format!(
                "field {} value is {len} bytes, exceeds the 2-digit length",
                self.tag
            )));
        }
        out.push_str(&self.tag);
        out.push_str(&format!("{len:02}"));
        out.push_str(&self.value);
        Ok(())
    }
}

/// An ordered sequence of decoded fields. Duplicate tags are retained in
/// appearance order; [`ParsedPayload::get`] resolves to the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPayload {
    fields: Vec<TlvField>,
}

impl ParsedPayload {
    pub fn new(fields: Vec<TlvField>) -> Self {
        Self { fields }
    }

    /// Strict decode of a top-level payload. Fails with `MalformedPayload`
    /// on a non-digit tag or length, a payload ending mid-field, or anything
    /// shorter than [`MIN_PAYLOAD_LEN`]. Unknown tags are kept as opaque
    /// fields.
    pub fn decode(input: &str) -> Result<Self> {
        if input.len() < MIN_PAYLOAD_LEN {
            return Err(QrisError::MalformedPayload(format!(
                "payload is {} bytes, shorter than the minimum of {MIN_PAYLOAD_LEN}",
                input.len()
            )));
        }
        Ok(Self {
            fields: walk(input)?,
        })
    }

    pub fn fields(&self) -> &[TlvField] {
        &self.fields
    }

    /// Last-occurrence-wins lookup by tag.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// Re-serializes the fields in stored order.
    pub fn serialize(&self) -> Result<String> {
        let mut out = String::new();
        for field in &self.fields {
            field.encode_into(&mut out)?;
        }
        Ok(out)
    }
}

/// Cursor walk over `TT LL V...` records. Shared by top-level decoding and
/// explicit template sub-decoding.
fn walk(input: &str) -> Result<Vec<TlvField>> {
    let bytes = input.as_bytes();
    let mut fields = Vec::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let header = bytes
            .get(cursor..cursor + 4)
            .ok_or_else(|| truncated_header(cursor))?;
        if !header.iter().all(u8::is_ascii_digit) {
            return Err(QrisError::MalformedPayload(format!(
                "non-numeric tag or length at offset {cursor}"
            )));
        }
        let tag = &input[cursor..cursor + 2];
        let len = usize::from(header[2] - b'0') * 10 + usize::from(header[3] - b'0');

        let value_start = cursor + 4;
        let value_bytes = bytes.get(value_start..value_start + len).ok_or_else(|| {
            QrisError::MalformedPayload(format!(
                "field {tag} declares {len} bytes but only {} remain",
                bytes.len() - value_start
            ))
        })?;
        let value = std::str::from_utf8(value_bytes).map_err(|_| {
            QrisError::MalformedPayload(format!("field {tag} value is not valid UTF-8"))
        })?;

        fields.push(TlvField::new(tag, value));
        cursor = value_start + len;
    }

    Ok(fields)
}

fn truncated_header(cursor: usize) -> QrisError {
    QrisError::MalformedPayload(format!("payload ends mid-header at offset {cursor}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flat_fields() {
        let payload = ParsedPayload::decode("00020153033605802ID").unwrap();
        let fields = payload.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], TlvField::new("00", "01"));
        assert_eq!(fields[1], TlvField::new("53", "360"));
        assert_eq!(fields[2], TlvField::new("58", "ID"));
    }

    #[test]
    fn test_decode_preserves_appearance_order() {
        // 53 before 52: order must survive, not be re-sorted
        let payload = ParsedPayload::decode("530336052045999").unwrap();
        let tags: Vec<&str> = payload.fields().iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, ["53", "52"]);
    }

    #[test]
    fn test_lookup_is_last_occurrence_wins() {
        let payload = ParsedPayload::decode("590541PHA59046652").unwrap();
        assert_eq!(payload.fields().len(), 2);
        assert_eq!(payload.get("59"), Some("6652"));
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let err = ParsedPayload::decode("6304").unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_non_numeric_header() {
        let err = ParsedPayload::decode("XX0201010211").unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));

        let err = ParsedPayload::decode("00AB01010211").unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_truncated_value() {
        // declares 10 bytes, supplies 4
        let err = ParsedPayload::decode("0002015910ABCD").unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_mid_header_end() {
        let err = ParsedPayload::decode("0002015905BATAM60").unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));
    }

    #[test]
    fn test_unknown_tags_are_preserved() {
        let payload = ParsedPayload::decode("000201990455559802XY").unwrap();
        assert_eq!(payload.get("99"), Some("5555"));
        assert_eq!(payload.get("98"), Some("XY"));
    }

    #[test]
    fn test_serialize_round_trips() {
        let input = "00020101021253033605802ID5905TOKO 6007JAKARTA";
        let payload = ParsedPayload::decode(input).unwrap();
        assert_eq!(payload.serialize().unwrap(), input);
    }

    #[test]
    fn test_serialize_rejects_oversized_value() {
        let payload = ParsedPayload::new(vec![TlvField::new("59", "X".repeat(100))]);
        let err = payload.serialize().unwrap_err();
        assert!(matches!(err, QrisError::MalformedPayload(_)));
    }

    #[test]
    fn test_template_classification() {
        assert!(TlvField::new("02", "").is_merchant_account());
        assert!(TlvField::new("26", "").is_merchant_account());
        assert!(TlvField::new("51", "").is_merchant_account());
        assert!(!TlvField::new("52", "").is_merchant_account());
        assert!(TlvField::new("62", "").is_template());
        assert!(!TlvField::new("59", "").is_template());
    }

    #[test]
    fn test_subfields_decodes_nested_template() {
        let payload = ParsedPayload::decode("26360014ID.CO.QRIS.WWW011493600123456789").unwrap();
        let template = &payload.fields()[0];
        let subs = template.subfields().unwrap();
        assert_eq!(subs[0], TlvField::new("00", "ID.CO.QRIS.WWW"));
        assert_eq!(subs[1], TlvField::new("01", "93600123456789"));
    }

    #[test]
    fn test_subfields_allows_short_template_body() {
        // 7-byte template bodies are legitimate below the top-level minimum
        let field = TlvField::new("62", "0703A01");
        let subs = field.subfields().unwrap();
        assert_eq!(subs, vec![TlvField::new("07", "A01")]);
    }
}
