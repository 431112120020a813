//! Transaction memos and SEP-29 memo-required detection

use alloy_primitives::hex;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{Hash, Memo};

use crate::error::{BridgeError, Result};

/// Maximum byte length of a text memo.
pub const MAX_TEXT_MEMO_BYTES: usize = 28;

/// Horizon `data_attr` key an account sets to require memos (SEP-29).
pub const MEMO_REQUIRED_DATA_KEY: &str = "config.memo_required";

/// Memo kinds a destination may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoKind {
    Text,
    Id,
    Hash,
}

/// A validated memo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StellarMemo {
    #[default]
    None,
    Text(String),
    Id(u64),
    Hash([u8; 32]),
}

impl StellarMemo {
    /// Text memo of at most 28 bytes.
    pub fn text(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_TEXT_MEMO_BYTES {
            return Err(BridgeError::InvalidMemo {
                reason: format!(
                    "text memo is {} bytes, limit is {MAX_TEXT_MEMO_BYTES}",
                    value.len()
                ),
            });
        }
        Ok(Self::Text(value))
    }

    /// Numeric memo, parsed from its decimal form.
    pub fn id(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<u64>()
            .map(Self::Id)
            .map_err(|_| BridgeError::InvalidMemo {
                reason: format!("memo id must be an unsigned 64-bit integer: {value:?}"),
            })
    }

    /// 32-byte hash memo, parsed from 64 hex characters.
    pub fn hash(value: &str) -> Result<Self> {
        let bytes = hex::decode(value.trim()).map_err(|e| BridgeError::InvalidMemo {
            reason: format!("memo hash is not hex: {e}"),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| BridgeError::InvalidMemo {
            reason: "memo hash must be 32 bytes".to_string(),
        })?;
        Ok(Self::Hash(bytes))
    }

    /// Parses user input for the given kind; empty input means no memo.
    pub fn parse(kind: MemoKind, value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Ok(Self::None);
        }
        match kind {
            MemoKind::Text => Self::text(value),
            MemoKind::Id => Self::id(value),
            MemoKind::Hash => Self::hash(value),
        }
    }

    pub fn kind(&self) -> Option<MemoKind> {
        match self {
            Self::None => None,
            Self::Text(_) => Some(MemoKind::Text),
            Self::Id(_) => Some(MemoKind::Id),
            Self::Hash(_) => Some(MemoKind::Hash),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn to_xdr(&self) -> Result<Memo> {
        Ok(match self {
            Self::None => Memo::None,
            Self::Text(text) => Memo::Text(text.as_bytes().to_vec().try_into()?),
            Self::Id(id) => Memo::Id(*id),
            Self::Hash(hash) => Memo::Hash(Hash(*hash)),
        })
    }
}

/// Outcome of a SEP-29 lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoRequirement {
    pub memo_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<MemoKind>,
}

impl MemoRequirement {
    pub const NOT_REQUIRED: MemoRequirement = MemoRequirement {
        memo_required: false,
        memo_type: None,
    };

    /// Interprets the base64 `config.memo_required` data entry.
    ///
    /// Horizon returns data entries base64-encoded; `"1"` and `"true"` mark
    /// the account as requiring a text memo. Raw values are accepted too.
    pub fn from_data_entry(entry: Option<&str>) -> Self {
        let Some(entry) = entry else {
            return Self::NOT_REQUIRED;
        };
        let entry = entry.trim();
        let flagged = |value: &[u8]| matches!(value, b"1" | b"true");
        let required = flagged(entry.as_bytes())
            || BASE64_STANDARD
                .decode(entry)
                .is_ok_and(|decoded| flagged(&decoded));
        if !required {
            return Self::NOT_REQUIRED;
        }
        Self {
            memo_required: true,
            memo_type: Some(MemoKind::Text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_text_memo_length_limit() {
        assert!(StellarMemo::text("a".repeat(28)).is_ok());
        assert!(matches!(
            StellarMemo::text("a".repeat(29)),
            Err(BridgeError::InvalidMemo { .. })
        ));
    }

    #[test]
    fn test_id_memo() {
        assert_eq!(StellarMemo::id("12345").unwrap(), StellarMemo::Id(12345));
        assert!(StellarMemo::id("-1").is_err());
        assert!(StellarMemo::id("abc").is_err());
    }

    #[test]
    fn test_hash_memo() {
        let hex = "ab".repeat(32);
        assert_eq!(StellarMemo::hash(&hex).unwrap(), StellarMemo::Hash([0xab; 32]));
        assert!(StellarMemo::hash("abcd").is_err());
    }

    #[test]
    fn test_empty_input_is_no_memo() {
        assert_eq!(
            StellarMemo::parse(MemoKind::Id, "  ").unwrap(),
            StellarMemo::None
        );
    }

    #[test]
    fn test_to_xdr() {
        assert!(matches!(
            StellarMemo::text("salt").unwrap().to_xdr().unwrap(),
            Memo::Text(_)
        ));
        assert_eq!(StellarMemo::None.to_xdr().unwrap(), Memo::None);
    }

    #[rstest]
    #[case(Some("MQ=="), true)] // "1"
    #[case(Some("dHJ1ZQ=="), true)] // "true"
    #[case(Some("MA=="), false)] // "0"
    #[case(Some("1"), true)]
    #[case(Some("true"), true)]
    #[case(None, false)]
    fn test_memo_required_entry(#[case] entry: Option<&str>, #[case] required: bool) {
        let requirement = MemoRequirement::from_data_entry(entry);
        assert_eq!(requirement.memo_required, required);
        if required {
            assert_eq!(requirement.memo_type, Some(MemoKind::Text));
        }
    }
}
