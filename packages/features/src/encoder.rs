//! Closed-vocabulary label encoders.
//!
//! A [`LabelEncoder`] maps each distinct string seen during fitting to its
//! index in the sorted vocabulary. The mapping depends only on the set of
//! values, never on the order they were seen in. Values outside the
//! vocabulary are rejected with [`EncodingError::UnknownCategory`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Which categorical column an encoder belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EncoderKind {
    /// Operational region.
    Region,
    /// Initial report text.
    Report,
    /// Incident group label.
    Group,
}

/// Errors raised when applying an encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The value was not seen when the encoder was fitted.
    #[error("Unknown {kind} '{value}'")]
    UnknownCategory {
        /// Encoder that rejected the value.
        kind: EncoderKind,
        /// The rejected value.
        value: String,
    },

    /// The code is outside the encoder's vocabulary.
    #[error("Unknown {kind} code {code}")]
    UnknownCode {
        /// Encoder that rejected the code.
        kind: EncoderKind,
        /// The rejected code.
        code: u32,
    },
}

/// Serialized form, validated on load.
#[derive(Deserialize)]
struct EncoderRepr {
    kind: EncoderKind,
    classes: Vec<String>,
}

/// A fitted categorical-to-integer mapping. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderRepr")]
pub struct LabelEncoder {
    kind: EncoderKind,
    classes: Vec<String>,
}

impl TryFrom<EncoderRepr> for LabelEncoder {
    type Error = String;

    fn try_from(repr: EncoderRepr) -> Result<Self, Self::Error> {
        if repr.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "{} encoder vocabulary is not sorted and unique",
                repr.kind
            ));
        }
        if u32::try_from(repr.classes.len()).is_err() {
            return Err(format!("{} encoder vocabulary is too large", repr.kind));
        }
        Ok(Self {
            kind: repr.kind,
            classes: repr.classes,
        })
    }
}

impl LabelEncoder {
    /// Fits an encoder on every value in `values` in a single pass.
    pub fn fit<I, S>(kind: EncoderKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        Self {
            kind,
            classes: vocabulary.into_iter().collect(),
        }
    }

    /// Which column this encoder belongs to.
    #[must_use]
    pub const fn kind(&self) -> EncoderKind {
        self.kind
    }

    /// The sorted vocabulary; a value's code is its index here.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of known categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the code for `value`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCategory`] if `value` was not seen
    /// during fitting.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self, value: &str) -> Result<u32, EncodingError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map(|idx| idx as u32)
            .map_err(|_| EncodingError::UnknownCategory {
                kind: self.kind,
                value: value.to_string(),
            })
    }

    /// Returns the category for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnknownCode`] if `code` is outside the
    /// vocabulary.
    pub fn decode(&self, code: u32) -> Result<&str, EncodingError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
            .ok_or(EncodingError::UnknownCode {
                kind: self.kind,
                code,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_order() {
        let enc = LabelEncoder::fit(EncoderKind::Region, ["SERTAO", "RMR", "AGRESTE", "RMR"]);

        assert_eq!(enc.classes(), ["AGRESTE", "RMR", "SERTAO"]);
        assert_eq!(enc.encode("AGRESTE").unwrap(), 0);
        assert_eq!(enc.encode("RMR").unwrap(), 1);
        assert_eq!(enc.encode("SERTAO").unwrap(), 2);
    }

    #[test]
    fn fitting_is_order_independent() {
        let a = LabelEncoder::fit(EncoderKind::Report, ["b", "c", "a", "b"]);
        let b = LabelEncoder::fit(EncoderKind::Report, ["a", "b", "c"]);
        let c = LabelEncoder::fit(EncoderKind::Report, ["c", "c", "b", "a"]);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn decode_inverts_encode() {
        let enc = LabelEncoder::fit(EncoderKind::Group, ["FIRE", "RESCUE", "PREVENTION"]);
        for class in enc.classes() {
            let code = enc.encode(class).unwrap();
            assert_eq!(enc.decode(code).unwrap(), class);
        }
    }

    #[test]
    fn unknown_category_is_an_error_not_a_sentinel() {
        let enc = LabelEncoder::fit(EncoderKind::Region, ["RMR"]);
        let err = enc.encode("MATA").unwrap_err();

        assert_eq!(
            err,
            EncodingError::UnknownCategory {
                kind: EncoderKind::Region,
                value: "MATA".to_string()
            }
        );
        assert_eq!(err.to_string(), "Unknown region 'MATA'");
    }

    #[test]
    fn unknown_code_is_an_error() {
        let enc = LabelEncoder::fit(EncoderKind::Group, ["FIRE"]);
        assert!(matches!(
            enc.decode(1),
            Err(EncodingError::UnknownCode { code: 1, .. })
        ));
    }

    #[test]
    fn serializes_verbatim() {
        let enc = LabelEncoder::fit(EncoderKind::Region, ["RMR", "MATA"]);
        let json = serde_json::to_string(&enc).unwrap();
        assert_eq!(json, r#"{"kind":"region","classes":["MATA","RMR"]}"#);

        let back: LabelEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, enc);
    }

    #[test]
    fn rejects_unsorted_vocabulary_on_load() {
        let json = r#"{"kind":"region","classes":["RMR","MATA"]}"#;
        assert!(serde_json::from_str::<LabelEncoder>(json).is_err());
    }

    #[test]
    fn rejects_duplicate_vocabulary_on_load() {
        let json = r#"{"kind":"report","classes":["a","a"]}"#;
        assert!(serde_json::from_str::<LabelEncoder>(json).is_err());
    }
}
