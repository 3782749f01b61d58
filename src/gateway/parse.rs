//! Extraction of structured data from free-form model replies
//!
//! Tiers are tried in order:
//!
//! 1. the whole reply as JSON
//! 2. the outermost `[ {...} ]` substring, then the outermost `{"...": ...}`
//!    substring
//! 3. `"Title" by Artist` phrases, turned into a recommendation list
//!
//! A candidate that matches a tier's shape but fails to decode falls through
//! to the next tier.

use crate::error::Result;
use regex::Regex;
use serde_json::{json, Value};

/// Reason attached to recommendations recovered from prose
pub const EXTRACTED_REASON: &str = "Extracted from API response";

/// Which tier produced a parsed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    /// The reply was valid JSON as-is
    Json,
    /// A JSON array or object was embedded in surrounding text
    Embedded,
    /// Recovered from `"Title" by Artist` phrases
    Pattern,
}

impl ParseTier {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseTier::Json => "json",
            ParseTier::Embedded => "embedded",
            ParseTier::Pattern => "pattern",
        }
    }
}

/// Compiled extraction patterns
#[derive(Debug, Clone)]
pub struct ReplyParser {
    array: Regex,
    object: Regex,
    by_artist: Regex,
}

impl ReplyParser {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            array: Regex::new(r"\[\s*\{[\s\S]*\}\s*\]")?,
            object: Regex::new(r#"\{\s*"[\s\S]*"\s*:\s*[\s\S]*\}"#)?,
            by_artist: Regex::new(r#""([^"]+)"\s+by\s+([^,\n]+)"#)?,
        })
    }

    /// Parse a raw reply
    ///
    /// # Returns
    ///
    /// The decoded value and the tier that produced it, or a description of
    /// why every tier failed
    ///
    /// # Examples
    ///
    /// ```
    /// use vinylvibe::gateway::{ParseTier, ReplyParser};
    ///
    /// let parser = ReplyParser::new().unwrap();
    /// let (value, tier) = parser
    ///     .parse(r#"Sure! [{"title": "Jolene", "artist": "Dolly Parton"}] Enjoy."#)
    ///     .unwrap();
    /// assert_eq!(tier, ParseTier::Embedded);
    /// assert_eq!(value[0]["title"], "Jolene");
    /// ```
    pub fn parse(&self, raw: &str) -> std::result::Result<(Value, ParseTier), String> {
        if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
            return Ok((value, ParseTier::Json));
        }

        for pattern in [&self.array, &self.object] {
            if let Some(found) = pattern.find(raw) {
                match serde_json::from_str::<Value>(found.as_str()) {
                    Ok(value) => return Ok((value, ParseTier::Embedded)),
                    Err(e) => tracing::debug!("Embedded JSON candidate rejected: {}", e),
                }
            }
        }

        let extracted: Vec<Value> = self
            .by_artist
            .captures_iter(raw)
            .map(|caps| {
                json!({
                    "title": caps[1].trim(),
                    "artist": caps[2].trim(),
                    "reason": EXTRACTED_REASON,
                })
            })
            .collect();

        if extracted.is_empty() {
            Err("Failed to parse response as JSON".to_string())
        } else {
            tracing::debug!("Recovered {} songs from prose", extracted.len());
            Ok((Value::Array(extracted), ParseTier::Pattern))
        }
    }
}
