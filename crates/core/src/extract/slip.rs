//! Structured bank-slip result.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Final outcome of one extraction attempt. `Completed` means structural
/// success plus minimum-acceptance validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    Completed,
    Failed,
}

/// The semantic mapping target: one bank transfer slip.
///
/// `notes` is the provenance map; every mapped slot records the field name
/// and raw text it came from, so downstream consumers can see exactly which
/// pattern produced which value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSlipData {
    pub transaction_date: NaiveDate,
    pub amount: f64,
    pub receiver_name: String,
    pub receiver_name_english: String,
    pub sender_account: String,
    pub receiver_account: String,
    pub memo: String,
    pub parser_name: String,
    pub notes: IndexMap<String, String>,
    pub status: SlipStatus,
    /// Matched patterns / attempted patterns for the run.
    pub pattern_success_rate: f64,
    pub error: Option<String>,
}

impl BankSlipData {
    /// A blank result carrying only the parser identity and a date; the
    /// date is always real (fallback-derived), never a zero default.
    pub fn empty(parser_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            transaction_date: date,
            amount: 0.0,
            receiver_name: String::new(),
            receiver_name_english: String::new(),
            sender_account: String::new(),
            receiver_account: String::new(),
            memo: String::new(),
            parser_name: parser_name.into(),
            notes: IndexMap::new(),
            status: SlipStatus::Failed,
            pattern_success_rate: 0.0,
            error: None,
        }
    }

    pub fn note(&mut self, key: &str, value: impl std::fmt::Display) {
        self.notes.insert(key.to_string(), value.to_string());
    }

    /// Either recipient name (local or transliterated) is non-blank.
    pub fn has_recipient(&self) -> bool {
        !self.receiver_name.trim().is_empty() || !self.receiver_name_english.trim().is_empty()
    }
}
