//! Parser selection, validation, and the emergency fallback chain.
//!
//! One capability trait, two strategies: the pattern-based engine and a
//! deliberately-always-failing emergency parser used when the primary
//! strategy cannot be constructed, so that failures surface as records
//! routed to manual review rather than silently wrong data.

use std::sync::Arc;

use chrono::Datelike;
use tracing::warn;

use crate::error::Result;
use crate::layout::SpatialDocument;
use crate::library::PatternLibraryManager;

use super::FormatContext;
use super::generic::extract_generic;
use super::mapping::map_to_slip;
use super::slip::{BankSlipData, SlipStatus};

/// Marker text placed in the recipient field of every emergency-path
/// record, so an operator cannot mistake it for a normal extraction.
pub const EMERGENCY_MARKER: &str = "** MANUAL REVIEW REQUIRED **";

/// Minimum-acceptance rules applied to any strategy's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_year: 2017,
            max_year: 2030,
        }
    }
}

impl ValidationConfig {
    /// Returns one entry per failed rule, empty when the result is
    /// acceptable.
    pub fn check(&self, result: &BankSlipData) -> Vec<(&'static str, String)> {
        let mut failures = Vec::new();
        let year = result.transaction_date.year();
        if year < self.min_year || year > self.max_year {
            failures.push((
                "date",
                format!("year {year} outside {}..{}", self.min_year, self.max_year),
            ));
        }
        if result.amount <= 0.0 {
            failures.push(("amount", format!("not positive: {}", result.amount)));
        }
        if !result.has_recipient() {
            failures.push(("recipient", "blank".to_string()));
        }
        failures
    }
}

/// One extraction strategy.
pub trait SlipParser: Send + Sync {
    /// Whether this strategy is willing to try the given recognized text.
    fn can_attempt(&self, text: &str, format: &FormatContext) -> bool;

    /// Runs the strategy. Structural failures (unknown type/format, empty
    /// input) come back as a `Failed` result value with a reason, never as
    /// an error; the merge pass is expected to have already run on `doc`.
    fn extract(&self, doc: &SpatialDocument, format: &FormatContext) -> Result<BankSlipData>;

    fn identity(&self) -> &str;

    /// Minimum-acceptance check; the caller decides whether a failure
    /// blocks downstream use.
    fn validate(&self, result: &BankSlipData) -> bool;
}

/// The primary strategy: pattern library match plus semantic mapping.
pub struct PatternBasedParser {
    library: Arc<PatternLibraryManager>,
    validation: ValidationConfig,
}

impl PatternBasedParser {
    pub fn new(library: Arc<PatternLibraryManager>, validation: ValidationConfig) -> Self {
        Self {
            library,
            validation,
        }
    }
}

impl SlipParser for PatternBasedParser {
    fn can_attempt(&self, text: &str, format: &FormatContext) -> bool {
        !text.trim().is_empty()
            && self
                .library
                .load_sub_collection(&format.document_type, &format.format_name)
                .is_some()
    }

    fn extract(&self, doc: &SpatialDocument, format: &FormatContext) -> Result<BankSlipData> {
        let library = self.library.load_library();
        let Some(collection) = library.collection(&format.document_type) else {
            let mut slip = BankSlipData::empty(self.identity(), doc.created_at().date_naive());
            slip.error = Some(format!("unknown document type: {}", format.document_type));
            return Ok(slip);
        };
        let Some(patterns) = collection.get(&format.format_name) else {
            let mut slip = BankSlipData::empty(self.identity(), doc.created_at().date_naive());
            slip.error = Some(format!(
                "unknown format {} for document type {}",
                format.format_name, format.document_type
            ));
            return Ok(slip);
        };

        let generic = extract_generic(doc, &format.document_type, &format.format_name, patterns);
        let mut slip = map_to_slip(&generic, doc, format, self.identity());
        slip.pattern_success_rate = if patterns.is_empty() {
            0.0
        } else {
            generic.fields.len() as f64 / patterns.len() as f64
        };

        if slip.status == SlipStatus::Completed {
            let failures = self.validation.check(&slip);
            if !failures.is_empty() {
                for (rule, reason) in &failures {
                    slip.note(&format!("validation.{rule}"), reason);
                }
                slip.status = SlipStatus::Failed;
            }
        }
        Ok(slip)
    }

    fn identity(&self) -> &str {
        "pattern-based"
    }

    fn validate(&self, result: &BankSlipData) -> bool {
        self.validation.check(result).is_empty()
    }
}

/// The emergency strategy: accepts any non-blank input, always produces a
/// `Failed` record with the operator-visible marker in the recipient field,
/// and never validates. An emergency-path record must be impossible to
/// mistake for a normal success.
pub struct EmergencyParser;

impl SlipParser for EmergencyParser {
    fn can_attempt(&self, text: &str, _format: &FormatContext) -> bool {
        !text.trim().is_empty()
    }

    fn extract(&self, doc: &SpatialDocument, format: &FormatContext) -> Result<BankSlipData> {
        let mut slip = BankSlipData::empty(self.identity(), doc.created_at().date_naive());
        slip.receiver_name = EMERGENCY_MARKER.to_string();
        slip.status = SlipStatus::Failed;
        slip.error = Some("primary extraction strategy unavailable".to_string());
        slip.note("emergency.document_type", &format.document_type);
        slip.note("emergency.format", &format.format_name);
        Ok(slip)
    }

    fn identity(&self) -> &str {
        "emergency-fallback"
    }

    fn validate(&self, _result: &BankSlipData) -> bool {
        false
    }
}

/// Chooses the strategy to run. The pattern-based engine is the only
/// primary; when it cannot be constructed (no library manager wired in),
/// the emergency parser takes over and guarantees the record is routed to
/// manual review.
pub fn select_parser(
    library: Option<Arc<PatternLibraryManager>>,
    validation: ValidationConfig,
) -> Box<dyn SlipParser> {
    match library {
        Some(library) => Box::new(PatternBasedParser::new(library, validation)),
        None => {
            warn!("primary extraction strategy unavailable, substituting emergency parser");
            Box::new(EmergencyParser)
        }
    }
}
