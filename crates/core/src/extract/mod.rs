//! Field extraction: pattern matching, semantic mapping, and the parser
//! strategy chain.

pub mod generic;
pub mod mapping;
pub mod parser;
pub mod slip;

pub use generic::{ExtractedField, ExtractionStatus, GenericDocumentData, extract_generic};
pub use mapping::{clean_account, clean_recipient, map_to_slip, parse_amount, parse_slip_date};
pub use parser::{
    EMERGENCY_MARKER, EmergencyParser, PatternBasedParser, SlipParser, ValidationConfig,
    select_parser,
};
pub use slip::{BankSlipData, SlipStatus};

/// The `(document type, format)` pair being extracted, plus per-format
/// behavior flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatContext {
    pub document_type: String,
    pub format_name: String,
    /// Formats laid out in both Thai and English; enables the
    /// transliterated-recipient candidate walk.
    pub dual_language: bool,
}

impl FormatContext {
    pub fn new(document_type: impl Into<String>, format_name: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            format_name: format_name.into(),
            dual_language: false,
        }
    }

    pub fn with_dual_language(mut self, dual_language: bool) -> Self {
        self.dual_language = dual_language;
        self
    }
}
