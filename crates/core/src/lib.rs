//! salween - spatial OCR document model and bank-slip field extraction.
//!
//! Turns a flat list of recognized text fragments with pixel coordinates
//! into structured, named fields for a bank transfer slip, using a
//! hierarchical, user-editable library of extraction patterns instead of
//! hardcoded per-vendor parsers.

pub mod error;
pub mod extract;
pub mod layout;
pub mod library;

pub use error::{ExtractError, Result};

pub use extract::{
    BankSlipData, EMERGENCY_MARKER, EmergencyParser, FormatContext, GenericDocumentData,
    PatternBasedParser, SlipParser, SlipStatus, ValidationConfig, select_parser,
};
pub use layout::{
    BoundingBox, MatchMode, MergeParams, OcrFragment, OcrResponse, SpatialDocument,
};
pub use library::{
    LIBRARY_KEY, LibraryStore, MemoryStore, PatternLibrary, PatternLibraryManager, SearchPattern,
    SubCollection, ValueSource,
};
