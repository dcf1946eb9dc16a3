//! Tests for semantic mapping: date and amount parsing, candidate-list
//! priority, recipient cleanup, and provenance notes.

use chrono::{Datelike, NaiveDate};
use salween_core::extract::generic::{ExtractedField, ExtractionStatus, GenericDocumentData};
use salween_core::extract::{
    FormatContext, SlipStatus, clean_account, clean_recipient, map_to_slip, parse_amount,
    parse_slip_date,
};
use salween_core::layout::SpatialDocument;
use indexmap::IndexMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Date parsing
// ============================================================================

#[test]
fn buddhist_year_converts_to_gregorian() {
    assert_eq!(parse_slip_date("12/03/2568"), Some(date(2025, 3, 12)));
    assert_eq!(parse_slip_date("01/01/2560"), Some(date(2017, 1, 1)));
}

#[test]
fn gregorian_dates_parse_directly() {
    assert_eq!(parse_slip_date("12/03/2024"), Some(date(2024, 3, 12)));
    assert_eq!(parse_slip_date("2024/03/12"), Some(date(2024, 3, 12)));
}

#[test]
fn alternate_separators_normalize_to_slash() {
    assert_eq!(parse_slip_date("12-03-2024"), Some(date(2024, 3, 12)));
    assert_eq!(parse_slip_date("12.03.2568"), Some(date(2025, 3, 12)));
    assert_eq!(parse_slip_date("12 03 2024"), Some(date(2024, 3, 12)));
}

#[test]
fn trailing_time_component_is_dropped() {
    assert_eq!(parse_slip_date("12/03/2568 14:30"), Some(date(2025, 3, 12)));
    assert_eq!(parse_slip_date("12/03/2024 09:15:22"), Some(date(2024, 3, 12)));
}

#[test]
fn thai_month_names_are_recognized() {
    assert_eq!(parse_slip_date("12 ม.ค. 2568"), Some(date(2025, 1, 12)));
    assert_eq!(parse_slip_date("5 ธันวาคม 2567"), Some(date(2024, 12, 5)));
}

#[test]
fn unparseable_dates_yield_none() {
    assert_eq!(parse_slip_date(""), None);
    assert_eq!(parse_slip_date("no date here"), None);
    assert_eq!(parse_slip_date("99/99/2024"), None);
}

// ============================================================================
// Amount parsing
// ============================================================================

#[test]
fn currency_and_thousands_markers_are_stripped() {
    assert_eq!(parse_amount("1,234.50 บาท"), Some(1234.50));
    assert_eq!(parse_amount("฿999"), Some(999.0));
    assert_eq!(parse_amount("THB 2,000.00"), Some(2000.0));
    assert_eq!(parse_amount("150.75 Baht"), Some(150.75));
}

#[test]
fn amounts_must_be_non_negative_decimals() {
    assert_eq!(parse_amount("-10.00"), None);
    assert_eq!(parse_amount("บาท"), None);
    assert_eq!(parse_amount("12a34"), None);
    assert_eq!(parse_amount("0"), Some(0.0));
}

// ============================================================================
// Recipient and account cleanup
// ============================================================================

#[test]
fn recipient_boilerplate_prefixes_are_stripped() {
    assert_eq!(clean_recipient("to: Somchai J."), "Somchai J.");
    assert_eq!(clean_recipient("ไปยัง นายสมชาย"), "นายสมชาย");
    assert_eq!(clean_recipient("จำนวนเงิน: สมชาย"), "สมชาย");
    assert_eq!(clean_recipient("  Somchai  "), "Somchai");
}

#[test]
fn account_masks_are_preserved() {
    assert_eq!(clean_account("acct xxx-1-23456-x"), "xxx-1-23456-x");
    assert_eq!(clean_account("123-4-56789-0"), "123-4-56789-0");
    assert_eq!(clean_account("no digits"), "");
}

// ============================================================================
// Candidate-list priority and provenance
// ============================================================================

fn field(text: &str) -> ExtractedField {
    ExtractedField {
        text: text.to_string(),
        confidence: 0.9,
        source_indices: vec![0],
    }
}

fn generic_with(fields: &[(&str, &str)]) -> GenericDocumentData {
    GenericDocumentData {
        document_type: "BankSlips".to_string(),
        format_name: "KBIZ".to_string(),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), field(v)))
            .collect::<IndexMap<_, _>>(),
        notes: IndexMap::new(),
        status: ExtractionStatus::Success,
        failure_reason: None,
    }
}

fn empty_doc() -> SpatialDocument {
    SpatialDocument::new(Vec::new(), 100, 100, "missing-file.png")
}

#[test]
fn total_wins_over_fee() {
    let generic = generic_with(&[("Fee", "10.00"), ("Total", "1,500.00 บาท")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.amount, 1500.0);
    assert_eq!(slip.notes.get("amount").unwrap(), "Total: 1,500.00 บาท");
}

#[test]
fn fee_substitutes_when_no_total_is_present() {
    let generic = generic_with(&[("Fee", "10.00")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.amount, 10.0);
    assert_eq!(slip.notes.get("amount").unwrap(), "Fee: 10.00");
}

#[test]
fn unparseable_total_falls_through_to_next_candidate() {
    let generic = generic_with(&[("Total", "see below"), ("Amount", "250.00")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.amount, 250.0);
}

#[test]
fn date_candidates_walk_in_order() {
    let generic = generic_with(&[("When", "12/03/2567"), ("Date", "01/02/2568")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    // "Date" outranks "When" regardless of field insertion order.
    assert_eq!(slip.transaction_date, date(2025, 2, 1));
}

#[test]
fn missing_date_falls_back_and_records_it() {
    let generic = generic_with(&[("Total", "100.00")]);
    let doc = empty_doc();
    let slip = map_to_slip(
        &generic,
        &doc,
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    // No date field: the document creation time stands in, and the
    // fallback is visible in provenance. Never a zero/default date.
    assert_eq!(slip.transaction_date, doc.created_at().date_naive());
    assert_eq!(
        slip.notes.get("date.fallback").unwrap(),
        "document created_at"
    );
    assert!(slip.transaction_date.year() > 2000);
}

#[test]
fn recipient_is_cleaned_before_acceptance() {
    let generic = generic_with(&[("To", "to: นายสมชาย ใจดี")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.receiver_name, "นายสมชาย ใจดี");
}

#[test]
fn english_recipient_requires_dual_language_format() {
    let generic = generic_with(&[("To", "สมชาย"), ("ToEnglish", "Somchai J.")]);

    let single = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert!(single.receiver_name_english.is_empty());
    // ToEnglish was not consumed, so it lands in the unmapped namespace.
    assert_eq!(single.notes.get("unmapped.ToEnglish").unwrap(), "Somchai J.");

    let dual = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ").with_dual_language(true),
        "pattern-based",
    );
    assert_eq!(dual.receiver_name_english, "Somchai J.");
}

#[test]
fn unmapped_fields_are_preserved_not_discarded() {
    let generic = generic_with(&[("Total", "55"), ("BranchCode", "0042")]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.notes.get("unmapped.BranchCode").unwrap(), "0042");
}

#[test]
fn accounts_and_memo_map_with_provenance() {
    let generic = generic_with(&[
        ("FromAccount", "123-4-56789-0"),
        ("ToAccount", "xxx-x-x1234-x"),
        ("Memo", "ค่าอาหาร"),
    ]);
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.sender_account, "123-4-56789-0");
    assert_eq!(slip.receiver_account, "xxx-x-x1234-x");
    assert_eq!(slip.memo, "ค่าอาหาร");
    assert_eq!(
        slip.notes.get("sender_account").unwrap(),
        "FromAccount: 123-4-56789-0"
    );
}

#[test]
fn structural_failure_carries_no_fields() {
    let generic = GenericDocumentData::failed("BankSlips", "KBIZ", "document contains no recognized text");
    let slip = map_to_slip(
        &generic,
        &empty_doc(),
        &FormatContext::new("BankSlips", "KBIZ"),
        "pattern-based",
    );
    assert_eq!(slip.status, SlipStatus::Failed);
    assert_eq!(
        slip.error.as_deref(),
        Some("document contains no recognized text")
    );
    assert!(slip.receiver_name.is_empty());
    assert_eq!(slip.amount, 0.0);
}
