//! Semantic mapping: translating the flat extracted field set into the
//! bank-slip domain slots (date, amount, recipient, account, memo).
//!
//! Each slot walks a fixed, ordered candidate-name list and takes the first
//! present field whose value parses. Per-candidate parse attempts return
//! `Option` and are folded first-success; nothing in this module raises for
//! a field that merely fails to parse.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::layout::SpatialDocument;

use super::generic::{ExtractionStatus, GenericDocumentData};
use super::slip::{BankSlipData, SlipStatus};
use super::FormatContext;

/// Candidate field names per slot, in priority order.
pub const DATE_CANDIDATES: &[&str] = &["Date", "TransactionDate", "Time", "DateTime", "When"];

/// Fee and Cost are historical substitutes for a missing primary total; a
/// Fee-sourced amount is semantically a different number, so the provenance
/// note always names the field that won.
pub const AMOUNT_CANDIDATES: &[&str] = &["Total", "Amount", "GrandTotal", "NetAmount", "Fee", "Cost"];

pub const RECIPIENT_CANDIDATES: &[&str] = &["To", "Recipient", "ReceiverName", "Payee", "Beneficiary"];

/// Transliterated-name fields, consulted only for dual-language formats.
pub const RECIPIENT_ENGLISH_CANDIDATES: &[&str] = &["ToEnglish", "RecipientEnglish", "ReceiverNameEng"];

pub const SENDER_ACCOUNT_CANDIDATES: &[&str] = &["FromAccount", "SenderAccount", "From"];

pub const RECEIVER_ACCOUNT_CANDIDATES: &[&str] = &["ToAccount", "ReceiverAccount", "AccountNumber"];

pub const MEMO_CANDIDATES: &[&str] = &["Memo", "Note", "Notes", "Reference", "Ref"];

static BUDDHIST_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(25\d{2})\b").unwrap());

static CURRENCY_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)฿|thb|บาท|baht").unwrap());

static RECIPIENT_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:to|amount|fee|name)\s*:\s*|^(?:ถึง|ไปยัง|ชื่อบัญชี|ชื่อ|จำนวนเงิน|ค่าธรรมเนียม)\s*:?\s*")
        .unwrap()
});

/// Thai month tokens, full names before abbreviations so the longest token
/// wins the scan.
const THAI_MONTHS: &[(&str, u32)] = &[
    ("มกราคม", 1),
    ("กุมภาพันธ์", 2),
    ("มีนาคม", 3),
    ("เมษายน", 4),
    ("พฤษภาคม", 5),
    ("มิถุนายน", 6),
    ("กรกฎาคม", 7),
    ("สิงหาคม", 8),
    ("กันยายน", 9),
    ("ตุลาคม", 10),
    ("พฤศจิกายน", 11),
    ("ธันวาคม", 12),
    ("ม.ค.", 1),
    ("ก.พ.", 2),
    ("มี.ค.", 3),
    ("เม.ย.", 4),
    ("พ.ค.", 5),
    ("มิ.ย.", 6),
    ("ก.ค.", 7),
    ("ส.ค.", 8),
    ("ก.ย.", 9),
    ("ต.ค.", 10),
    ("พ.ย.", 11),
    ("ธ.ค.", 12),
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y/%m/%d", "%d/%m/%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a slip date string.
///
/// Chain: Thai month-name normalization, then direct parse, then
/// Buddhist-era detection (a 4-digit year in the 2500s is converted by
/// -543 and reparsed), then separator normalization (`-`, `.` and space all
/// treated as `/`). A trailing time component is accepted and dropped.
pub fn parse_slip_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let base = normalize_thai_month(trimmed).unwrap_or_else(|| trimmed.to_string());
    parse_attempts(&base).or_else(|| {
        // Retry on the leading token alone when something rides along after
        // the date (a time, a weekday).
        let head = base.split_whitespace().next()?;
        (head != base).then(|| parse_attempts(head)).flatten()
    })
}

fn parse_attempts(text: &str) -> Option<NaiveDate> {
    try_formats(text)
        .or_else(|| convert_buddhist_year(text).and_then(|t| try_formats(&t)))
        .or_else(|| {
            let normalized = normalize_separators(text);
            if normalized == text {
                return None;
            }
            try_formats(&normalized)
                .or_else(|| convert_buddhist_year(&normalized).and_then(|t| try_formats(&t)))
        })
}

fn try_formats(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        // A year in the Buddhist-era range is not a sane direct parse; the
        // -543 conversion step owns those strings.
        .filter(|d| !(2500..=2599).contains(&d.year()))
}

/// Rewrites the first 4-digit Buddhist-era year (2500s) to its Gregorian
/// equivalent. Returns None when no such year is present.
fn convert_buddhist_year(text: &str) -> Option<String> {
    let caps = BUDDHIST_YEAR.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    Some(
        BUDDHIST_YEAR
            .replace(text, (year - 543).to_string())
            .into_owned(),
    )
}

fn normalize_separators(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '-' | '.' | ' ') { '/' } else { c })
        .collect()
}

/// Rewrites `12 ม.ค. 2568` style dates to `12/1/2568`. Must run before
/// separator normalization: the abbreviations contain dots.
fn normalize_thai_month(text: &str) -> Option<String> {
    for (token, month) in THAI_MONTHS {
        if text.contains(token) {
            let replaced = text.replacen(token, &format!("/{month}/"), 1);
            let collapsed: String = replaced.chars().filter(|c| !c.is_whitespace()).collect();
            return Some(collapsed.replace("//", "/"));
        }
    }
    None
}

/// Parses an amount string: currency tokens (symbol, ISO code, localized
/// word) and thousands separators are stripped, then the remainder must be
/// a non-negative decimal.
pub fn parse_amount(text: &str) -> Option<f64> {
    let stripped = CURRENCY_TOKENS.replace_all(text, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Strips label artifacts OCR tends to glue onto recipient names
/// ("to:", "ถึง", "จำนวนเงิน:"). Repeats until stable.
pub fn clean_recipient(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let next = RECIPIENT_BOILERPLATE.replace(&current, "").trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Keeps account digits and mask characters, dropping labels and spacing.
pub fn clean_account(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'x' | 'X' | '*' | '-'))
        .collect()
}

/// Maps the flat field set onto bank-slip slots.
///
/// Every successful mapping records `slot <- field` and the raw text in the
/// provenance notes; fields no slot consumed are preserved under the
/// `unmapped.` namespace. The returned status reflects structural success
/// only; the parser applies minimum-acceptance validation on top.
pub fn map_to_slip(
    generic: &GenericDocumentData,
    doc: &SpatialDocument,
    format: &FormatContext,
    parser_name: &str,
) -> BankSlipData {
    let mut slip = BankSlipData::empty(parser_name, fallback_date(doc));
    slip.notes.extend(
        generic
            .notes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    if generic.status == ExtractionStatus::Failed {
        slip.status = SlipStatus::Failed;
        slip.error = generic.failure_reason.clone();
        return slip;
    }

    // Date: first candidate that parses; otherwise the fallback date stays
    // and the fallback source is recorded. The result never carries a
    // zero/default date.
    let mut date_found = false;
    for name in DATE_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            if let Some(date) = parse_slip_date(raw) {
                slip.transaction_date = date;
                slip.note("date", format_args!("{name}: {raw}"));
                date_found = true;
                break;
            }
        }
    }
    if !date_found {
        slip.note("date.fallback", fallback_date_source(doc));
        debug!(date = %slip.transaction_date, "no parseable date field, using fallback");
    }

    // Amount: first candidate that parses wins; later candidates are not
    // tried once one succeeds.
    for name in AMOUNT_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            if let Some(amount) = parse_amount(raw) {
                slip.amount = amount;
                slip.note("amount", format_args!("{name}: {raw}"));
                break;
            }
        }
    }

    for name in RECIPIENT_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            let cleaned = clean_recipient(raw);
            if !cleaned.is_empty() {
                slip.receiver_name = cleaned;
                slip.note("recipient", format_args!("{name}: {raw}"));
                break;
            }
        }
    }

    if format.dual_language {
        for name in RECIPIENT_ENGLISH_CANDIDATES {
            if let Some(raw) = generic.field_text(name) {
                let cleaned = clean_recipient(raw);
                if !cleaned.is_empty() {
                    slip.receiver_name_english = cleaned;
                    slip.note("recipient.english", format_args!("{name}: {raw}"));
                    break;
                }
            }
        }
    }

    for name in SENDER_ACCOUNT_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            let cleaned = clean_account(raw);
            if !cleaned.is_empty() {
                slip.sender_account = cleaned;
                slip.note("sender_account", format_args!("{name}: {raw}"));
                break;
            }
        }
    }

    for name in RECEIVER_ACCOUNT_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            let cleaned = clean_account(raw);
            if !cleaned.is_empty() {
                slip.receiver_account = cleaned;
                slip.note("receiver_account", format_args!("{name}: {raw}"));
                break;
            }
        }
    }

    for name in MEMO_CANDIDATES {
        if let Some(raw) = generic.field_text(name) {
            slip.memo = raw.to_string();
            slip.note("memo", format_args!("{name}: {raw}"));
            break;
        }
    }

    // Fields with no mapping target in this run are kept for debugging and
    // future pattern authoring, not discarded.
    let mut known: Vec<&str> = Vec::new();
    known.extend_from_slice(DATE_CANDIDATES);
    known.extend_from_slice(AMOUNT_CANDIDATES);
    known.extend_from_slice(RECIPIENT_CANDIDATES);
    if format.dual_language {
        known.extend_from_slice(RECIPIENT_ENGLISH_CANDIDATES);
    }
    known.extend_from_slice(SENDER_ACCOUNT_CANDIDATES);
    known.extend_from_slice(RECEIVER_ACCOUNT_CANDIDATES);
    known.extend_from_slice(MEMO_CANDIDATES);
    for (name, field) in &generic.fields {
        if !known.contains(&name.as_str()) {
            slip.notes
                .insert(format!("unmapped.{name}"), field.text.clone());
        }
    }

    slip.status = SlipStatus::Completed;
    slip
}

/// The date used when no field yields one: the source file's last-modified
/// timestamp, else the document's creation time.
fn fallback_date(doc: &SpatialDocument) -> NaiveDate {
    file_mtime(doc)
        .unwrap_or_else(|| doc.created_at())
        .date_naive()
}

fn fallback_date_source(doc: &SpatialDocument) -> &'static str {
    if file_mtime(doc).is_some() {
        "source file mtime"
    } else {
        "document created_at"
    }
}

fn file_mtime(doc: &SpatialDocument) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(doc.source_path()).ok()?.modified().ok()?;
    Some(modified.into())
}
