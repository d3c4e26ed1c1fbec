//! Agent reply parsing
//!
//! Extracts structured side-effect data out of free-text agent replies:
//! zero-or-one fenced JSON reminder payload, and zero-or-more product-name
//! candidates for marketplace lookup. Pure text-to-data transformation,
//! no side effects.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use medgen_scheduler::ReminderPayload;

/// Opening marker of the fenced JSON block the reminder agent emits
pub const JSON_FENCE: &str = "```json";

/// Why a reply could not be parsed into a reminder
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("reply contains no fenced JSON block")]
    NoJsonBlock,
    #[error("fenced block is not a valid reminder payload: {0}")]
    InvalidShape(#[from] serde_json::Error),
    #[error("reminder time {0:?} is not an hour:minute pair")]
    BadTime(String),
}

#[derive(Debug, Deserialize)]
struct RawReminder {
    message: String,
    purpose: String,
    reminder_at: String,
}

/// Extract the reminder payload embedded in an agent reply.
///
/// The reply must contain a ```` ```json … ``` ```` fence enclosing an
/// object with `message`, `purpose` and `reminder_at` fields. The time is
/// normalized to zero-padded 24-hour "HH:MM" before being handed out.
pub fn parse_reminder(reply: &str) -> Result<ReminderPayload, ParseFailure> {
    let start = reply.find(JSON_FENCE).ok_or(ParseFailure::NoJsonBlock)?;
    let fenced = &reply[start + JSON_FENCE.len()..];
    let end = fenced.find("```").ok_or(ParseFailure::NoJsonBlock)?;

    let raw: RawReminder = serde_json::from_str(fenced[..end].trim())?;
    let fire_at = normalize_time(&raw.reminder_at)?;

    Ok(ReminderPayload {
        message: raw.message,
        purpose: raw.purpose,
        fire_at,
    })
}

/// Normalize a reminder time to zero-padded 24-hour "HH:MM".
///
/// A trailing "PM" adds 12 hours unless the hour is already 12; "12:xx AM"
/// maps to hour 0; anything else passes through with the meridiem token
/// stripped. The hour is deliberately not range-checked, so "13:00 PM"
/// normalizes to "25:00".
fn normalize_time(raw: &str) -> Result<String, ParseFailure> {
    let bad = || ParseFailure::BadTime(raw.to_string());

    let trimmed = raw.trim();
    let (hour_part, rest) = trimmed.split_once(':').ok_or_else(bad)?;
    let mut hour: u32 = hour_part.trim().parse().map_err(|_| bad())?;

    let minute_token = rest.split_whitespace().next().ok_or_else(bad)?;
    let minute_digits = minute_token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let minute: u32 = minute_digits.parse().map_err(|_| bad())?;

    let upper = trimmed.to_uppercase();
    if upper.contains("PM") {
        if hour != 12 {
            hour += 12;
        }
    } else if upper.contains("AM") && hour == 12 {
        hour = 0;
    }

    Ok(format!("{:02}:{:02}", hour, minute))
}

/// Product-category nouns a candidate must end in (or contain, if quoted)
const PRODUCT_KEYWORDS: [&str; 12] = [
    "medicine",
    "tablet",
    "capsule",
    "spray",
    "cream",
    "ointment",
    "syrup",
    "drops",
    "powder",
    "supplement",
    "vitamin",
    "pill",
];

// Quoted substrings containing a category noun, e.g. "Benadryl cough syrup"
static QUOTED_PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    let keywords = PRODUCT_KEYWORDS.join("|");
    Regex::new(&format!(r#"(?i)"([^"]*?(?:{keywords})[^"]*?)""#))
        .expect("quoted product pattern")
});

// Capitalized word-sequences ending in a category noun, e.g. Tylenol tablet
static TITLED_PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    let keywords = PRODUCT_KEYWORDS.join("|");
    Regex::new(&format!(
        r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?i:{keywords}))"
    ))
    .expect("titled product pattern")
});

/// Extract potential product names from an agent reply.
///
/// Returns a deduplicated set; iteration order is not guaranteed, so
/// callers (and tests) must treat the result as a set, not a sequence.
pub fn extract_product_candidates(reply: &str) -> HashSet<String> {
    let mut found = HashSet::new();
    for caps in QUOTED_PRODUCT
        .captures_iter(reply)
        .chain(TITLED_PRODUCT.captures_iter(reply))
    {
        let candidate = caps[1].trim();
        // Avoid very short matches
        if candidate.len() > 3 {
            found.insert(candidate.to_string());
        }
    }
    found
}
