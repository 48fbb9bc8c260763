//! Expiry extraction from free-form WHOIS answers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::WhoisError;

static EXPIRY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Registry Expiry Date:\s*(.+)",
        r"(?i)Registrar Registration Expiration Date:\s*(.+)",
        r"(?i)Expir(?:y|ation) Date:\s*(.+)",
        r"(?i)Expiration Time:\s*(.+)",
        r"(?i)Expires On:\s*(.+)",
        r"(?i)Expires:\s*(.+)",
        r"(?i)Valid Until:\s*(.+)",
        r"(?i)paid-till:\s*(.+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const NOT_FOUND_MARKERS: [&str; 8] = [
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "status: free",
    "status: available",
    "domain not found",
    "no object found",
];

const RATE_LIMIT_MARKERS: [&str; 3] = ["limit exceeded", "quota exceeded", "too many requests"];

const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%b %d %Y",
];

/// `Ok(None)` means the answer was understood but carries no usable expiry.
pub fn parse_expiration(raw: &str) -> std::result::Result<Option<DateTime<Utc>>, WhoisError> {
    if raw.trim().is_empty() {
        return Err(WhoisError::Empty);
    }

    for re in EXPIRY_PATTERNS.iter() {
        for caps in re.captures_iter(raw) {
            if let Some(dt) = caps.get(1).and_then(|m| parse_date(m.as_str())) {
                return Ok(Some(dt));
            }
        }
    }

    let lower = raw.to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|p| lower.contains(p)) {
        return Err(WhoisError::NotFound);
    }
    if RATE_LIMIT_MARKERS.iter().any(|p| lower.contains(p)) {
        return Err(WhoisError::RateLimited);
    }

    Ok(None)
}

/// Referral to a more specific WHOIS server, if the answer carries one.
pub fn extract_referral(raw: &str) -> Option<String> {
    static REFERRAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?im)^\s*refer:\s*(\S+)",
            r"(?i)Registrar WHOIS Server:\s*(.+)",
            r"(?i)Whois Server:\s*(.+)",
            r"(?i)ReferralServer:\s*whois://(.+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    REFERRAL_PATTERNS.iter().find_map(|re| {
        let server = re.captures(raw)?.get(1)?.as_str().trim().to_lowercase();
        let server = server
            .trim_start_matches("whois://")
            .trim_end_matches('/')
            .to_string();
        (!server.is_empty() && server.contains('.')).then_some(server)
    })
}

fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let cleaned = trimmed
        .replace(" (UTC)", "")
        .replace(" UTC", "Z")
        .replace(" +0000", "Z");

    for fmt in &DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt.and_utc());
        }
        if let Ok(d) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
