//! Intelligence extractors, one regex scan per category.
//!
//! Every extractor is total over strings: no match means an empty set.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::Intelligence;

/// Payment handle: `name@bank`.
static UPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w.\-]{2,}@[a-zA-Z]{2,}\b").unwrap());

/// Bank account: 9 to 18 digits.
static BANK_ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());

/// IFSC: 4 letters, a literal zero, 6 alphanumerics. Applied to upper-cased text.
static IFSC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{4}0[A-Z0-9]{6}\b").unwrap());

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// Card number: exactly 16 digits.
static CARD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{16}\b").unwrap());

/// One-time code: 4 to 6 digits.
static OTP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,6}\b").unwrap());

fn find_all(re: &Regex, text: &str) -> BTreeSet<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_upi_ids(text: &str) -> BTreeSet<String> {
    find_all(&UPI_RE, text)
}

pub fn extract_bank_accounts(text: &str) -> BTreeSet<String> {
    find_all(&BANK_ACCOUNT_RE, text)
}

/// Matches are returned upper-cased, whatever case the scammer typed.
pub fn extract_ifsc_codes(text: &str) -> BTreeSet<String> {
    find_all(&IFSC_RE, &text.to_uppercase())
}

/// Anything after `http://` or `https://` up to the next whitespace, trailing
/// punctuation included.
pub fn extract_urls(text: &str) -> BTreeSet<String> {
    find_all(&URL_RE, text)
}

pub fn extract_card_numbers(text: &str) -> BTreeSet<String> {
    find_all(&CARD_RE, text)
}

pub fn extract_otp_codes(text: &str) -> BTreeSet<String> {
    find_all(&OTP_RE, text)
}

/// Run all six extractors over one message.
pub fn extract_all(text: &str) -> Intelligence {
    Intelligence {
        upi_ids: extract_upi_ids(text),
        bank_accounts: extract_bank_accounts(text),
        ifsc_codes: extract_ifsc_codes(text),
        phishing_urls: extract_urls(text),
        card_numbers: extract_card_numbers(text),
        otp_codes: extract_otp_codes(text),
    }
}
