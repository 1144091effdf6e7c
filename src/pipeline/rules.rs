//! Scam vocabulary rules.
//!
//! A fixed keyword list, matched as lower-cased substrings with no word
//! boundaries, so "linked" trips on "link" and "cardboard" on "card".

/// Keywords that flag a message as scam-like.
pub const SCAM_KEYWORDS: &[&str] = &[
    "upi", "account", "bank", "ifsc", "otp", "card", "blocked", "verify", "click", "link",
    "transfer", "refund", "payment",
];

/// Does the message contain any scam keyword?
pub fn is_scam(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SCAM_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Every keyword present in the message, in list order. Used for logging.
pub fn matched_keywords(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    SCAM_KEYWORDS
        .iter()
        .copied()
        .filter(|k| lowered.contains(k))
        .collect()
}
