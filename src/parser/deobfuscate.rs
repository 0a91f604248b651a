//! Recovery of coordinator addresses hidden behind `prefix-hexpairs` tokens.
//!
//! Each character is stored as `byte + mask` where
//! `mask = (pairs % modulus) + offset`. Neither parameter is published, so
//! every combination in the bounded range is tried until the decoding looks
//! like an address.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const PARAM_RANGE: std::ops::RangeInclusive<u32> = 1..=19;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+@.+\..+$").expect("email pattern is valid"));

/// Returns the decoded address, or `None` when no parameter pair yields one.
pub fn deobfuscate(token: &str) -> Option<String> {
    let (_, hex) = token.split_once('-')?;
    let bytes = decode_hex(hex)?;

    for modulus in PARAM_RANGE {
        for offset in PARAM_RANGE {
            let mask = (bytes.len() as u32) % modulus + offset;
            if let Some(candidate) = unmask(&bytes, mask) {
                if EMAIL_SHAPE.is_match(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }

    debug!("no parameter combination decodes token {token:?}");
    None
}

fn decode_hex(hex: &str) -> Option<Vec<u32>> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u32::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn unmask(bytes: &[u32], mask: u32) -> Option<String> {
    bytes
        .iter()
        .map(|b| b.checked_sub(mask).and_then(char::from_u32))
        .collect()
}
