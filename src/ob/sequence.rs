//! Observing-sequence tokenization.
//!
//! A sequence line is a whitespace-separated list of tokens, each either
//! the literal `sky` or an object label, optionally interleaved with
//! `swap` markers in the dual off-axis modes. Swap markers split the line
//! into segments; each segment becomes one template.

use crate::error::ConfigError;

/// One swap-delimited part of a sequence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A bare FT/SC role exchange, no exposures.
    Swap,
    /// A run of exposure tokens (`sky` or object labels).
    Exposures(Vec<String>),
}

/// Token marking a sky exposure (case-insensitive).
pub fn is_sky(token: &str) -> bool {
    token.eq_ignore_ascii_case("sky")
}

/// Split a sequence line into swap-delimited segments.
///
/// When `allow_swap` is false (any mode other than dual off-axis), a
/// `swap` token is a configuration error.
pub fn split_segments(
    line: &str,
    allow_swap: bool,
    ob: &str,
) -> Result<Vec<Segment>, ConfigError> {
    let mut segments = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for token in line.split_whitespace() {
        if token == "swap" {
            if !allow_swap {
                return Err(ConfigError::SwapNotAllowed { ob: ob.to_string() });
            }
            if !current.is_empty() {
                segments.push(Segment::Exposures(std::mem::take(&mut current)));
            }
            segments.push(Segment::Swap);
        } else {
            current.push(token.to_string());
        }
    }
    if !current.is_empty() {
        segments.push(Segment::Exposures(current));
    }
    Ok(segments)
}

/// Distinct non-sky labels in a segment, in first-appearance order.
pub fn distinct_objects(tokens: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for token in tokens {
        if !is_sky(token) && !seen.contains(&token.as_str()) {
            seen.push(token);
        }
    }
    seen
}
