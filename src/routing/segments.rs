//! Request path splitting and segment decoding.
//!
//! # Responsibilities
//! - Strip query and fragment from an incoming path
//! - Split the path on '/' and extract a registered custom verb
//! - Percent-decode segments once per lookup
//!
//! # Design Decisions
//! - A segment that fails to decode never equals a literal, but wildcard
//!   captures still see its raw text
//! - Multi-segment captures keep `%2F` encoded so the '/'-join is unambiguous

use std::borrow::Cow;
use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Why a path segment could not be percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid percent escape at byte {0}")]
    InvalidEscape(usize),
    #[error("decoded segment is not valid UTF-8")]
    InvalidUtf8,
}

/// Split a request path into raw segments and a custom verb.
///
/// `is_verb` decides whether the text after the last ':' of the last segment
/// is a custom verb. Returns `None` for paths without a leading '/'.
pub fn split_path<'a>(
    path: &'a str,
    is_verb: impl Fn(&str) -> bool,
) -> Option<(Vec<&'a str>, &'a str)> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some((Vec::new(), ""));
    }

    let mut segments: Vec<&str> = rest.split('/').collect();
    let mut verb = "";
    if let Some(last) = segments.last_mut() {
        let current: &'a str = *last;
        if let Some((head, suffix)) = current.rsplit_once(':') {
            if !suffix.is_empty() && is_verb(suffix) {
                verb = suffix;
                *last = head;
            }
        }
    }

    Some((segments, verb))
}

/// Percent-decode one path segment.
pub fn decode_segment(raw: &str) -> Result<Cow<'_, str>, DecodeError> {
    check_escapes(raw)?;
    percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// `percent_decode_str` passes malformed escapes through untouched; reject them instead.
fn check_escapes(raw: &str) -> Result<(), DecodeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DecodeError::InvalidEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// A request path segment with its decoded text computed once.
#[derive(Debug, Clone)]
pub(crate) struct DecodedSegment<'a> {
    raw: &'a str,
    text: Option<Cow<'a, str>>,
}

impl<'a> DecodedSegment<'a> {
    pub(crate) fn new(raw: &'a str) -> Self {
        Self {
            raw,
            text: decode_segment(raw).ok(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Decoded text, if the segment decoded cleanly.
    pub(crate) fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Value bound by a single-segment capture.
    pub(crate) fn capture(&self) -> &str {
        self.text.as_deref().unwrap_or(self.raw)
    }

    /// Value contributed to a multi-segment capture.
    pub(crate) fn capture_keeping_slash(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for (i, piece) in split_encoded_slash(self.raw).enumerate() {
            if i > 0 {
                out.push_str("%2F");
            }
            match decode_segment(piece) {
                Ok(decoded) => out.push_str(&decoded),
                Err(_) => out.push_str(piece),
            }
        }
        out
    }
}

fn split_encoded_slash(raw: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(raw);
    std::iter::from_fn(move || {
        let current = rest?;
        let found = current
            .as_bytes()
            .windows(3)
            .position(|w| w[0] == b'%' && w[1] == b'2' && (w[2] == b'F' || w[2] == b'f'));
        match found {
            Some(at) => {
                rest = Some(&current[at + 3..]);
                Some(&current[..at])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
