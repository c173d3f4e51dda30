//! Destination templates.
//!
//! A template is literal text with positional capture references:
//! `$1`, `$2`, ... or the delimited form `${1}` when digits follow the
//! reference. A `$` that does not start a reference is copied as-is.

use crate::rewrite::pattern::CaptureSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(usize),
}

/// A parsed destination template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Split `source` into literal runs and capture references.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            match parse_reference(after) {
                Some((index, consumed)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Capture(index));
                    rest = &after[consumed..];
                }
                None => {
                    literal.push('$');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Capture indices referenced by the template, in order of appearance.
    pub fn references(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(i) => Some(*i),
            Segment::Literal(_) => None,
        })
    }

    /// Largest referenced capture index (0 when there are none).
    pub fn max_index(&self) -> usize {
        self.references().max().unwrap_or(0)
    }

    /// Substitute captures into the template.
    ///
    /// References beyond the capture set expand to nothing; the engine
    /// rejects such templates before they can be used.
    pub fn expand(&self, captures: &CaptureSet) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Capture(i) => out.push_str(captures.get(*i).unwrap_or_default()),
            }
        }
        out
    }
}

/// Parse the reference following a `$`: returns the index and the number of
/// bytes consumed, or `None` if the text is not a reference.
fn parse_reference(after: &str) -> Option<(usize, usize)> {
    if let Some(inner) = after.strip_prefix('{') {
        let end = inner.find('}')?;
        let digits = &inner[..end];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return Some((parse_index(digits), end + 2));
    }

    let len = after.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    Some((parse_index(&after[..len]), len))
}

/// Digit run to capture index. Indices too large for `usize` saturate, so the
/// engine rejects them as out of range instead of treating them as text.
fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}
