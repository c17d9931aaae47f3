//! Multi-pass redaction over normalized text.
//!
//! Categories are detected in priority order (email, phone, name label, name,
//! institution, prestige); a later category never claims bytes an earlier one
//! already holds. Every detector sees only free segments: the text between
//! spans already taken and between placeholders left by an earlier run. Rounds
//! repeat until one finds nothing, so a second run over the output sees the
//! same segments and finds nothing either. All replacements are applied in one
//! left-to-right rewrite.

use std::cmp::Reverse;

use tracing::debug;

use crate::anonymize::names::tokenize;
use crate::anonymize::patterns::{PatternSet, MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};
use crate::models::document::{AnonymizedDocument, RawDocument, RedactionCategory, RedactionEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    category: RedactionCategory,
}

/// A free stretch of the text, with its absolute offset.
#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    offset: usize,
    text: &'a str,
    /// True when the segment begins a line of the full text.
    line_start: bool,
}

/// Replaces every email, phone number, listed name and institution cue in
/// `doc` with its category placeholder.
///
/// Deterministic and idempotent: `anonymize(anonymize(d)) == anonymize(d)`.
pub fn anonymize(doc: &RawDocument, patterns: &PatternSet) -> AnonymizedDocument {
    let text = normalize_whitespace(&doc.text);
    let spans = detect(&text, patterns);
    let anonymized = rewrite(&text, &spans);

    debug!(
        "Redacted {} span(s): email={} phone={} name={} institution={}",
        anonymized.ledger.len(),
        anonymized.count(RedactionCategory::Email),
        anonymized.count(RedactionCategory::Phone),
        anonymized.count(RedactionCategory::Name),
        anonymized.count(RedactionCategory::Institution),
    );

    anonymized
}

/// CRLF/CR to LF, horizontal whitespace runs collapsed, lines trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn detect(text: &str, patterns: &PatternSet) -> Vec<Span> {
    let reserved = placeholder_ranges(text);
    let mut accepted: Vec<Span> = Vec::new();

    loop {
        let before = accepted.len();
        detect_round(text, patterns, &reserved, &mut accepted);
        if accepted.len() == before {
            break;
        }
    }

    accepted.sort_by_key(|s| s.start);
    accepted
}

/// One pass of every detector, each over the segments left free by the
/// stages before it.
fn detect_round(
    text: &str,
    patterns: &PatternSet,
    reserved: &[(usize, usize)],
    accepted: &mut Vec<Span>,
) {
    let emails = scan(text, reserved, accepted.as_slice(), RedactionCategory::Email, |seg| {
        regex_matches(seg.text, patterns.email())
    });
    accept_greedy(accepted, emails);

    let phones = scan(text, reserved, accepted.as_slice(), RedactionCategory::Phone, |seg| {
        patterns
            .phones()
            .iter()
            .flat_map(|re| regex_matches(seg.text, re))
            .filter(|&(s, e)| is_phone(seg.text, s, e))
            .collect()
    });
    accept_greedy(accepted, phones);

    let labels = scan(text, reserved, accepted.as_slice(), RedactionCategory::Name, |seg| {
        label_candidates(seg, patterns)
    });
    accept_greedy(accepted, labels);

    let names = scan(text, reserved, accepted.as_slice(), RedactionCategory::Name, |seg| {
        let tokens = tokenize(seg.text);
        patterns.names().find_spans(seg.text, &tokens, |_, _| false)
    });
    accept_greedy(accepted, names);

    let institutions = scan(
        text,
        reserved,
        accepted.as_slice(),
        RedactionCategory::Institution,
        |seg| regex_matches(seg.text, patterns.institution()),
    );
    accept_greedy(accepted, institutions);

    let prestige = scan(
        text,
        reserved,
        accepted.as_slice(),
        RedactionCategory::Institution,
        |seg| {
            let tokens = tokenize(seg.text);
            patterns.prestige().find_spans(seg.text, &tokens, |_, _| false)
        },
    );
    accept_greedy(accepted, prestige);
}

/// Byte ranges of placeholders already present in the text.
fn placeholder_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = RedactionCategory::ALL
        .iter()
        .flat_map(|c| {
            let p = c.placeholder();
            text.match_indices(p).map(move |(i, _)| (i, i + p.len()))
        })
        .collect();
    ranges.sort_unstable();
    ranges
}

/// Runs `find` on every free segment and lifts its segment-relative ranges
/// to candidate spans.
fn scan(
    text: &str,
    reserved: &[(usize, usize)],
    accepted: &[Span],
    category: RedactionCategory,
    find: impl Fn(Segment<'_>) -> Vec<(usize, usize)>,
) -> Vec<Span> {
    let mut taken: Vec<(usize, usize)> = accepted.iter().map(|s| (s.start, s.end)).collect();
    taken.extend_from_slice(reserved);

    let mut out = Vec::new();
    for (start, end) in free_segments(text.len(), &taken) {
        let segment = Segment {
            offset: start,
            text: &text[start..end],
            line_start: start == 0 || text[..start].ends_with('\n'),
        };
        for (s, e) in find(segment) {
            out.push(Span {
                start: segment.offset + s,
                end: segment.offset + e,
                category,
            });
        }
    }
    out
}

fn overlaps(accepted: &[Span], start: usize, end: usize) -> bool {
    accepted.iter().any(|s| s.start < end && start < s.end)
}

/// Byte ranges of a `len`-byte text not covered by any taken range.
fn free_segments(len: usize, taken: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut taken = taken.to_vec();
    taken.sort_unstable();

    let mut segments = Vec::new();
    let mut cursor = 0;
    for (start, end) in taken {
        if start > cursor {
            segments.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < len {
        segments.push((cursor, len));
    }
    segments
}

/// Earliest start first, longest first at equal starts; overlapping losers dropped.
fn accept_greedy(accepted: &mut Vec<Span>, mut candidates: Vec<Span>) {
    candidates.sort_by_key(|s| (s.start, Reverse(s.end - s.start)));
    for candidate in candidates {
        if candidate.start < candidate.end && !overlaps(accepted, candidate.start, candidate.end) {
            accepted.push(candidate);
        }
    }
}

fn regex_matches(text: &str, re: &regex::Regex) -> Vec<(usize, usize)> {
    re.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

/// 7 to 15 digits, no digit directly before or after, not a date or year range.
fn is_phone(text: &str, start: usize, end: usize) -> bool {
    let candidate = &text[start..end];
    let digits = candidate.chars().filter(char::is_ascii_digit).count();
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
        && !before.is_some_and(|c| c.is_ascii_digit())
        && !after.is_some_and(|c| c.is_ascii_digit())
        && !is_date_like(candidate)
}

/// `2018-2020`, `2019.01.15`, `15-01-2019`.
fn is_date_like(candidate: &str) -> bool {
    let groups: Vec<&str> = candidate.split(|c: char| matches!(c, '.' | '-' | '/')).collect();
    if !groups
        .iter()
        .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
    {
        return false;
    }
    let is_year = |g: &str| g.len() == 4 && (g.starts_with("19") || g.starts_with("20"));
    match groups[..] {
        [a, b] => is_year(a) && is_year(b),
        [a, m, d] if m.len() == 2 && d.len() == 2 => is_year(a),
        [d, m, y] if d.len() == 2 && m.len() == 2 => is_year(y),
        _ => false,
    }
}

/// Values of `Name:` label lines. A segment that starts mid-line cannot open
/// a label; the value ends where the segment does.
fn label_candidates(segment: Segment<'_>, patterns: &PatternSet) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for caps in patterns.name_label().captures_iter(segment.text) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() == 0 && !segment.line_start {
            continue;
        }
        let candidate = value.as_str().trim_end_matches(|c: char| !c.is_alphanumeric());
        if !candidate.chars().any(char::is_alphanumeric) {
            continue;
        }
        out.push((value.start(), value.start() + candidate.len()));
    }
    out
}

fn rewrite(text: &str, spans: &[Span]) -> AnonymizedDocument {
    let mut out = String::with_capacity(text.len());
    let mut ledger = Vec::with_capacity(spans.len());
    let mut cursor = 0;

    for span in spans {
        out.push_str(&text[cursor..span.start]);
        let replacement = span.category.placeholder();
        out.push_str(replacement);
        ledger.push(RedactionEntry {
            category: span.category,
            original_len: text[span.start..span.end].chars().count(),
            replacement: replacement.to_string(),
        });
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    AnonymizedDocument { text: out, ledger }
}
