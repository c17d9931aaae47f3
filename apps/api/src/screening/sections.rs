//! Section Segmenter — best-effort, line-based split of a resume into labeled sections.
//!
//! A header is either a whole line naming a section (`Experience`, `## Skills:`)
//! or a cue followed by a colon anywhere in a line (`... Skills: Python`).
//! Text before the first header is the summary; with no header at all the
//! whole document becomes a single `Other` section.

use crate::models::document::{AnonymizedDocument, Section, SectionLabel, SectionedDocument};

/// Header cues, longest first so `technical skills` wins over `skills`.
const HEADER_CUES: &[(&str, SectionLabel)] = &[
    ("tools and technologies", SectionLabel::Skills),
    ("professional experience", SectionLabel::Experience),
    ("educational background", SectionLabel::Education),
    ("professional summary", SectionLabel::Summary),
    ("academic background", SectionLabel::Education),
    ("project experience", SectionLabel::Experience),
    ("employment history", SectionLabel::Experience),
    ("core competencies", SectionLabel::Skills),
    ("technical skills", SectionLabel::Skills),
    ("work experience", SectionLabel::Experience),
    ("qualifications", SectionLabel::Education),
    ("certifications", SectionLabel::Education),
    ("technologies", SectionLabel::Skills),
    ("competencies", SectionLabel::Skills),
    ("work history", SectionLabel::Experience),
    ("volunteering", SectionLabel::Other),
    ("employment", SectionLabel::Experience),
    ("experience", SectionLabel::Experience),
    ("references", SectionLabel::Other),
    ("key skills", SectionLabel::Skills),
    ("languages", SectionLabel::Other),
    ("interests", SectionLabel::Other),
    ("education", SectionLabel::Education),
    ("objective", SectionLabel::Summary),
    ("projects", SectionLabel::Experience),
    ("about me", SectionLabel::Summary),
    ("summary", SectionLabel::Summary),
    ("profile", SectionLabel::Summary),
    ("hobbies", SectionLabel::Other),
    ("awards", SectionLabel::Other),
    ("skills", SectionLabel::Skills),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InlineHeader {
    start: usize,
    content_start: usize,
    label: SectionLabel,
}

pub fn segment(doc: &AnonymizedDocument) -> SectionedDocument {
    let mut sections = Vec::new();
    let mut label = SectionLabel::Summary;
    let mut buffer: Vec<&str> = Vec::new();
    let mut headers_found = false;

    for line in doc.text.lines() {
        if let Some(header) = whole_line_header(line) {
            flush(&mut sections, label, &mut buffer, headers_found);
            label = header;
            headers_found = true;
            continue;
        }

        let inline = inline_headers(line);
        let Some(first) = inline.first() else {
            buffer.push(line);
            continue;
        };

        let lead = line[..first.start].trim();
        if !lead.is_empty() {
            buffer.push(lead);
        }
        for (i, header) in inline.iter().enumerate() {
            flush(&mut sections, label, &mut buffer, headers_found);
            label = header.label;
            headers_found = true;

            let end = inline.get(i + 1).map_or(line.len(), |next| next.start);
            let content = line[header.content_start..end].trim();
            if !content.is_empty() {
                buffer.push(content);
            }
        }
    }

    if !headers_found {
        return SectionedDocument {
            sections: vec![Section {
                label: SectionLabel::Other,
                text: doc.text.clone(),
            }],
            headers_found: false,
        };
    }

    flush(&mut sections, label, &mut buffer, true);
    SectionedDocument {
        sections,
        headers_found,
    }
}

/// Header-opened sections are kept even when empty; the preamble only when it has text.
fn flush(sections: &mut Vec<Section>, label: SectionLabel, buffer: &mut Vec<&str>, opened_by_header: bool) {
    let text = buffer.join("\n").trim().to_string();
    buffer.clear();
    if opened_by_header || !text.is_empty() {
        sections.push(Section { label, text });
    }
}

fn lookup_cue(candidate: &str) -> Option<SectionLabel> {
    HEADER_CUES
        .iter()
        .find(|(cue, _)| candidate.eq_ignore_ascii_case(cue))
        .map(|&(_, label)| label)
}

fn whole_line_header(line: &str) -> Option<SectionLabel> {
    let stripped = line.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '#' | '*' | '-' | '=' | '_' | ':' | '\u{2022}')
    });
    if stripped.is_empty() {
        return None;
    }
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    lookup_cue(&collapsed)
}

/// `cue:` occurrences inside a line, left to right, non-overlapping.
fn inline_headers(line: &str) -> Vec<InlineHeader> {
    let lower = line.to_ascii_lowercase();
    let mut found: Vec<InlineHeader> = Vec::new();

    for &(cue, label) in HEADER_CUES {
        for (start, _) in lower.match_indices(cue) {
            let preceded_ok = lower[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            if !preceded_ok {
                continue;
            }
            let after = &lower[start + cue.len()..];
            let spaces = after.len() - after.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
            if !after[spaces..].starts_with(':') {
                continue;
            }
            let end = start + cue.len();
            let overlapping = found.iter().any(|h| start < h.content_start && h.start < end);
            if !overlapping {
                found.push(InlineHeader {
                    start,
                    content_start: end + spaces + 1,
                    label,
                });
            }
        }
    }

    found.sort_by_key(|h| h.start);
    found
}
