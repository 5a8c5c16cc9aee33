//! Splitting text into matched and unmatched runs for display.

/// A run of text and whether it matched one of the search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

impl<'a> Segment<'a> {
    fn plain(text: &'a str) -> Self {
        Self { text, matched: false }
    }

    fn hit(text: &'a str) -> Self {
        Self { text, matched: true }
    }
}

/// Split `text` into segments, marking case-insensitive occurrences of any
/// term.
///
/// Scans left to right; at each position the first term (in `terms` order)
/// that matches wins, and matches never overlap.
pub fn highlight<'a, S: AsRef<str>>(text: &'a str, terms: &[S]) -> Vec<Segment<'a>> {
    let terms: Vec<Vec<char>> = terms
        .iter()
        .map(|t| t.as_ref().trim().chars().collect::<Vec<_>>())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return vec![Segment::plain(text)];
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut last = 0;
    let mut i = 0;

    while i < chars.len() {
        let Some(len) = terms.iter().find_map(|term| match_len(&chars[i..], term)) else {
            i += 1;
            continue;
        };

        let start = chars[i].0;
        let end = chars.get(i + len).map_or(text.len(), |&(pos, _)| pos);
        if start > last {
            segments.push(Segment::plain(&text[last..start]));
        }
        segments.push(Segment::hit(&text[start..end]));
        last = end;
        i += len;
    }

    if last < text.len() {
        segments.push(Segment::plain(&text[last..]));
    }
    segments
}

fn match_len(rest: &[(usize, char)], term: &[char]) -> Option<usize> {
    if term.len() > rest.len() {
        return None;
    }
    let hit = rest
        .iter()
        .zip(term)
        .all(|(&(_, a), &b)| a == b || a.to_lowercase().eq(b.to_lowercase()));
    hit.then_some(term.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|s| if s.matched { format!("[{}]", s.text) } else { s.text.to_string() })
            .collect()
    }

    #[test]
    fn no_terms_yields_whole_text() {
        let segs = highlight("Sony A7", &[] as &[&str]);
        assert_eq!(segs, [Segment::plain("Sony A7")]);
    }

    #[test]
    fn marks_every_occurrence_case_insensitively() {
        let segs = highlight("Sony A7 sony", &["sony"]);
        assert_eq!(
            segs,
            [Segment::hit("Sony"), Segment::plain(" A7 "), Segment::hit("sony")]
        );
    }

    #[test]
    fn earlier_term_wins_at_same_position() {
        assert_eq!(render(&highlight("sony a7", &["so", "sony"])), "[so]ny a7");
        assert_eq!(render(&highlight("sony a7", &["sony", "so"])), "[sony] a7");
    }

    #[test]
    fn handles_multibyte_text() {
        let segs = highlight("Máy ảnh Sony cũ", &["ảnh", "cũ"]);
        assert_eq!(render(&segs), "Máy [ảnh] Sony [cũ]");
    }

    #[test]
    fn match_at_end_leaves_no_trailing_segment() {
        let segs = highlight("buy dji", &["DJI"]);
        assert_eq!(segs, [Segment::plain("buy "), Segment::hit("dji")]);
    }

    #[test]
    fn blank_terms_are_ignored() {
        let segs = highlight("abc", &["", "  "]);
        assert_eq!(segs, [Segment::plain("abc")]);
    }
}
