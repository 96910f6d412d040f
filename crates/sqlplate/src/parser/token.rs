/// A piece of a tokenized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied to the output unchanged.
    Literal(&'a str),
    /// A placeholder token, including its leading colon (e.g. `:where`).
    Placeholder(&'a str),
}

/// Split a template into literal spans and placeholder tokens.
///
/// A placeholder is `:` followed by the longest run of ASCII lowercase letters.
/// A colon not followed by a lowercase letter stays literal text.
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < bytes.len() && bytes[end].is_ascii_lowercase() {
            end += 1;
        }
        if end == i + 1 {
            i += 1;
            continue;
        }

        if literal_start < i {
            segments.push(Segment::Literal(&template[literal_start..i]));
        }
        segments.push(Segment::Placeholder(&template[i..end]));
        literal_start = end;
        i = end;
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Number of placeholder tokens in `template`.
pub fn count_placeholders(template: &str) -> usize {
    tokenize(template)
        .iter()
        .filter(|s| matches!(s, Segment::Placeholder(_)))
        .count()
}
