//! Tab completion of the last token.

/// Outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The line after completion (unchanged when nothing applies).
    pub line: String,
    /// Candidate keywords, two spaces apart, when more than one matched.
    pub listing: Option<String>,
}

impl Completion {
    pub(crate) fn unchanged(line: &str) -> Self {
        Self {
            line: line.to_string(),
            listing: None,
        }
    }
}

/// Replace the token starting at byte `start` using `candidates`.
///
/// A single candidate is inserted whole with a trailing space. Several
/// candidates extend the token to their longest common prefix and are
/// listed.
pub(crate) fn fill(line: &str, start: usize, candidates: &[&str]) -> Completion {
    let head = &line[..start];
    match candidates {
        [] => Completion::unchanged(line),
        [only] => Completion {
            line: format!("{head}{only} "),
            listing: None,
        },
        [first, others @ ..] => Completion {
            line: format!("{head}{}", common_prefix(first, others)),
            listing: Some(candidates.join("  ")),
        },
    }
}

/// Longest prefix of `first` shared by every string in `others`.
fn common_prefix<'a>(first: &'a str, others: &[&str]) -> &'a str {
    let mut len = first.len();
    for other in others {
        let shared = first
            .char_indices()
            .zip(other.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8());
        len = len.min(shared);
    }
    &first[..len]
}
