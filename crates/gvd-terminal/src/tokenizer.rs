//! Line splitting with quote and backslash handling.
//!
//! Tokens are returned as borrowed spans of the input line. Quotes and
//! escapes are kept verbatim; it is up to the parameter extractor to strip
//! them for string values.

/// A token and its byte offset in the original line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
}

impl Token<'_> {
    /// Byte offset one past the token's end.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_quoted(&self) -> bool {
        self.text.starts_with('"')
    }
}

/// Malformed quoting, or too many tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxError {
    /// Byte offset of the offending character.
    pub position: usize,
}

/// Split `line` into at most `max_tokens` tokens.
///
/// Leading and trailing spaces are ignored and runs of spaces separate
/// tokens. A backslash protects the next character. A double quote toggles
/// quoting; a closing quote must be followed by a space or end of line.
pub fn tokenize(line: &str, max_tokens: usize) -> Result<Vec<Token<'_>>, SyntaxError> {
    let end = line.trim_end_matches(' ').len();
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut escaped = false;
    let mut in_quotes = false;
    let mut i = 0;

    while i < end {
        let b = bytes[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        if b == b' ' && !in_quotes {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &line[s..i],
                    start: s,
                });
            }
            i += 1;
            continue;
        }
        if start.is_none() {
            if tokens.len() == max_tokens {
                return Err(SyntaxError { position: i });
            }
            start = Some(i);
        }
        match b {
            b'\\' => escaped = true,
            b'"' if in_quotes => {
                in_quotes = false;
                if i + 1 < end && bytes[i + 1] != b' ' {
                    return Err(SyntaxError { position: i + 1 });
                }
            },
            b'"' => in_quotes = true,
            _ => {},
        }
        i += 1;
    }

    if in_quotes {
        return Err(SyntaxError { position: end });
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..end],
            start: s,
        });
    }
    Ok(tokens)
}
