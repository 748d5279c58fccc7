use crate::error::CoreError;

/// A lexical token of the formula language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A real numeric literal.
    Number(f64),
    /// A numeric literal with a trailing `i`: `2.5i`.
    Imaginary(f64),
    /// Variable, constant, or function name.
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

/// A token with the byte offset it started at, for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

fn lex_error(position: usize, message: impl Into<String>) -> CoreError {
    CoreError::FormulaParse {
        position,
        message: message.into(),
    }
}

/// Tokenize a formula string.
///
/// Numerals allow an optional fraction and an `e±N` exponent (the `e` is
/// consumed only when digits follow, so `2e` lexes as `2` then the
/// constant `e`). A numeral directly followed by a standalone `i` becomes an
/// imaginary literal.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, CoreError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let b = bytes[pos];
        let token = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => {
                pos += 1;
                Token::Plus
            }
            b'-' => {
                pos += 1;
                Token::Minus
            }
            b'*' => {
                pos += 1;
                Token::Star
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'^' => {
                pos += 1;
                Token::Caret
            }
            b'(' => {
                pos += 1;
                Token::LParen
            }
            b')' => {
                pos += 1;
                Token::RParen
            }
            b',' => {
                pos += 1;
                Token::Comma
            }
            b'0'..=b'9' | b'.' => {
                let (value, next) = lex_number(bytes, pos)?;
                pos = next;
                // A trailing standalone `i` marks an imaginary literal.
                if pos < bytes.len()
                    && bytes[pos] == b'i'
                    && !matches!(bytes.get(pos + 1), Some(c) if c.is_ascii_alphanumeric() || *c == b'_')
                {
                    pos += 1;
                    Token::Imaginary(value)
                } else {
                    Token::Number(value)
                }
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = pos + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let ident = std::str::from_utf8(&bytes[pos..end])
                    .map_err(|_| lex_error(pos, "invalid identifier"))?
                    .to_string();
                pos = end;
                Token::Ident(ident)
            }
            _ => {
                return Err(lex_error(
                    pos,
                    format!("unexpected character {:?}", bytes[pos] as char),
                ))
            }
        };
        tokens.push(SpannedToken {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// Lex a numeral starting at `pos`; returns the value and the next offset.
fn lex_number(bytes: &[u8], pos: usize) -> Result<(f64, usize), CoreError> {
    let start = pos;
    let mut end = pos;
    let mut seen_digit = false;
    let mut seen_point = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_point => {
                seen_point = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return Err(lex_error(start, "expected digit"));
    }

    // Exponent only when digits (optionally signed) actually follow.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut probe = end + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            probe += 1;
            while probe < bytes.len() && bytes[probe].is_ascii_digit() {
                probe += 1;
            }
            end = probe;
        }
    }

    let text = std::str::from_utf8(&bytes[start..end])
        .map_err(|_| lex_error(start, "invalid numeral"))?;
    let value = text
        .parse::<f64>()
        .map_err(|_| lex_error(start, format!("invalid numeral {text:?}")))?;
    Ok((value, end))
}
