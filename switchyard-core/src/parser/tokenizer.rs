//! Tokenizer for raw request lines.
//!
//! Splits a line on whitespace with shell-like quoting: double quotes
//! group text and honor backslash escapes, single quotes group text
//! literally, and quoted and unquoted segments concatenate within one
//! token. Tokens carry no quote characters once split.

use crate::error::ParseError;

/// Split a raw request line into tokens.
///
/// An unclosed quote or a trailing backslash rejects the whole line with
/// `ParseError::UnbalancedQuotes`.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(ParseError::UnbalancedQuotes),
                        },
                        Some(other) => current.push(other),
                        None => return Err(ParseError::UnbalancedQuotes),
                    }
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => current.push(other),
                        None => return Err(ParseError::UnbalancedQuotes),
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(ParseError::UnbalancedQuotes),
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
