//! Lexical analysis of a single command line.
//!
//! The shell has no quoting, so a line is nothing more than words separated by
//! whitespace and the four meta-characters `|`, `<`, `>` and `&`. Meta-characters
//! never need surrounding spaces: `ls|wc>out&` lexes exactly like `ls | wc > out &`.

use crate::error::SyntaxError;
use std::fmt;

/// Longest accepted line, in bytes, not counting the line terminator.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A program name, an argument or a redirection target.
    Word,
    /// The pipe operator, `|`.
    Pipe,
    /// Input redirection, `<`.
    RedirectIn,
    /// Output redirection, `>`.
    RedirectOut,
    /// Background marker, `&`.
    Background,
}

impl TokenKind {
    /// Returns the operator kind of a meta-character, or `None` for ordinary characters.
    pub fn of_meta(ch: char) -> Option<TokenKind> {
        match ch {
            '|' => Some(TokenKind::Pipe),
            '<' => Some(TokenKind::RedirectIn),
            '>' => Some(TokenKind::RedirectOut),
            '&' => Some(TokenKind::Background),
            _ => None,
        }
    }

    pub fn is_operator(self) -> bool {
        self != TokenKind::Word
    }
}

/// A token of a command line. Its text is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::Word,
        }
    }

    /// Builds the canonical token for an operator kind.
    pub fn operator(kind: TokenKind) -> Self {
        let text = match kind {
            TokenKind::Pipe => "|",
            TokenKind::RedirectIn => "<",
            TokenKind::RedirectOut => ">",
            TokenKind::Background => "&",
            TokenKind::Word => "",
        };
        debug_assert!(kind.is_operator(), "Token::operator called with Word");
        Token {
            text: text.to_string(),
            kind,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Strips a single trailing `\n` or `\r\n`.
fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Splits `line` into tokens.
///
/// Fails with [`SyntaxError::LineTooLong`] when the line, once its terminator is
/// removed, is longer than `max_line_length` bytes.
pub fn tokenize(line: &str, max_line_length: usize) -> Result<Vec<Token>, SyntaxError> {
    let line = strip_terminator(line);
    if line.len() > max_line_length {
        return Err(SyntaxError::LineTooLong {
            len: line.len(),
            max: max_line_length,
        });
    }

    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in line.chars() {
        if let Some(kind) = TokenKind::of_meta(ch) {
            flush_word(&mut word, &mut tokens);
            tokens.push(Token {
                text: ch.to_string(),
                kind,
            });
        } else if ch.is_whitespace() {
            flush_word(&mut word, &mut tokens);
        } else {
            word.push(ch);
        }
    }
    flush_word(&mut word, &mut tokens);

    tracing::trace!(count = tokens.len(), "tokenized line");
    Ok(tokens)
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::word(std::mem::take(word)));
    }
}
