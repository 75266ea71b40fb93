//! Structural checks on a token sequence, run before a pipeline is built.

use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

/// Checks `tokens` for misplaced meta-characters and reports the first violation
/// in token order.
///
/// An empty sequence is valid; blank lines are filtered before they get here.
/// Redirection placement relative to pipes is checked later by the pipeline
/// builder, which knows stage boundaries.
pub fn validate(tokens: &[Token]) -> Result<(), SyntaxError> {
    let Some(first) = tokens.first() else {
        return Ok(());
    };
    if matches!(
        first.kind,
        TokenKind::Pipe | TokenKind::RedirectIn | TokenKind::RedirectOut
    ) {
        return Err(SyntaxError::InvalidCommandLine);
    }

    let last = tokens.len() - 1;
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        match token.kind {
            TokenKind::Word => {}
            TokenKind::RedirectOut => match next {
                None => return Err(SyntaxError::NoOutputFileSpecified),
                Some(t) if t.kind.is_operator() => return Err(SyntaxError::InvalidCommandLine),
                Some(_) => {}
            },
            TokenKind::RedirectIn => match next {
                None => return Err(SyntaxError::NoInputFileSpecified),
                Some(t) if t.kind.is_operator() => return Err(SyntaxError::InvalidCommandLine),
                Some(_) => {}
            },
            TokenKind::Pipe => match next {
                Some(t) if i > 0 && !t.kind.is_operator() => {}
                _ => return Err(SyntaxError::InvalidCommandLine),
            },
            TokenKind::Background => {
                if i != last || tokens.len() == 1 {
                    return Err(SyntaxError::MisplacedBackground);
                }
            }
        }
    }
    Ok(())
}
