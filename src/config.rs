use crate::lexer::DEFAULT_MAX_LINE_LENGTH;

pub const DEFAULT_PROMPT: &str = "sshell$ ";

/// Settings of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed before each line is read.
    pub prompt: String,
    /// Longest accepted command line in bytes; longer lines are rejected.
    pub max_line_length: usize,
    /// Echo each line back when standard input is not a terminal, so transcripts of
    /// scripted sessions read like interactive ones.
    pub echo_non_interactive: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            echo_non_interactive: true,
        }
    }
}
