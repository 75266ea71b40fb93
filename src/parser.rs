use crate::error::SyntaxError;
use crate::lexer::{self, Token, TokenKind};
use crate::validator;
use std::fmt;
use std::path::PathBuf;

/// One command of a pipeline, run as one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Program name followed by its arguments. Never empty when built by the parser.
    pub argv: Vec<String>,
    /// File to read standard input from. Only ever set on the first stage.
    pub input_file: Option<PathBuf>,
    /// File to write standard output to. Only ever set on the last stage.
    pub output_file: Option<PathBuf>,
}

impl Stage {
    /// Program name, `argv[0]`. `None` for a stage assembled by hand with no argv.
    pub fn command(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// A chain of stages connected by pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// At least one stage, in execution order.
    pub stages: Vec<Stage>,
    /// Whether the line ended with `&`.
    pub background: bool,
}

impl Pipeline {
    /// Re-derives a token sequence that builds back into an equal pipeline.
    pub fn to_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                tokens.push(Token::operator(TokenKind::Pipe));
            }
            tokens.extend(stage.argv.iter().map(Token::word));
            if let Some(path) = &stage.input_file {
                tokens.push(Token::operator(TokenKind::RedirectIn));
                tokens.push(Token::word(path.to_string_lossy()));
            }
            if let Some(path) = &stage.output_file {
                tokens.push(Token::operator(TokenKind::RedirectOut));
                tokens.push(Token::word(path.to_string_lossy()));
            }
        }
        if self.background {
            tokens.push(Token::operator(TokenKind::Background));
        }
        tokens
    }

    /// Whether the pipeline is a single stage without any redirection.
    pub fn is_simple(&self) -> bool {
        matches!(
            self.stages.as_slice(),
            [stage] if stage.input_file.is_none() && stage.output_file.is_none()
        )
    }
}

/// Renders the pipeline as a canonical command line.
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.to_tokens();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

struct PipelineBuilder {
    tokens: std::vec::IntoIter<Token>,
    stages: Vec<Stage>,
    current: Stage,
    background: bool,
}

impl PipelineBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        PipelineBuilder {
            tokens: tokens.into_iter(),
            stages: Vec::new(),
            current: Self::empty_stage(),
            background: false,
        }
    }

    fn empty_stage() -> Stage {
        Stage {
            argv: Vec::new(),
            input_file: None,
            output_file: None,
        }
    }

    fn build(mut self) -> Result<Pipeline, SyntaxError> {
        while let Some(token) = self.tokens.next() {
            match token.kind {
                TokenKind::Word => self.current.argv.push(token.text),
                TokenKind::Pipe => self.close_stage(false)?,
                TokenKind::RedirectIn => {
                    if !self.stages.is_empty() {
                        return Err(SyntaxError::MisplacedInputRedirection);
                    }
                    let target = self.redirect_target(SyntaxError::NoInputFileSpecified)?;
                    self.current.input_file = Some(target);
                }
                TokenKind::RedirectOut => {
                    let target = self.redirect_target(SyntaxError::NoOutputFileSpecified)?;
                    self.current.output_file = Some(target);
                }
                TokenKind::Background => {
                    if self.tokens.len() != 0 {
                        return Err(SyntaxError::MisplacedBackground);
                    }
                    self.background = true;
                }
            }
        }
        self.close_stage(true)?;

        Ok(Pipeline {
            stages: self.stages,
            background: self.background,
        })
    }

    /// Consumes the filename that follows a redirection operator.
    fn redirect_target(&mut self, missing: SyntaxError) -> Result<PathBuf, SyntaxError> {
        match self.tokens.next() {
            Some(token) if token.is(TokenKind::Word) => Ok(PathBuf::from(token.text)),
            Some(_) => Err(SyntaxError::InvalidCommandLine),
            None => Err(missing),
        }
    }

    /// Pushes the current stage. Called on every pipe and once at the end, so an
    /// output file on anything but the final stage is caught here.
    fn close_stage(&mut self, is_last: bool) -> Result<(), SyntaxError> {
        let stage = std::mem::replace(&mut self.current, Self::empty_stage());
        if stage.argv.is_empty() {
            return Err(SyntaxError::InvalidCommandLine);
        }
        if stage.output_file.is_some() && !is_last {
            return Err(SyntaxError::MisplacedOutputRedirection);
        }
        self.stages.push(stage);
        Ok(())
    }
}

/// Partitions a token sequence into a [`Pipeline`].
///
/// Expects tokens that already passed [`validator::validate`]; structural defects
/// that slipped through are still reported as errors. Redirection placement is
/// checked here: `<` only on the first stage, `>` only on the last. A stage that
/// repeats a redirection keeps the last target.
pub fn build_pipeline(tokens: Vec<Token>) -> Result<Pipeline, SyntaxError> {
    let pipeline = PipelineBuilder::from(tokens).build()?;
    tracing::debug!(
        stages = pipeline.stages.len(),
        background = pipeline.background,
        "built pipeline"
    );
    Ok(pipeline)
}

/// Tokenizes, validates and builds one command line.
///
/// Returns `Ok(None)` for a line with no tokens.
pub fn parse_line(line: &str, max_line_length: usize) -> Result<Option<Pipeline>, SyntaxError> {
    let tokens = lexer::tokenize(line, max_line_length)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    validator::validate(&tokens)?;
    build_pipeline(tokens).map(Some)
}
