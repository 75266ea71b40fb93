use anyhow::Result;
use argh::FromArgs;
use sshell::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_PROMPT, Interpreter, LineOutcome, ShellConfig};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// Simple shell with pipes, input/output redirection and background jobs.
struct Args {
    #[argh(option, short = 'c')]
    /// run a single command line, wait for it and exit with its status
    command: Option<String>,

    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt printed before each line
    prompt: String,

    #[argh(option, default = "DEFAULT_MAX_LINE_LENGTH")]
    /// longest accepted command line, in bytes
    max_line_length: usize,

    #[argh(switch)]
    /// do not echo lines read from a non-terminal standard input
    no_echo: bool,
}

impl Args {
    fn config(&self) -> ShellConfig {
        ShellConfig {
            prompt: self.prompt.clone(),
            max_line_length: self.max_line_length,
            echo_non_interactive: !self.no_echo,
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG, warnings only by default)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Args = argh::from_env();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut shell = Interpreter::new(args.config());

    let Some(line) = args.command else {
        shell.repl()?;
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = shell.run_line(&line)?;
    shell.wait_background()?;
    Ok(ExitCode::from(exit_code(&outcome)))
}

/// Process exit status for a line run with `-c`.
fn exit_code(outcome: &LineOutcome) -> u8 {
    let code = match outcome {
        LineOutcome::Empty | LineOutcome::Background => 0,
        LineOutcome::Rejected(_) => 2,
        LineOutcome::Builtin(code) => *code,
        LineOutcome::Foreground(result) => result.last_status().map_or(0, |s| s.code()),
    };
    code.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshell::{ExecutionResult, StageResult, StageStatus, SyntaxError};

    fn foreground(statuses: &[StageStatus]) -> LineOutcome {
        LineOutcome::Foreground(ExecutionResult {
            stages: statuses
                .iter()
                .map(|status| StageResult {
                    command: "cmd".to_string(),
                    status: *status,
                })
                .collect(),
        })
    }

    #[test]
    fn test_exit_code_of_syntax_error() {
        assert_eq!(exit_code(&LineOutcome::Rejected(SyntaxError::InvalidCommandLine)), 2);
    }

    #[test]
    fn test_exit_code_is_last_stage_status() {
        let outcome = foreground(&[StageStatus::Exited(1), StageStatus::Exited(0)]);
        assert_eq!(exit_code(&outcome), 0);
        let outcome = foreground(&[StageStatus::Exited(0), StageStatus::CommandNotFound]);
        assert_eq!(exit_code(&outcome), 127);
        assert_eq!(exit_code(&foreground(&[StageStatus::Signaled(15)])), 143);
        assert_eq!(exit_code(&foreground(&[StageStatus::CannotOpenOutputFile])), 1);
    }

    #[test]
    fn test_exit_code_of_background_and_builtins() {
        assert_eq!(exit_code(&LineOutcome::Background), 0);
        assert_eq!(exit_code(&LineOutcome::Empty), 0);
        assert_eq!(exit_code(&LineOutcome::Builtin(1)), 1);
    }

    #[test]
    fn test_exit_code_is_clamped_to_a_byte() {
        assert_eq!(exit_code(&foreground(&[StageStatus::Exited(-1)])), 0);
        assert_eq!(exit_code(&LineOutcome::Builtin(300)), 255);
    }
}
