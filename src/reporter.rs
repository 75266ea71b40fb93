use crate::command::StageStatus;
use crate::executor::ExecutionResult;
use std::fmt::Display;
use std::io::{self, Write};

/// Renders results and errors for the user, one line each.
///
/// Errors are printed as `Error: <message>`. A finished line is printed as
/// `+ completed '<line>' [s0][s1]...` with one bracket per stage, preceded by an
/// error line for every stage that never ran.
pub struct StatusReporter {
    out: Box<dyn Write>,
}

impl StatusReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    /// Reporter writing to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    pub fn error(&mut self, error: &dyn Display) -> io::Result<()> {
        writeln!(self.out, "Error: {}", error)?;
        self.out.flush()
    }

    pub fn completed(&mut self, line: &str, result: &ExecutionResult) -> io::Result<()> {
        for stage in &result.stages {
            if let Some(message) = stage_error(stage.status) {
                writeln!(self.out, "Error: {}", message)?;
            }
        }
        let statuses: String = result
            .stages
            .iter()
            .map(|s| format!("[{}]", s.status.code()))
            .collect();
        writeln!(self.out, "+ completed '{}' {}", trim_line(line), statuses)?;
        self.out.flush()
    }

    /// Completion of a builtin, which has a single status and no stages.
    pub fn builtin_completed(&mut self, line: &str, code: i32) -> io::Result<()> {
        writeln!(self.out, "+ completed '{}' [{}]", trim_line(line), code)?;
        self.out.flush()
    }

    pub fn goodbye(&mut self) -> io::Result<()> {
        writeln!(self.out, "Bye...")?;
        self.out.flush()
    }
}

fn stage_error(status: StageStatus) -> Option<&'static str> {
    match status {
        StageStatus::CommandNotFound => Some("command not found"),
        StageStatus::CannotOpenInputFile => Some("cannot open input file"),
        StageStatus::CannotOpenOutputFile => Some("cannot open output file"),
        StageStatus::Exited(_) | StageStatus::Signaled(_) => None,
    }
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxError;
    use crate::executor::StageResult;
    use crate::io_adapters::MemWriter;

    fn result(statuses: &[(&str, StageStatus)]) -> ExecutionResult {
        ExecutionResult {
            stages: statuses
                .iter()
                .map(|(command, status)| StageResult {
                    command: command.to_string(),
                    status: *status,
                })
                .collect(),
        }
    }

    #[test]
    fn test_completion_line_has_one_status_per_stage() {
        let out = MemWriter::new();
        let mut reporter = StatusReporter::new(Box::new(out.clone()));
        let r = result(&[("echo", StageStatus::Exited(0)), ("grep", StageStatus::Exited(1))]);
        reporter.completed("echo hi | grep x\n", &r).unwrap();
        assert_eq!(out.contents(), "+ completed 'echo hi | grep x' [0][1]\n");
    }

    #[test]
    fn test_stages_that_never_ran_get_an_error_line() {
        let out = MemWriter::new();
        let mut reporter = StatusReporter::new(Box::new(out.clone()));
        let r = result(&[
            ("cat", StageStatus::CannotOpenInputFile),
            ("nope", StageStatus::CommandNotFound),
        ]);
        reporter.completed("cat < x | nope", &r).unwrap();
        assert_eq!(
            out.contents(),
            "Error: cannot open input file\nError: command not found\n+ completed 'cat < x | nope' [1][127]\n"
        );
    }

    #[test]
    fn test_syntax_errors_use_classic_messages() {
        let out = MemWriter::new();
        let mut reporter = StatusReporter::new(Box::new(out.clone()));
        reporter.error(&SyntaxError::InvalidCommandLine).unwrap();
        reporter.error(&SyntaxError::MisplacedBackground).unwrap();
        reporter.error(&SyntaxError::NoOutputFileSpecified).unwrap();
        assert_eq!(
            out.contents(),
            "Error: invalid command line\nError: mislocated background sign\nError: no output file\n"
        );
    }

    #[test]
    fn test_signals_are_shown_as_shell_codes() {
        let out = MemWriter::new();
        let mut reporter = StatusReporter::new(Box::new(out.clone()));
        reporter
            .completed("sleep 9", &result(&[("sleep", StageStatus::Signaled(2))]))
            .unwrap();
        assert_eq!(out.contents(), "+ completed 'sleep 9' [130]\n");
    }
}
