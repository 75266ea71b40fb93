use crate::builtin;
use crate::command::{CommandFactory, ExitCode, Spawner};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::SyntaxError;
use crate::executor::{Execution, ExecutionResult, Executor};
use crate::external::SystemSpawner;
use crate::jobs::{Reaped, Reaper};
use crate::parser::{self, Stage};
use crate::reporter::StatusReporter;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Nothing but whitespace.
    Empty,
    /// Rejected before anything ran.
    Rejected(SyntaxError),
    /// Handled in-process by `cd`, `pwd` or `exit`.
    Builtin(ExitCode),
    /// Ran to completion in the foreground.
    Foreground(ExecutionResult),
    /// Started in the background and handed to the reaper.
    Background,
}

/// An interactive shell session.
///
/// The interpreter owns the line-level flow: parse, dispatch to a builtin or to the
/// [`Executor`], report, and keep background pipelines with a [`Reaper`] that is
/// polled before every prompt.
///
/// Example
/// ```no_run
/// use sshell::{Interpreter, ShellConfig};
/// let mut sh = Interpreter::new(ShellConfig::default());
/// sh.run_line("echo hello | tr a-z A-Z").unwrap();
/// ```
pub struct Interpreter<S: Spawner = SystemSpawner> {
    config: ShellConfig,
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    executor: Executor<S>,
    reaper: Reaper,
    reporter: StatusReporter,
    stdout: Box<dyn Write>,
}

impl Interpreter {
    /// Create an interpreter that runs stages as real processes.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_spawner(config, SystemSpawner)
    }
}

impl<S: Spawner> Interpreter<S> {
    pub fn with_spawner(config: ShellConfig, spawner: S) -> Self {
        Self {
            config,
            env: Environment::new(),
            builtins: builtin::factories(),
            executor: Executor::new(spawner),
            reaper: Reaper::new(),
            reporter: StatusReporter::stderr(),
            stdout: Box::new(io::stdout()),
        }
    }

    /// Send completion and error lines somewhere other than standard error.
    pub fn with_reporter(mut self, reporter: StatusReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Send builtin output somewhere other than standard output.
    pub fn with_stdout(mut self, stdout: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self
    }

    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Background pipelines not reaped yet.
    pub fn running_jobs(&self) -> usize {
        self.reaper.running()
    }

    /// Parse and run one line, reporting the outcome.
    ///
    /// Syntax errors and per-stage failures are reported and returned as part of the
    /// outcome. An `Err` means the shell itself failed: a pipe could not be created
    /// or the reporter could not write.
    #[tracing::instrument(level = "info", skip(self, line), fields(len = line.len()))]
    pub fn run_line(&mut self, line: &str) -> anyhow::Result<LineOutcome> {
        let pipeline = match parser::parse_line(line, self.config.max_line_length) {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => return Ok(LineOutcome::Empty),
            Err(e) => {
                tracing::debug!(error = %e, "rejected line");
                self.reporter.error(&e)?;
                return Ok(LineOutcome::Rejected(e));
            }
        };

        if !pipeline.background && pipeline.is_simple() {
            if let Some(code) = self.try_builtin(line, &pipeline.stages[0])? {
                return Ok(LineOutcome::Builtin(code));
            }
        }

        let execution = self
            .executor
            .execute(&pipeline)
            .with_context(|| format!("cannot run '{}'", line.trim_end()))?;
        match execution {
            Execution::Foreground(result) => {
                self.reporter.completed(line, &result)?;
                Ok(LineOutcome::Foreground(result))
            }
            Execution::Background(job) => {
                self.reaper.track(line.trim_end(), job);
                Ok(LineOutcome::Background)
            }
        }
    }

    fn try_builtin(&mut self, line: &str, stage: &Stage) -> anyhow::Result<Option<ExitCode>> {
        let Some(name) = stage.command() else {
            return Ok(None);
        };
        let args: Vec<&str> = stage.args().iter().map(String::as_str).collect();
        let Some(cmd) = self
            .builtins
            .iter()
            .find_map(|f| f.try_create(name, &args))
        else {
            return Ok(None);
        };

        // Jobs that finished since the last prompt must not hold up `exit`.
        self.reap_finished()?;
        self.env.running_jobs = self.reaper.running();

        match cmd.execute(&mut *self.stdout, &mut self.env) {
            Ok(code) => {
                self.stdout.flush()?;
                if self.env.should_exit {
                    self.reporter.goodbye()?;
                }
                self.reporter.builtin_completed(line, code)?;
                Ok(Some(code))
            }
            Err(e) => {
                self.reporter.error(&e)?;
                Ok(Some(1))
            }
        }
    }

    /// Non-blocking reaping pass; reports every background pipeline that finished
    /// or whose status was lost. Returns how many are no longer tracked.
    pub fn reap_finished(&mut self) -> io::Result<usize> {
        let reaped = self.reaper.reap();
        self.report_reaped(&reaped)?;
        Ok(reaped.len())
    }

    /// Blocks until every background pipeline has finished, reporting each.
    pub fn wait_background(&mut self) -> io::Result<()> {
        let reaped = self.reaper.wait_all();
        self.report_reaped(&reaped)
    }

    fn report_reaped(&mut self, reaped: &Reaped) -> io::Result<()> {
        for completed in &reaped.completed {
            self.reporter.completed(&completed.line, &completed.result)?;
        }
        for failed in &reaped.failed {
            self.reporter.error(&failed.error)?;
        }
        Ok(())
    }

    /// Read-eval-print loop over standard input, until `exit` or end of input.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let echo = self.config.echo_non_interactive && !io::stdin().is_terminal();

        while !self.env.should_exit {
            self.reap_finished()?;
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if echo {
                        writeln!(self.stdout, "{}", line)?;
                    }
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Err(e) = self.run_line(&line) {
                        tracing::warn!(error = ?e, "line failed");
                        self.reporter.error(&e)?;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("cannot read command line"),
            }
        }

        self.wait_background()?;
        Ok(())
    }
}
