//! In-memory spawner for exercising the executor without real processes.

use crate::command::{ProcessHandle, Spawner, StageStatus};
use crate::parser::Stage;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::process::Stdio;

/// Records every spawn and hands out processes that exit after a configurable
/// number of `try_wait` calls. `wait` always returns immediately.
#[derive(Debug, Default)]
pub(crate) struct FakeSpawner {
    spawned: RefCell<Vec<Vec<String>>>,
    next_pid: Cell<u32>,
    missing: Vec<String>,
    exit_codes: HashMap<String, i32>,
    slow: HashMap<String, usize>,
    broken: Vec<String>,
    polls_until_exit: usize,
}

impl FakeSpawner {
    /// Programs with this name fail to spawn.
    pub(crate) fn missing(mut self, name: &str) -> Self {
        self.missing.push(name.to_string());
        self
    }

    pub(crate) fn exit_code(mut self, name: &str, code: i32) -> Self {
        self.exit_codes.insert(name.to_string(), code);
        self
    }

    /// Default number of polls a process stays alive for.
    pub(crate) fn polls_until_exit(mut self, polls: usize) -> Self {
        self.polls_until_exit = polls;
        self
    }

    /// Overrides the poll count for one program.
    pub(crate) fn slow(mut self, name: &str, polls: usize) -> Self {
        self.slow.insert(name.to_string(), polls);
        self
    }

    /// Processes of this program spawn fine, but their status can never be collected.
    pub(crate) fn broken(mut self, name: &str) -> Self {
        self.broken.push(name.to_string());
        self
    }

    /// Argument vectors of every successful spawn, in order.
    pub(crate) fn spawned(&self) -> Vec<Vec<String>> {
        self.spawned.borrow().clone()
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, stage: &Stage, _stdin: Stdio, _stdout: Stdio) -> io::Result<Box<dyn ProcessHandle>> {
        let name = stage.command().unwrap_or_default();
        if self.missing.iter().any(|m| m == name) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        self.spawned.borrow_mut().push(stage.argv.clone());
        let pid = self.next_pid.get() + 1000;
        self.next_pid.set(self.next_pid.get() + 1);
        Ok(Box::new(FakeProcess {
            pid,
            remaining_polls: self.slow.get(name).copied().unwrap_or(self.polls_until_exit),
            status: StageStatus::Exited(self.exit_codes.get(name).copied().unwrap_or(0)),
            broken: self.broken.iter().any(|b| b == name),
        }))
    }
}

struct FakeProcess {
    pid: u32,
    remaining_polls: usize,
    status: StageStatus,
    broken: bool,
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn wait(&mut self) -> io::Result<StageStatus> {
        if self.broken {
            return Err(io::Error::other("no child process"));
        }
        self.remaining_polls = 0;
        Ok(self.status)
    }

    fn try_wait(&mut self) -> io::Result<Option<StageStatus>> {
        if self.broken {
            return Err(io::Error::other("no child process"));
        }
        if self.remaining_polls == 0 {
            return Ok(Some(self.status));
        }
        self.remaining_polls -= 1;
        Ok(None)
    }
}
