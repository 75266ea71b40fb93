//! Line-level behaviour of the interpreter against real processes.
//!
//! Kept in its own test binary because `cd` changes the working directory of the
//! whole process.

use sshell::io_adapters::MemWriter;
use sshell::{Interpreter, LineOutcome, ShellConfig, StatusReporter};
use std::fs;

#[test]
fn test_session_with_cd_redirection_and_background() {
    let dir = tempfile::tempdir().unwrap();
    let report = MemWriter::new();
    let stdout = MemWriter::new();
    let mut sh = Interpreter::new(ShellConfig::default())
        .with_reporter(StatusReporter::new(Box::new(report.clone())))
        .with_stdout(Box::new(stdout.clone()));

    let cd = format!("cd {}", dir.path().display());
    assert_eq!(sh.run_line(&cd).unwrap(), LineOutcome::Builtin(0));

    // Relative paths now resolve inside the temporary directory.
    let outcome = sh.run_line("echo hello world|tr a-z A-Z>shout.txt").unwrap();
    assert!(matches!(outcome, LineOutcome::Foreground(_)));
    let shout = dir.path().join("shout.txt");
    assert_eq!(fs::read_to_string(&shout).unwrap(), "HELLO WORLD\n");

    assert_eq!(sh.run_line("pwd").unwrap(), LineOutcome::Builtin(0));
    let canonical = fs::canonicalize(dir.path()).unwrap();
    assert_eq!(stdout.contents(), format!("{}\n", canonical.display()));

    assert_eq!(sh.run_line("sleep 0 &").unwrap(), LineOutcome::Background);
    sh.wait_background().unwrap();
    assert_eq!(sh.running_jobs(), 0);

    assert_eq!(sh.run_line("exit").unwrap(), LineOutcome::Builtin(0));
    assert!(sh.should_exit());

    assert_eq!(
        report.contents(),
        format!(
            "+ completed '{cd}' [0]\n\
             + completed 'echo hello world|tr a-z A-Z>shout.txt' [0][0]\n\
             + completed 'pwd' [0]\n\
             + completed 'sleep 0 &' [0]\n\
             Bye...\n\
             + completed 'exit' [0]\n"
        )
    );
}
