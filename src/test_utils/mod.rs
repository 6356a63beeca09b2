//! Test utilities for host_snapshot
//!
//! Fakes for the runner and executor seams plus filesystem helpers.

#![cfg(test)]

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;

use crate::collectors::runner::{CommandResult, CommandRunner, CommandSpec, CommandStatus};
use crate::collectors::strategy::{Attempt, Strategy, StrategyExecutor};
use crate::models::AttemptFailure;

/// Runner that answers from a table keyed by program name.
///
/// Programs without an entry behave as if they were not installed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, CommandResult>,
}

impl ScriptedRunner {
    pub fn with(mut self, program: &str, result: CommandResult) -> Self {
        self.responses.insert(program.to_string(), result);
        self
    }

    pub fn exited(code: i32, stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            status: CommandStatus::Exited(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(5),
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec, _limit: Duration) -> CommandResult {
        match self.responses.get(&spec.program) {
            Some(result) => result.clone(),
            None => CommandResult::launch_failed(
                format!("failed to launch {}: No such file or directory", spec.program),
                Duration::ZERO,
            ),
        }
    }
}

/// Executor on which every strategy fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingExecutor;

#[async_trait::async_trait]
impl StrategyExecutor for FailingExecutor {
    async fn execute(&self, strategy: &Strategy, _limit: Duration) -> Attempt {
        Attempt::Rejected(AttemptFailure {
            source: strategy.label(),
            reason: "forced failure".to_string(),
        })
    }
}

/// Write a file and backdate its modification time by `age_secs`
pub fn write_file_aged(path: &Path, content: &[u8], age_secs: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    File::options().write(true).open(path)?.set_modified(mtime)?;
    Ok(())
}
