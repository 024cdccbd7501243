use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::process::Command;
use uuid::Uuid;

use crate::config::Config;

/// Captured result of one run of the call program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
}

/// The external program that actually places calls, e.g. `python main.py`.
#[derive(Debug, Clone)]
pub struct CallScript {
    program: String,
    script: Option<String>,
    working_dir: Option<PathBuf>,
}

impl CallScript {
    pub fn new(program: impl Into<String>, script: Option<String>) -> Self {
        Self {
            program: program.into(),
            script,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let script = Self::new(config.program.clone(), config.script.clone());
        match &config.working_dir {
            Some(dir) => script.with_working_dir(dir),
            None => script,
        }
    }

    /// Arguments passed to the program for `number`, script first.
    pub fn args(&self, number: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        if let Some(script) = &self.script {
            args.push(script.clone());
        }
        args.push(format!("--call={}", number));
        args
    }

    /// Runs the program once and waits for it to exit.
    ///
    /// Only a failure to start or read from the child is an error. A non-zero
    /// exit is reported through [`Invocation::exit_code`] and left to the caller.
    pub async fn place_call(&self, number: &str) -> anyhow::Result<Invocation> {
        let id = Uuid::new_v4();
        let args = self.args(number);
        info!("Placing call {} to {}", id, number);
        debug!("Call {} command: {} {}", id, self.program, args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to run call program '{}'", self.program))?;

        let exit_code = output.status.code();
        match exit_code {
            Some(0) => info!("Call {} finished", id),
            Some(code) => warn!("Call {} exited with status {}", id, code),
            None => warn!("Call {} terminated by signal", id),
        }

        Ok(Invocation {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
