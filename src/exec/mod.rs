//! External tool execution
//!
//! The pipelines drive pg_dump, psql and tar as black boxes. Two modes: run
//! a single tool to completion, or run a producer/consumer pair joined by a
//! pipe. Any nonzero exit is fatal for the invoking step; retries belong to
//! the caller.

use std::process::{Command, Stdio};

use crate::error::{TenbackError, TenbackResult};

/// A tool invocation: program, argument vector, environment overlay.
///
/// Credentials are passed only through the environment overlay, never argv,
/// so they do not show up in the process list.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

/// Run a tool to completion. Stdout is discarded, stderr passes through.
pub fn run(cmd: &Cmd, step: &'static str) -> TenbackResult<()> {
    let status = cmd
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .map_err(|e| {
            TenbackError::process(step, format!("cannot start {}: {}", cmd.program, e))
        })?;

    if !status.success() {
        return Err(TenbackError::process(
            step,
            format!("{} exited with {}", cmd.program, status),
        ));
    }
    Ok(())
}

/// Run a tool to completion and capture its stdout
pub fn run_capture(cmd: &Cmd, step: &'static str) -> TenbackResult<Vec<u8>> {
    let output = cmd
        .command()
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            TenbackError::process(step, format!("cannot start {}: {}", cmd.program, e))
        })?;

    if !output.status.success() {
        return Err(TenbackError::process(
            step,
            format!("{} exited with {}", cmd.program, output.status),
        ));
    }
    Ok(output.stdout)
}

/// Run a producer/consumer pair: the producer's stdout feeds the consumer's
/// stdin. Both run concurrently and both exit statuses are checked; either
/// nonzero fails the step.
pub fn run_piped(producer: &Cmd, consumer: &Cmd, step: &'static str) -> TenbackResult<()> {
    let mut prod = producer
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| {
            TenbackError::process(step, format!("cannot start {}: {}", producer.program, e))
        })?;

    let stream = prod.stdout.take().ok_or_else(|| {
        TenbackError::process(step, format!("{} has no stdout pipe", producer.program))
    })?;

    // The consumer takes ownership of the read end; once it is spawned the
    // parent holds neither side of the pipe, so the consumer sees EOF as
    // soon as the producer exits and neither wait can deadlock.
    let mut cons = consumer
        .command()
        .stdin(Stdio::from(stream))
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| {
            TenbackError::process(step, format!("cannot start {}: {}", consumer.program, e))
        })?;

    let prod_status = prod.wait().map_err(|e| {
        TenbackError::process(step, format!("wait on {}: {}", producer.program, e))
    })?;
    let cons_status = cons.wait().map_err(|e| {
        TenbackError::process(step, format!("wait on {}: {}", consumer.program, e))
    })?;

    if !prod_status.success() {
        return Err(TenbackError::process(
            step,
            format!("{} exited with {}", producer.program, prod_status),
        ));
    }
    if !cons_status.success() {
        return Err(TenbackError::process(
            step,
            format!("{} exited with {}", consumer.program, cons_status),
        ));
    }
    Ok(())
}
