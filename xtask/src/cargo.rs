//! Shared runner for the cargo invocations behind each task.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// What a failing step does to the overall task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Print the captured output and abort the task
    Fail,
    /// Print a warning and carry on
    Warn,
}

/// One cargo invocation with a progress line.
pub struct Step<'a> {
    pub label: &'a str,
    pub args: &'a [&'a str],
    pub env: &'a [(&'a str, &'a str)],
    pub on_failure: OnFailure,
}

impl<'a> Step<'a> {
    pub fn new(label: &'a str, args: &'a [&'a str]) -> Self {
        Self {
            label,
            args,
            env: &[],
            on_failure: OnFailure::Fail,
        }
    }

    pub fn warn_only(mut self) -> Self {
        self.on_failure = OnFailure::Warn;
        self
    }

    pub fn with_env(mut self, env: &'a [(&'a str, &'a str)]) -> Self {
        self.env = env;
        self
    }

    /// Run the step. Returns the captured output when it succeeded (or
    /// failed with [`OnFailure::Warn`]).
    pub fn run(&self) -> Result<Output> {
        println!("{}", format!("  {}...", self.label).cyan());
        let start = Instant::now();

        let output = Command::new("cargo")
            .args(self.args)
            .envs(self.env.iter().copied())
            .output()
            .with_context(|| format!("Failed to run cargo {}", self.args.join(" ")))?;

        if output.status.success() {
            let summary = extract_test_summary(&String::from_utf8_lossy(&output.stdout));
            println!(
                "{}",
                format!(
                    "  ✓ {} passed{} in {:.2}s",
                    self.label,
                    summary.map(|s| format!(" ({s})")).unwrap_or_default(),
                    start.elapsed().as_secs_f64()
                )
                .green()
            );
            println!();
            return Ok(output);
        }

        match self.on_failure {
            OnFailure::Fail => {
                eprintln!("{}", format!("  ✗ {} failed", self.label).red().bold());
                eprintln!();
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    eprintln!("  {line}");
                }
                eprintln!("{}", String::from_utf8_lossy(&output.stderr));
                anyhow::bail!("{} failed", self.label);
            }
            OnFailure::Warn => {
                eprintln!("{}", format!("  ⚠ {} reported problems", self.label).yellow().bold());
                eprintln!("{}", String::from_utf8_lossy(&output.stderr));
                println!();
                Ok(output)
            }
        }
    }
}

/// Pull the text after "test result:" out of cargo test output.
pub fn extract_test_summary(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .map(|summary| summary.trim().to_string())
        .next()
}
