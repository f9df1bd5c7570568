use anyhow::Result;
use serde_json::Value;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// JSON events printed to stdout and stderr, in that order
    pub fn events(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn events_with_code(&self, code: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|event| event["code"] == code)
            .collect()
    }

    /// Handle of the mode reported for `display` by a show command
    pub fn shown_handle(&self, display: &str) -> Option<String> {
        self.events_with_code("display.show.mode")
            .into_iter()
            .find(|event| event["data"]["display"] == display)
            .and_then(|event| event["data"]["mode"]["handle"].as_str().map(str::to_string))
    }
}

/// Run dispmode against the environment's config and snapshot files
pub fn run_dispmode_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_dispmode"))
        .arg("--config")
        .arg(env.config_path())
        .arg("--snapshot")
        .arg(env.snapshot_path())
        .arg("--no-color")
        .args(args)
        .current_dir(env.path())
        .env_remove("SWAYSOCK")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Same as [`run_dispmode_command`] with JSON output
pub fn run_dispmode_json(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    run_dispmode_command(env, &full)
}
