//! Batch execution of display commands from a file

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use super::{DisplayCommand, run};
use crate::common::config::DispmodeConfig;
use crate::platform::DisplayService;
use crate::ui::prelude::*;

/// Grammar for one script line: the same `show`/`set` commands the CLI takes
#[derive(Parser, Debug)]
#[command(name = "dispmode", no_binary_name = true)]
struct ScriptLine {
    #[command(subcommand)]
    command: DisplayCommand,
}

/// A command together with the script line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub line: usize,
    pub command: DisplayCommand,
}

/// Commands in execution order: grouped by category, file order kept within
/// a category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    entries: Vec<ScriptEntry>,
}

impl CommandList {
    pub fn push(&mut self, entry: ScriptEntry) {
        let category = entry.command.category();
        let index = self
            .entries
            .iter()
            .position(|e| e.command.category() > category)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse script text. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(contents: &str) -> Result<CommandList> {
    let mut list = CommandList::default();

    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let words = shell_words::split(trimmed)
            .with_context(|| format!("line {line}: unable to split '{trimmed}'"))?;
        let parsed = ScriptLine::try_parse_from(&words)
            .map_err(|e| anyhow!("line {line}: {}", e.to_string().trim_end()))?;

        list.push(ScriptEntry {
            line,
            command: parsed.command,
        });
    }

    Ok(list)
}

/// Run every command in `path`, stopping at the first failure
pub async fn run_script(
    path: &Path,
    service: &dyn DisplayService,
    config: &DispmodeConfig,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let list = parse_script(&contents)
        .with_context(|| format!("Invalid script {}", path.display()))?;

    if list.is_empty() {
        emit(
            Level::Warn,
            "display.script.empty",
            &format!("No commands in {}", path.display()),
            None,
        );
        return Ok(());
    }

    for entry in list.entries() {
        emit(
            Level::Debug,
            "display.script.command",
            &format!("Running line {}", entry.line),
            None,
        );
        run(&entry.command, service, config)
            .await
            .with_context(|| format!("{}:{}", path.display(), entry.line))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{SetCommands, ShowCommands};

    #[test]
    fn set_runs_before_show_and_file_order_is_kept() {
        let script = "\
# switch every display, then report
show current
set closest -w 1280 -H 720 --all
show displays

set highest --display 2
";
        let list = parse_script(script).unwrap();
        let lines: Vec<usize> = list.entries().iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 6, 2, 4]);

        match &list.entries()[0].command {
            DisplayCommand::Set {
                command: SetCommands::Closest { mode, scope },
            } => {
                assert_eq!(mode.width, Some(1280));
                assert_eq!(mode.height, Some(720));
                assert!(scope.all);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(
            list.entries()[3].command,
            DisplayCommand::Show {
                command: Some(ShowCommands::Displays)
            }
        );
    }

    #[test]
    fn quoted_arguments_are_split_like_a_shell() {
        let list = parse_script("show current --display 'HDMI-A-1'").unwrap();
        match &list.entries()[0].command {
            DisplayCommand::Show {
                command: Some(ShowCommands::Current { scope }),
            } => assert_eq!(scope.displays, vec!["HDMI-A-1".to_string()]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn nested_scripts_are_rejected() {
        let err = parse_script("script other.txt").unwrap_err();
        assert!(err.to_string().starts_with("line 1:"));
    }

    #[test]
    fn bad_arguments_name_the_line() {
        let err = parse_script("show current\nset closest -w wide").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn unbalanced_quotes_are_an_error() {
        assert!(parse_script("show current --display 'HDMI").is_err());
    }

    #[test]
    fn comments_only_is_empty() {
        assert!(parse_script("# nothing\n\n   \n").unwrap().is_empty());
    }
}
