use std::io::Write;

use anyhow::{Context, Result};
use clap_complete::Shell;

/// Write the completion script for `shell` to `out`
pub fn generate(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut buffer = Vec::new();
    clap_complete::generate(shell, &mut crate::cli_command(), "dispmode", &mut buffer);
    out.write_all(&buffer)
        .with_context(|| format!("writing {shell} completions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        generate(shell, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn scripts_cover_display_subcommands() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("closest"));
        assert!(bash.contains("--only-hidpi"));

        assert!(script(Shell::Zsh).starts_with("#compdef dispmode"));
        assert!(script(Shell::Fish).contains("complete -c dispmode"));
    }
}
