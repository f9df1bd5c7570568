//! Display commands: argument model and dispatch

mod script;
mod set;
mod show;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use crate::common::config::DispmodeConfig;
use crate::display::{HidpiPolicy, Query, QueryError};
use crate::platform::{DisplayService, OnlineDisplay};

pub use script::run_script;

/// Target mode arguments shared by `closest` and `exact`
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ModeArgs {
    /// Desired width
    #[arg(short, long)]
    pub width: Option<u32>,
    /// Desired height
    #[arg(short = 'H', long)]
    pub height: Option<u32>,
    /// Pixel depth (default from config, normally 32)
    #[arg(short, long)]
    pub depth: Option<u32>,
    /// Refresh rate in Hz (default from config, normally 0)
    #[arg(short, long)]
    pub refresh: Option<f64>,
    #[command(flatten)]
    pub hidpi: HidpiArgs,
}

impl ModeArgs {
    pub fn query(&self, kind: &'static str, config: &DispmodeConfig) -> Result<Query> {
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(QueryError::MissingDimensions(kind).into());
        };
        let policy = self.hidpi.policy(config)?;
        let query = Query::new(
            width,
            height,
            self.depth.unwrap_or(config.default_depth),
            self.refresh.unwrap_or(config.default_refresh),
            policy,
        )?;
        Ok(query)
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct HidpiArgs {
    /// Exclude HiDPI (scaled) modes
    #[arg(long)]
    pub no_hidpi: bool,
    /// Only consider HiDPI (scaled) modes
    #[arg(long)]
    pub only_hidpi: bool,
}

impl HidpiArgs {
    pub fn policy(&self, config: &DispmodeConfig) -> Result<HidpiPolicy, QueryError> {
        HidpiPolicy::from_flags(self.no_hidpi, self.only_hidpi, config.hidpi)
    }
}

/// Which displays a command acts on
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ScopeArgs {
    /// Display identifier (repeatable)
    #[arg(long = "display", value_name = "ID")]
    pub displays: Vec<String>,
    /// Act on every online display
    #[arg(long, conflicts_with = "displays")]
    pub all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultScope {
    Main,
    All,
}

impl ScopeArgs {
    pub async fn resolve(
        &self,
        service: &dyn DisplayService,
        default: DefaultScope,
    ) -> Result<Vec<OnlineDisplay>> {
        let online = service.online_displays().await?;

        let selected: Vec<OnlineDisplay> = if !self.displays.is_empty() {
            if let Some(missing) = self
                .displays
                .iter()
                .find(|id| !online.iter().any(|d| d.id.as_str() == id.as_str()))
            {
                bail!("No matching displays found ({})", missing);
            }
            online
                .into_iter()
                .filter(|d| self.displays.iter().any(|id| id == d.id.as_str()))
                .collect()
        } else if self.all || default == DefaultScope::All {
            online
        } else {
            online.into_iter().filter(|d| d.is_main).collect()
        };

        if selected.is_empty() {
            bail!("No matching displays found");
        }
        Ok(selected)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ShowCommands {
    /// Show the current mode of each display (default)
    Current {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Show every supported mode
    All {
        #[command(flatten)]
        hidpi: HidpiArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Show the highest supported mode
    Highest {
        #[command(flatten)]
        hidpi: HidpiArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Show the supported mode closest to the given values
    Closest {
        #[command(flatten)]
        mode: ModeArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Show the mode exactly matching the given values, if any
    Exact {
        #[command(flatten)]
        mode: ModeArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// List online displays
    Displays,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SetCommands {
    /// Set the supported mode closest to the given values
    Closest {
        #[command(flatten)]
        mode: ModeArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Set the highest supported mode
    Highest {
        #[command(flatten)]
        hidpi: HidpiArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Set the exact mode or change nothing
    Exact {
        #[command(flatten)]
        mode: ModeArgs,
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    /// Show displays and their modes
    Show {
        #[command(subcommand)]
        command: Option<ShowCommands>,
    },
    /// Change display modes
    Set {
        #[command(subcommand)]
        command: SetCommands,
    },
}

/// Execution group. Groups run in declaration order so a resolution change
/// lands before anything that depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    ResolutionSet,
    Show,
}

impl DisplayCommand {
    pub fn category(&self) -> Category {
        match self {
            DisplayCommand::Set { .. } => Category::ResolutionSet,
            DisplayCommand::Show { .. } => Category::Show,
        }
    }
}

/// Run one display command against `service`
pub async fn run(
    command: &DisplayCommand,
    service: &dyn DisplayService,
    config: &DispmodeConfig,
) -> Result<()> {
    match command {
        DisplayCommand::Show { command } => {
            let default = ShowCommands::Current {
                scope: ScopeArgs::default(),
            };
            show::handle_show_command(command.as_ref().unwrap_or(&default), service, config).await
        }
        DisplayCommand::Set { command } => set::handle_set_command(command, service, config).await,
    }
}
