use anyhow::{Context, Result, bail};
use serde_json::json;

use super::{DefaultScope, SetCommands};
use crate::common::config::DispmodeConfig;
use crate::display::{
    Catalog, DisplayMode, HidpiPolicy, MatchTier, Query, find_exact, find_highest, find_match,
};
use crate::platform::{ConfigurationPlan, DisplayService, OnlineDisplay, load_catalogs};
use crate::ui::prelude::*;

/// How a `set` subcommand picks a mode from each catalog
enum Selection {
    Closest(Query),
    Highest(HidpiPolicy),
    Exact(Query),
}

impl Selection {
    fn policy(&self) -> HidpiPolicy {
        match self {
            Selection::Closest(query) | Selection::Exact(query) => query.policy(),
            Selection::Highest(policy) => *policy,
        }
    }

    fn pick<'a>(&self, catalog: &'a Catalog) -> Option<(&'a DisplayMode, Option<MatchTier>)> {
        match self {
            Selection::Closest(query) => find_match(catalog, query).map(|m| (m.mode, Some(m.tier))),
            Selection::Highest(policy) => find_highest(catalog, *policy).map(|mode| (mode, None)),
            Selection::Exact(query) => find_exact(catalog, query).map(|mode| (mode, None)),
        }
    }
}

pub(super) async fn handle_set_command(
    command: &SetCommands,
    service: &dyn DisplayService,
    config: &DispmodeConfig,
) -> Result<()> {
    let (selection, scope) = match command {
        SetCommands::Closest { mode, scope } => {
            (Selection::Closest(mode.query("closest", config)?), scope)
        }
        SetCommands::Highest { hidpi, scope } => {
            (Selection::Highest(hidpi.policy(config)?), scope)
        }
        SetCommands::Exact { mode, scope } => {
            (Selection::Exact(mode.query("exact", config)?), scope)
        }
    };

    let displays = scope.resolve(service, DefaultScope::Main).await?;
    let catalogs = load_catalogs(service, &displays, selection.policy()).await?;

    let (plan, missing) = plan_changes(&catalogs, &selection);

    if !missing.is_empty() {
        let hint = selection.policy().hint();
        for display in &missing {
            let mut message = format!("No matching mode found for display {}.", display.heading());
            if !hint.is_empty() {
                message.push_str(&format!(" {hint}"));
            }
            emit(
                Level::Error,
                "display.set.not_found",
                &message,
                Some(json!({ "display": display.id })),
            );
        }
        bail!("Display configuration not changed");
    }

    service
        .commit(&plan)
        .await
        .with_context(|| format!("Failed to apply display modes via {}", service.name()))?;

    for (display, mode) in plan.changes() {
        emit(
            Level::Success,
            "display.set.applied",
            &format!("Display {display}: set to {mode}"),
            Some(json!({ "display": display, "mode": mode })),
        );
    }
    Ok(())
}

/// Pick a mode for every display. Returns the plan and the displays that had
/// no acceptable mode.
fn plan_changes<'a>(
    catalogs: &'a [(OnlineDisplay, Catalog)],
    selection: &Selection,
) -> (ConfigurationPlan, Vec<&'a OnlineDisplay>) {
    let mut plan = ConfigurationPlan::default();
    let mut missing = Vec::new();

    for (display, catalog) in catalogs {
        match selection.pick(catalog) {
            Some((mode, tier)) => {
                if let Some(tier) = tier {
                    emit(
                        Level::Debug,
                        "display.match.tier",
                        &format!("Display {}: {} ({tier})", display.id, mode.short_label()),
                        Some(json!({ "display": display.id, "tier": tier })),
                    );
                }
                plan.configure(display.id.clone(), mode.clone());
            }
            None => missing.push(display),
        }
    }

    (plan, missing)
}
