use anyhow::{Context, Result};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use serde_json::json;

use super::{DefaultScope, ScopeArgs, ShowCommands};
use crate::common::config::DispmodeConfig;
use crate::display::{
    Catalog, DisplayMode, HidpiPolicy, MatchTier, ModeMatch, find_exact, find_highest, find_match,
};
use crate::platform::{DisplayService, OnlineDisplay, load_catalogs};
use crate::ui::prelude::*;

pub(super) async fn handle_show_command(
    command: &ShowCommands,
    service: &dyn DisplayService,
    config: &DispmodeConfig,
) -> Result<()> {
    match command {
        ShowCommands::Current { scope } => show_current(scope, service).await,
        ShowCommands::All { hidpi, scope } => {
            let policy = hidpi.policy(config)?;
            let catalogs = load_for_scope(scope, service, policy).await?;
            for (display, catalog) in &catalogs {
                show_catalog(display, catalog, policy);
            }
            Ok(())
        }
        ShowCommands::Highest { hidpi, scope } => {
            let policy = hidpi.policy(config)?;
            let catalogs = load_for_scope(scope, service, policy).await?;
            for (display, catalog) in &catalogs {
                display_heading(display);
                match find_highest(catalog, policy) {
                    Some(mode) => print_mode(display, mode, None),
                    None => print_no_match(display, policy),
                }
            }
            Ok(())
        }
        ShowCommands::Closest { mode, scope } => {
            let query = mode.query("closest", config)?;
            let catalogs = load_for_scope(scope, service, query.policy()).await?;
            for (display, catalog) in &catalogs {
                display_heading(display);
                match find_match(catalog, &query) {
                    Some(ModeMatch { mode, tier }) => {
                        emit(
                            Level::Debug,
                            "display.match.tier",
                            &format!("Matched {} ({tier})", query.describe()),
                            Some(json!({ "display": display.id, "tier": tier })),
                        );
                        print_mode(display, mode, Some(tier))
                    }
                    None => print_no_match(display, query.policy()),
                }
            }
            Ok(())
        }
        ShowCommands::Exact { mode, scope } => {
            let query = mode.query("exact", config)?;
            let catalogs = load_for_scope(scope, service, query.policy()).await?;
            for (display, catalog) in &catalogs {
                display_heading(display);
                match find_exact(catalog, &query) {
                    Some(mode) => print_mode(display, mode, None),
                    None => print_no_match(display, query.policy()),
                }
            }
            Ok(())
        }
        ShowCommands::Displays => show_displays(service).await,
    }
}

async fn load_for_scope(
    scope: &ScopeArgs,
    service: &dyn DisplayService,
    policy: HidpiPolicy,
) -> Result<Vec<(OnlineDisplay, Catalog)>> {
    let displays = scope.resolve(service, DefaultScope::All).await?;
    let catalogs = load_catalogs(service, &displays, policy).await?;
    for (display, catalog) in &catalogs {
        emit(
            Level::Debug,
            "display.catalog.built",
            &format!(
                "{} mode(s) for display {} via {}",
                catalog.len(),
                display.id,
                service.name()
            ),
            None,
        );
    }
    Ok(catalogs)
}

async fn show_current(scope: &ScopeArgs, service: &dyn DisplayService) -> Result<()> {
    let displays = scope.resolve(service, DefaultScope::All).await?;
    for display in &displays {
        let descriptor = service
            .current_mode(&display.id)
            .await
            .with_context(|| format!("Failed to read current mode of display {}", display.id))?;
        let mode = DisplayMode::try_from(&descriptor)
            .with_context(|| format!("Display {} reported an invalid mode", display.id))?;
        display_heading(display);
        print_mode(display, &mode, None);
    }
    Ok(())
}

async fn show_displays(service: &dyn DisplayService) -> Result<()> {
    let displays = service.online_displays().await?;

    if matches!(get_output_format(), OutputFormat::Json) {
        for display in &displays {
            emit(
                Level::Info,
                "display.show.display",
                &display.heading(),
                Some(json!(display)),
            );
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Main"]);
    for display in &displays {
        table.add_row(vec![
            Cell::new(display.id.as_str()),
            Cell::new(&display.label),
            Cell::new(if display.is_main { "yes" } else { "" }),
        ]);
    }
    emit(Level::Info, "display.show.displays", &table.to_string(), None);
    Ok(())
}

fn show_catalog(display: &OnlineDisplay, catalog: &Catalog, policy: HidpiPolicy) {
    if matches!(get_output_format(), OutputFormat::Json) {
        emit(
            Level::Info,
            "display.show.all",
            &display.heading(),
            Some(json!({ "display": display.id, "modes": catalog.modes() })),
        );
        return;
    }

    display_heading(display);
    if catalog.is_empty() {
        print_no_match(display, policy);
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Resolution", "Depth", "Refresh (Hz)", "Ratio", "HiDPI"]);
    for mode in catalog {
        table.add_row(vec![
            Cell::new(format!("{}x{}", mode.width, mode.height)),
            Cell::new(mode.bit_depth),
            Cell::new(mode.refresh),
            Cell::new(mode.ratio()),
            Cell::new(mode.hidpi_scale.map(|s| s.to_string()).unwrap_or_default()),
        ]);
    }
    emit(Level::Info, "display.show.all", &table.to_string(), None);
}

fn display_heading(display: &OnlineDisplay) {
    if matches!(get_output_format(), OutputFormat::Text) {
        emit(
            Level::Info,
            "display.show.heading",
            &format!("Display {}:", display.heading()),
            None,
        );
    }
}

fn print_mode(display: &OnlineDisplay, mode: &DisplayMode, tier: Option<MatchTier>) {
    emit(
        Level::Info,
        "display.show.mode",
        &format!("    {mode}"),
        Some(json!({ "display": display.id, "mode": mode, "tier": tier })),
    );
}

fn print_no_match(display: &OnlineDisplay, policy: HidpiPolicy) {
    let mut message = "    (no close matches found)".to_string();
    let hint = policy.hint();
    if !hint.is_empty() {
        message.push_str(&format!(" {hint}"));
    }
    emit(
        Level::Warn,
        "display.show.not_found",
        &message,
        Some(json!({ "display": display.id })),
    );
}
