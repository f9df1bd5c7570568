mod common;
mod utils;

use anyhow::Result;
use common::{TestEnvironment, mode, scaled_mode};
use serde_json::json;
use utils::{run_dispmode_command, run_dispmode_json};

#[test]
fn test_show_closest_uses_nearest_ratio_per_display() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(&env, &["show", "closest", "-w", "1366", "-H", "768"])?;
    assert_eq!(output.exit_code, 0, "show closest failed: {}", output.stderr);

    assert_eq!(output.shown_handle("DP-1").as_deref(), Some("dp-720-60"));
    assert_eq!(output.shown_handle("HDMI-A-1").as_deref(), Some("hdmi-1050-60"));

    let tiers: Vec<_> = output
        .events_with_code("display.show.mode")
        .into_iter()
        .map(|event| event["data"]["tier"].clone())
        .collect();
    assert_eq!(tiers, vec![json!("nearest-ratio"), json!("nearest-ratio")]);
    Ok(())
}

#[test]
fn test_refresh_tie_prefers_higher_rate() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(
        &env,
        &["show", "closest", "-w", "1920", "-H", "1080", "-r", "55", "--display", "DP-1"],
    )?;
    assert_eq!(output.exit_code, 0, "show closest failed: {}", output.stderr);
    assert_eq!(output.shown_handle("DP-1").as_deref(), Some("dp-1080-60"));
    assert_eq!(output.shown_handle("HDMI-A-1"), None);

    let event = &output.events_with_code("display.show.mode")[0];
    assert_eq!(event["data"]["tier"], "nearest-refresh");
    assert_eq!(event["data"]["mode"]["refresh"], 60.0);
    Ok(())
}

#[test]
fn test_show_highest() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(&env, &["show", "highest"])?;
    assert_eq!(output.exit_code, 0, "show highest failed: {}", output.stderr);
    assert_eq!(output.shown_handle("DP-1").as_deref(), Some("dp-1440-60"));
    assert_eq!(output.shown_handle("HDMI-A-1").as_deref(), Some("hdmi-1200-60"));
    Ok(())
}

#[test]
fn test_show_current_text_output() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_command(&env, &["show"])?;
    assert_eq!(output.exit_code, 0, "show failed: {}", output.stderr);
    assert!(output.stdout.contains("Display DP-1 [Dell U2719D] (Main Display):"));
    assert!(
        output
            .stdout
            .contains("1920x1080; pixel depth: 32; refresh rate: 60; ratio: 1.78:1")
    );
    assert!(output.stdout.contains("Display HDMI-A-1:"));
    assert!(output.stdout.contains("1920x1200; pixel depth: 32; refresh rate: 60; ratio: 1.60:1"));
    Ok(())
}

#[test]
fn test_show_displays_lists_main() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(&env, &["show", "displays"])?;
    assert_eq!(output.exit_code, 0, "show displays failed: {}", output.stderr);

    let displays = output.events_with_code("display.show.display");
    assert_eq!(displays.len(), 2);
    assert_eq!(displays[0]["data"]["id"], "DP-1");
    assert_eq!(displays[0]["data"]["is_main"], true);
    assert_eq!(displays[1]["data"]["is_main"], false);
    Ok(())
}

#[test]
fn test_set_closest_changes_main_display_only() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(&env, &["set", "closest", "-w", "1280", "-H", "720"])?;
    assert_eq!(output.exit_code, 0, "set closest failed: {}", output.stderr);

    let applied = output.events_with_code("display.set.applied");
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0]["data"]["display"], "DP-1");

    assert_eq!(env.current_handle("DP-1")?.as_deref(), Some("dp-720-60"));
    assert_eq!(env.current_handle("HDMI-A-1")?.as_deref(), Some("hdmi-1200-60"));
    Ok(())
}

#[test]
fn test_set_highest_all_displays() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(&env, &["set", "highest", "--all"])?;
    assert_eq!(output.exit_code, 0, "set highest failed: {}", output.stderr);
    assert_eq!(env.current_handle("DP-1")?.as_deref(), Some("dp-1440-60"));
    assert_eq!(env.current_handle("HDMI-A-1")?.as_deref(), Some("hdmi-1200-60"));
    Ok(())
}

#[test]
fn test_set_exact_without_match_changes_nothing() -> Result<()> {
    let env = TestEnvironment::with_desk()?;
    let before = std::fs::read_to_string(env.snapshot_path())?;

    // DP-1 supports 1280x720 but HDMI-A-1 does not, so neither changes.
    let output = run_dispmode_json(
        &env,
        &["set", "exact", "-w", "1280", "-H", "720", "-r", "60", "--all"],
    )?;
    assert_eq!(output.exit_code, 1);

    let missing = output.events_with_code("display.set.not_found");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["data"]["display"], "HDMI-A-1");
    assert_eq!(std::fs::read_to_string(env.snapshot_path())?, before);
    Ok(())
}

#[test]
fn test_script_runs_set_before_show() -> Result<()> {
    let env = TestEnvironment::with_desk()?;
    let script = env.path().join("layout.txt");
    std::fs::write(
        &script,
        "# report, then switch\nshow current --display DP-1\n\nset highest --display DP-1\n",
    )?;

    let output = run_dispmode_json(&env, &["script", script.to_str().unwrap()])?;
    assert_eq!(output.exit_code, 0, "script failed: {}", output.stderr);

    let codes: Vec<_> = output
        .events()
        .into_iter()
        .map(|event| event["code"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(codes, vec!["display.set.applied", "display.show.mode"]);
    assert_eq!(output.shown_handle("DP-1").as_deref(), Some("dp-1440-60"));
    Ok(())
}

#[test]
fn test_script_rejects_nested_script() -> Result<()> {
    let env = TestEnvironment::with_desk()?;
    let script = env.path().join("nested.txt");
    std::fs::write(&script, "set highest\nscript nested.txt\n")?;

    let output = run_dispmode_command(&env, &["script", script.to_str().unwrap()])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("line 2"), "stderr: {}", output.stderr);
    assert_eq!(env.current_handle("DP-1")?.as_deref(), Some("dp-1080-60"));
    Ok(())
}

#[test]
fn test_hidpi_policies_filter_catalog() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut duplicate = scaled_mode(1280, 800, 2560, 1600, 60.0, "scaled-800");
    duplicate["low_resolution_duplicate"] = json!(true);
    env.write_snapshot(&json!({
        "displays": [{
            "id": "eDP-1",
            "label": "Built-in Retina Display",
            "current": "scaled-900",
            "modes": [
                mode(2880, 1800, 60.0, "native"),
                scaled_mode(1440, 900, 2880, 1800, 60.0, "scaled-900"),
                duplicate,
            ]
        }]
    }))?;

    assert_eq!(catalog_handles(&env, &["show", "all", "--no-hidpi"])?, vec!["native"]);
    assert_eq!(
        catalog_handles(&env, &["show", "all", "--only-hidpi"])?,
        vec!["scaled-900", "scaled-800"]
    );
    assert_eq!(
        catalog_handles(&env, &["show", "all"])?,
        vec!["native", "scaled-900", "scaled-800"]
    );
    Ok(())
}

#[test]
fn test_exact_reaches_hidpi_modes() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_snapshot(&json!({
        "displays": [{
            "id": "eDP-1",
            "label": "Built-in Retina Display",
            "current": "native",
            "modes": [
                mode(2880, 1800, 60.0, "native"),
                scaled_mode(1440, 900, 2880, 1800, 60.0, "scaled-900"),
            ]
        }]
    }))?;
    let exact = ["exact", "-w", "1440", "-H", "900", "-r", "60", "--display", "eDP-1"];

    let mut args = vec!["show"];
    args.extend(exact);
    args.push("--only-hidpi");
    let output = run_dispmode_json(&env, &args)?;
    assert_eq!(output.exit_code, 0, "show exact failed: {}", output.stderr);
    assert_eq!(output.shown_handle("eDP-1").as_deref(), Some("scaled-900"));

    args[0] = "set";
    let output = run_dispmode_json(&env, &args)?;
    assert_eq!(output.exit_code, 0, "set exact failed: {}", output.stderr);
    assert_eq!(env.current_handle("eDP-1")?.as_deref(), Some("scaled-900"));

    // The same values with scaled modes excluded have nothing to match
    let mut args = vec!["set"];
    args.extend(exact);
    args.push("--no-hidpi");
    let output = run_dispmode_json(&env, &args)?;
    assert_eq!(output.exit_code, 1);
    assert_eq!(env.current_handle("eDP-1")?.as_deref(), Some("scaled-900"));
    Ok(())
}

fn catalog_handles(env: &TestEnvironment, args: &[&str]) -> Result<Vec<String>> {
    let output = run_dispmode_json(env, args)?;
    assert_eq!(output.exit_code, 0, "show all failed: {}", output.stderr);
    let event = &output.events_with_code("display.show.all")[0];
    Ok(event["data"]["modes"]
        .as_array()
        .map(|modes| {
            modes
                .iter()
                .filter_map(|m| m["handle"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default())
}

#[test]
fn test_only_hidpi_without_scaled_modes() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_json(
        &env,
        &["show", "closest", "-w", "1920", "-H", "1080", "--only-hidpi"],
    )?;
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.events_with_code("display.show.not_found").len(), 2);

    let output = run_dispmode_command(
        &env,
        &["set", "closest", "-w", "1920", "-H", "1080", "--only-hidpi"],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Try removing HiDPI flags"));
    Ok(())
}

#[test]
fn test_invalid_queries_exit_with_error() -> Result<()> {
    let env = TestEnvironment::with_desk()?;

    let output = run_dispmode_command(
        &env,
        &["show", "closest", "-w", "800", "-H", "600", "--no-hidpi", "--only-hidpi"],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Cannot require both no HiDPI and only HiDPI"));

    let output = run_dispmode_command(&env, &["show", "closest", "-w", "800"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Must have both width and height"));

    let output = run_dispmode_command(&env, &["set", "closest", "-w", "0", "-H", "600"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("greater than zero"));

    let output = run_dispmode_command(&env, &["show", "current", "--display", "DVI-9"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No matching displays found (DVI-9)"));
    Ok(())
}

#[test]
fn test_unknown_encoding_fails_catalog() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut odd = mode(640, 480, 60.0, "odd");
    odd["encoding"] = json!("YYYYCbCr");
    env.write_snapshot(&json!({
        "displays": [{ "id": "1", "modes": [mode(1920, 1080, 60.0, "ok"), odd] }]
    }))?;

    let output = run_dispmode_command(&env, &["show", "all"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Unknown pixel encoding: YYYYCbCr"));
    Ok(())
}

#[test]
fn test_no_displays_is_an_error() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_snapshot(&json!({ "displays": [] }))?;

    let output = run_dispmode_command(&env, &["show", "highest"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No matching displays found"));
    Ok(())
}

#[test]
fn test_config_defaults_written_on_first_run() -> Result<()> {
    let env = TestEnvironment::with_desk()?;
    assert!(!env.config_path().exists());

    let output = run_dispmode_command(&env, &["show", "displays"])?;
    assert_eq!(output.exit_code, 0, "show displays failed: {}", output.stderr);

    let config = std::fs::read_to_string(env.config_path())?;
    assert!(config.contains("default_depth = 32"));
    Ok(())
}

#[test]
fn test_config_default_refresh_is_used() -> Result<()> {
    let env = TestEnvironment::with_desk()?;
    std::fs::create_dir_all(env.config_path().parent().unwrap())?;
    std::fs::write(env.config_path(), "default_refresh = 50.0\n")?;

    let output = run_dispmode_json(
        &env,
        &["show", "closest", "-w", "1920", "-H", "1080", "--display", "DP-1"],
    )?;
    assert_eq!(output.exit_code, 0, "show closest failed: {}", output.stderr);
    assert_eq!(output.shown_handle("DP-1").as_deref(), Some("dp-1080-50"));
    Ok(())
}

#[test]
fn test_completions_generate() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_dispmode_command(&env, &["completions", "zsh"])?;
    assert_eq!(output.exit_code, 0, "completions failed: {}", output.stderr);
    assert!(output.stdout.starts_with("#compdef dispmode"));

    let output = run_dispmode_command(&env, &["completions", "powershell"])?;
    assert_eq!(output.exit_code, 0, "completions failed: {}", output.stderr);
    assert!(output.stdout.contains("dispmode"));
    Ok(())
}
