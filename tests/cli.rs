use std::process::Command;

use anyhow::{Context, Result};
use tempfile::tempdir;

#[test]
fn placeholder_run_clicks_every_hotspot() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let config_path = temp_dir.path().join("absent.toml");
    let config_str = config_path
        .to_str()
        .context("config path is not valid UTF-8")?;

    let output = Command::new(env!("CARGO_BIN_EXE_vitrine"))
        .args([
            "--config",
            config_str,
            "--placeholder",
            "--click-hotspots",
            "--frames",
            "3",
            "--orbit",
            "200,40",
            "--log-level",
            "warn",
        ])
        .output()
        .context("executing vitrine")?;

    assert!(output.status.success(), "vitrine exited with {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Artifact: Vase (artifact1)"), "stdout: {stdout}");
    assert!(stdout.contains("Hotspots: 3"), "stdout: {stdout}");
    assert!(stdout.contains(": Feature 1"), "stdout: {stdout}");
    assert!(stdout.contains(": Feature 3"), "stdout: {stdout}");
    assert!(stdout.contains("After reset"), "stdout: {stdout}");
    Ok(())
}

#[test]
fn missing_asset_fails_with_message() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let config_path = temp_dir.path().join("vitrine.toml");
    std::fs::write(
        &config_path,
        "[[artifact]]\nid = \"gone\"\nname = \"Gone\"\nasset_path = \"gone.stl\"\n",
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_vitrine"))
        .arg("--config")
        .arg(&config_path)
        .arg("--assets")
        .arg(temp_dir.path())
        .args(["--log-level", "off"])
        .output()
        .context("executing vitrine")?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error loading Gone"), "stderr: {stderr}");
    Ok(())
}
