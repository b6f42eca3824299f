use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cell_model::Action;
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(
    about = "Interactive explorer for a solid-state battery cell stack",
    version
)]
pub struct Args {
    /// Layer stack JSON replacing the built-in five-layer cell
    #[arg(long)]
    pub layers: Option<PathBuf>,

    /// Optional layout preset JSON describing panel sizes and font size
    #[arg(long)]
    pub layout_preset: Option<PathBuf>,

    /// TrueType font used for panels and labels; system fonts are tried when omitted
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Seed for the random layouts (cathode particles, lattice jitter, ion lanes)
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,

    /// JSON array of actions replayed in headless mode
    #[arg(long)]
    pub actions: Option<PathBuf>,

    /// Frames to advance after the action script in headless mode
    #[arg(long, default_value_t = 0)]
    pub frames: usize,

    /// Seconds per frame in headless mode (clamped to 0.1)
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub frame_dt: f32,

    /// When set, write the per-step snapshots of a headless run as JSON
    #[arg(long)]
    pub state_log_json: Option<PathBuf>,

    /// When set, rasterize the dashboard on the CPU and write it as PNG
    #[arg(long)]
    pub dump_dashboard: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LayoutPreset {
    /// Share of the window width given to the info panel.
    #[serde(default)]
    pub info_panel_fraction: Option<f32>,
    #[serde(default)]
    pub dashboard_height: Option<f32>,
    #[serde(default)]
    pub header_height: Option<f32>,
    #[serde(default)]
    pub panel_padding: Option<f32>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

pub fn load_layout_preset(path: &Path) -> Result<LayoutPreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading layout preset {}", path.display()))?;
    let preset: LayoutPreset = serde_json::from_str(&data)
        .with_context(|| format!("parsing layout preset {}", path.display()))?;
    Ok(preset)
}

pub fn load_action_script(path: &Path) -> Result<Vec<Action>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading action script {}", path.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&data)
        .with_context(|| format!("parsing action script {}", path.display()))?;
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn preset_fields_are_optional() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("preset.json");
        fs::write(&path, r#"{"font_size": 18.0}"#)?;
        let preset = load_layout_preset(&path)?;
        assert_eq!(preset.font_size, Some(18.0));
        assert!(preset.info_panel_fraction.is_none());
        Ok(())
    }

    #[test]
    fn action_script_errors_name_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("script.json");
        fs::write(&path, r#"[{"action": "teleport"}]"#)?;
        let err = load_action_script(&path).expect_err("unknown action should fail");
        assert!(format!("{err:#}").contains("script.json"));
        Ok(())
    }

    #[test]
    fn parses_headless_flags() {
        let args = Args::parse_from([
            "cell_viewer",
            "--headless",
            "--frames",
            "30",
            "--seed",
            "9",
        ]);
        assert!(args.headless);
        assert_eq!(args.frames, 30);
        assert_eq!(args.seed, 9);
        assert!(args.layers.is_none());
    }
}
