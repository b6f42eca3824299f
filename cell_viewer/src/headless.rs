//! Windowless runs: replay an action script against a session, step frames,
//! and write the snapshot log and dashboard PNG for inspection.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use cell_model::charts::Rect;
use cell_model::{Action, Session, Snapshot};
use serde::Serialize;
use winit::dpi::PhysicalSize;

use crate::canvas::Canvas;
use crate::cli::LayoutPreset;
use crate::layout::ViewerLayout;
use crate::panels::{Painter, draw_dashboard};
use crate::text::Typeface;

/// Window size headless runs lay out against, matching the default window.
pub const HEADLESS_WINDOW: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

#[derive(Debug, Serialize)]
pub struct ReplayStep {
    pub step: usize,
    /// `None` for plain frame steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub changed: bool,
    pub snapshot: Snapshot,
}

#[derive(Debug, Serialize)]
pub struct ReplayLog {
    pub seed: u64,
    pub frame_dt: f32,
    pub steps: Vec<ReplayStep>,
    #[serde(rename = "final")]
    pub final_snapshot: Snapshot,
}

pub struct HeadlessRun<'a> {
    pub seed: u64,
    pub frame_dt: f32,
    pub actions: &'a [Action],
    pub frames: usize,
    pub preset: &'a LayoutPreset,
}

/// Replay `run.actions`, then advance `run.frames` frames.
pub fn replay(session: &mut Session, run: &HeadlessRun<'_>) -> ReplayLog {
    let layout = ViewerLayout::compute(HEADLESS_WINDOW, run.preset);
    session.set_aspect(layout.scene_aspect());
    session.set_step_dt(run.frame_dt);

    let mut steps = Vec::with_capacity(run.actions.len() + run.frames);
    for action in run.actions {
        let changed = session.apply(action);
        log::debug!("replayed {action:?} (changed: {changed})");
        steps.push(ReplayStep {
            step: steps.len(),
            action: Some(action.clone()),
            changed,
            snapshot: session.snapshot(),
        });
    }
    for _ in 0..run.frames {
        session.advance(run.frame_dt);
        steps.push(ReplayStep {
            step: steps.len(),
            action: None,
            changed: false,
            snapshot: session.snapshot(),
        });
    }
    log::info!(
        "headless replay finished: {} actions, {} frames, final state {:?}",
        run.actions.len(),
        run.frames,
        session.state()
    );

    ReplayLog {
        seed: run.seed,
        frame_dt: run.frame_dt,
        steps,
        final_snapshot: session.snapshot(),
    }
}

pub fn write_state_log(replay_log: &ReplayLog, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating state log {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), replay_log)
        .with_context(|| format!("writing state log {}", path.display()))?;
    log::info!("state log written to {}", path.display());
    Ok(())
}

/// Rasterize the dashboard at its headless layout size and write it as PNG.
pub fn dump_dashboard(preset: &LayoutPreset, font: Option<Typeface>, path: &Path) -> Result<()> {
    let layout = ViewerLayout::compute(HEADLESS_WINDOW, preset);
    let area = layout.dashboard;
    let mut canvas = Canvas::new(area.width.round() as u32, area.height.round() as u32);
    {
        let mut painter = Painter::new(&mut canvas, font, layout.font_size);
        draw_dashboard(
            &mut painter,
            Rect::new(0.0, 0.0, area.width, area.height),
            layout.padding,
        );
    }
    canvas.write_png(path)?;
    log::info!(
        "dashboard exported to {} ({}x{})",
        path.display(),
        canvas.width(),
        canvas.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cell_model::{LayerStack, NavTarget, ViewMode};

    use super::*;

    fn run(actions: &[Action], frames: usize) -> (Session, ReplayLog) {
        let mut session = Session::new(Arc::new(LayerStack::builtin()), 11);
        let preset = LayoutPreset::default();
        let log = replay(
            &mut session,
            &HeadlessRun {
                seed: 11,
                frame_dt: 1.0 / 30.0,
                actions,
                frames,
                preset: &preset,
            },
        );
        (session, log)
    }

    #[test]
    fn logs_one_step_per_action_and_frame() {
        let actions = [
            Action::SelectLayer {
                id: Some("cathode".into()),
            },
            Action::ToggleMicro,
        ];
        let (session, log) = run(&actions, 3);
        assert_eq!(log.steps.len(), 5);
        assert!(log.steps[0].changed);
        assert!(log.steps[4].action.is_none());
        assert_eq!(log.final_snapshot.state.mode, ViewMode::Micro);
        assert_eq!(session.frame_index(), 3);
    }

    #[test]
    fn navigation_out_of_micro_resets_selection() {
        let actions = [
            Action::SelectLayer {
                id: Some("anode".into()),
            },
            Action::ToggleMicro,
            Action::Navigate {
                target: NavTarget::Overview,
            },
        ];
        let (session, _) = run(&actions, 0);
        assert_eq!(session.state().mode, ViewMode::Intro);
        assert!(session.state().selected().is_none());
        assert!(session.micro().is_none());
    }

    #[test]
    fn state_log_serializes() -> Result<()> {
        let (_, log) = run(&[Action::ToggleExploded], 1);
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.json");
        write_state_log(&log, &path)?;
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(value["steps"][0]["action"]["action"], "toggle_exploded");
        assert_eq!(value["final"]["state"]["mode"], "exploded");
        Ok(())
    }

    #[test]
    fn dashboard_png_without_font() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dashboard.png");
        dump_dashboard(&LayoutPreset::default(), None, &path)?;
        assert!(std::fs::metadata(&path)?.len() > 0);
        Ok(())
    }
}
