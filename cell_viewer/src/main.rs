use std::sync::Arc;

use anyhow::{Context, Result};
use cell_model::{LayerStack, Session};
use clap::Parser;
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod canvas;
mod cli;
mod controls;
mod headless;
mod layout;
mod panels;
mod text;
mod viewer;

use cli::{Args, LayoutPreset, load_action_script, load_layout_preset};
use headless::HeadlessRun;
use viewer::ViewerState;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    let stack = match &args.layers {
        Some(path) => LayerStack::from_json_file(path)
            .with_context(|| format!("loading layer stack {}", path.display()))?,
        None => LayerStack::builtin(),
    };
    log::info!("layer stack ready: {} layers", stack.layers().len());

    let preset = match args.layout_preset.as_deref() {
        Some(path) => load_layout_preset(path).unwrap_or_else(|err| {
            log::warn!("{err:?}; using the default layout");
            LayoutPreset::default()
        }),
        None => LayoutPreset::default(),
    };

    let font = match text::install_font(args.font.as_deref()) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("{err}; panel text will not be drawn");
            None
        }
    };

    let mut session = Session::new(Arc::new(stack), args.seed);

    if args.headless {
        return run_headless(&args, &mut session, &preset, font);
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Cell Stack Explorer")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating explorer window")?,
    );

    let mut state = ViewerState::new(window, session, preset, font).block_on()?;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(SurfaceError::Lost) => state.resize(state.size()),
                                Err(SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => log::error!("render error: {err:?}"),
                            }
                        }
                        other => state.handle_window_event(&other),
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running explorer application")?;
    Ok(())
}

fn run_headless(
    args: &Args,
    session: &mut Session,
    preset: &LayoutPreset,
    font: Option<text::Typeface>,
) -> Result<()> {
    let actions = match args.actions.as_deref() {
        Some(path) => load_action_script(path)?,
        None => Vec::new(),
    };

    let replay_log = headless::replay(
        session,
        &HeadlessRun {
            seed: args.seed,
            frame_dt: args.frame_dt,
            actions: &actions,
            frames: args.frames,
            preset,
        },
    );

    if let Some(path) = args.state_log_json.as_deref() {
        headless::write_state_log(&replay_log, path)?;
    }
    if let Some(path) = args.dump_dashboard.as_deref() {
        headless::dump_dashboard(preset, font, path)?;
    }
    if args.state_log_json.is_none() && args.dump_dashboard.is_none() {
        log::info!("headless run requested no outputs; window bootstrap skipped");
    }
    Ok(())
}
