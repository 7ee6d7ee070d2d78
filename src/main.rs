use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::info;
use pollster::block_on;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, KeyboardInput, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use tumble::{obj, InputState, Key, Model, Renderer, Scene, Stopwatch};

/// Fixed timestep used when running without a window.
const HEADLESS_STEP: f64 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let mut scene = Scene::new();
    if options.models.is_empty() {
        info!("no model files given; using the built-in cube");
        scene.spawn(Model::unit_cube());
    } else {
        for path in &options.models {
            let model = obj::load_from_file(path)
                .with_context(|| format!("failed to load model {path}"))?;
            scene.spawn(model);
        }
    }

    println!(
        "Loaded scene with {} model(s) and {} actor(s)",
        scene.models.len(),
        scene.actors.len()
    );
    for (_, model) in scene.models.iter() {
        println!(" - {} ({} part(s))", model.name(), model.parts().len());
    }

    let input = InputState::new();

    if options.summary_only {
        return run_headless(&mut scene, &input, &options);
    }
    match run_interactive(&mut scene, &input) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(&mut scene, &input, &options)
            } else {
                Err(err)
            }
        }
    }
}

/// Runs the same core loop without a window at a fixed 60 Hz step,
/// optionally pressing the configured spin keys for the first frame.
fn run_headless(scene: &mut Scene, input: &InputState, options: &CliOptions) -> Result<()> {
    if let Some(spin) = options.spin {
        press_spin_keys(input, spin);
    }
    for frame in 0..options.frames {
        scene.handle_input(input);
        scene.update(HEADLESS_STEP);
        if frame == 0 {
            release_spin_keys(input);
        }
    }
    print_final_state(scene);
    Ok(())
}

fn run_interactive(scene: &mut Scene, input: &InputState) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Tumble")
            .with_inner_size(LogicalSize::new(1000.0, 800.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let mut renderer = block_on(Renderer::new(Arc::clone(&window)))?;
    scene.camera.set_aspect_ratio(aspect(window.inner_size()));

    let mut stopwatch = Stopwatch::new();
    stopwatch.start();
    let mut last_error: Option<anyhow::Error> = None;

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, window_id } if window_id == renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input.request_close();
                    }
                    WindowEvent::Resized(size) => {
                        renderer.resize(size);
                        scene.camera.set_aspect_ratio(aspect(size));
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        scene.camera.set_aspect_ratio(aspect(*new_inner_size));
                    }
                    WindowEvent::KeyboardInput {
                        input: keyboard, ..
                    } => {
                        handle_keyboard(input, &keyboard);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(position) => position.y as f32,
                        };
                        if scroll != 0.0 {
                            scene.camera.zoom(scroll > 0.0);
                        }
                    }
                    _ => {}
                }
            }
            Event::MainEventsCleared => {
                // Frame step: input, then update, then a redraw request.
                let dt = stopwatch.lap();
                scene.handle_input(input);
                scene.update(dt);
                if input.should_close() {
                    control_flow.set_exit();
                } else {
                    renderer.window().request_redraw();
                }
            }
            Event::RedrawRequested(window_id) if window_id == renderer.window_id() => {
                if let Err(err) = renderer.render(scene) {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            let size = renderer.window().inner_size();
                            renderer.resize(size);
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            last_error = Some(anyhow!("GPU is out of memory"));
                            control_flow.set_exit();
                        }
                        wgpu::SurfaceError::Timeout => {
                            info!("Surface timeout; retrying next frame");
                        }
                    }
                }
            }
            _ => {}
        }
    });

    if let Some(err) = last_error {
        return Err(err);
    }

    print_final_state(scene);
    Ok(())
}

fn aspect(size: PhysicalSize<u32>) -> f32 {
    if size.height == 0 {
        1.0
    } else {
        size.width as f32 / size.height as f32
    }
}

fn handle_keyboard(input: &InputState, keyboard: &KeyboardInput) {
    let Some(key) = keyboard.virtual_keycode.and_then(map_keycode) else {
        return;
    };
    match keyboard.state {
        ElementState::Pressed => input.set_key_down(key),
        ElementState::Released => input.set_key_up(key),
    }
}

fn map_keycode(code: winit::event::VirtualKeyCode) -> Option<Key> {
    use winit::event::VirtualKeyCode as Code;
    Some(match code {
        Code::Left => Key::Left,
        Code::Right => Key::Right,
        Code::Up => Key::Up,
        Code::Down => Key::Down,
        Code::LShift => Key::LeftShift,
        Code::RShift => Key::RightShift,
        Code::Space => Key::Space,
        Code::Escape => Key::Escape,
        _ => return None,
    })
}

fn print_final_state(scene: &Scene) {
    println!("Final actor states:");
    for actor in &scene.actors {
        let Some(model) = scene.models.get(actor.model()) else {
            continue;
        };
        let (axis, angle) = model.orientation();
        println!(
            " - {}: {} rotation={:.1} deg about ({:.2}, {:.2}, {:.2})",
            model.name(),
            if actor.is_idle() { "idle" } else { "rotating" },
            angle.to_degrees(),
            axis.x,
            axis.y,
            axis.z
        );
    }
}

/// Rotation requested via `--spin`, expressed through the same key
/// bindings the interactive loop uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinAxis {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl SpinAxis {
    fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "x" | "+x" => SpinAxis::PositiveX,
            "-x" => SpinAxis::NegativeX,
            "y" | "+y" => SpinAxis::PositiveY,
            "-y" => SpinAxis::NegativeY,
            "z" | "+z" => SpinAxis::PositiveZ,
            "-z" => SpinAxis::NegativeZ,
            _ => return None,
        })
    }
}

fn press_spin_keys(input: &InputState, spin: SpinAxis) {
    match spin {
        SpinAxis::PositiveX => input.set_key_down(Key::Left),
        SpinAxis::NegativeX => input.set_key_down(Key::Right),
        SpinAxis::PositiveZ => input.set_key_down(Key::Up),
        SpinAxis::NegativeZ => input.set_key_down(Key::Down),
        SpinAxis::PositiveY => {
            input.set_key_down(Key::LeftShift);
            input.set_key_down(Key::Right);
        }
        SpinAxis::NegativeY => {
            input.set_key_down(Key::LeftShift);
            input.set_key_down(Key::Left);
        }
    }
}

fn release_spin_keys(input: &InputState) {
    for key in [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::LeftShift,
    ] {
        input.set_key_up(key);
    }
}

struct CliOptions {
    models: Vec<String>,
    summary_only: bool,
    spin: Option<SpinAxis>,
    frames: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut models = Vec::new();
        let mut summary_only = false;
        let mut spin = None;
        let mut frames = 240;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--spin" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--spin requires an axis argument"))?;
                    spin = Some(SpinAxis::parse(&value).ok_or_else(|| {
                        anyhow!("invalid spin axis: {value}. Expected x, y, z, -x, -y or -z")
                    })?);
                }
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames requires a count"))?;
                    frames = value
                        .parse::<u32>()
                        .map_err(|err| anyhow!("invalid frame count {value}: {err}"))?;
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: tumble [model.obj ...] \
                         [--summary-only] [--spin <x|y|z|-x|-y|-z>] [--frames N]"
                    ));
                }
                path => models.push(path.to_string()),
            }
        }

        Ok(Self {
            models,
            summary_only,
            spin,
            frames,
        })
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}
