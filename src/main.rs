mod config;
mod gfx;
mod wayland;

use anyhow::{Context as _, Result};
use config::Config;
use gfx::{program::load_shader_program, shader_source::ShaderSource, triangle::Triangle};
use glow::HasContext;
use log::{error, info};
use std::time::Instant;
use wayland::egl::EglContext;
use wayland::WaylandState;
use wayland_client::{Connection, Proxy};

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        error!("{:#}", err);
        std::process::exit(-1);
    }
}

fn run() -> Result<()> {
    let config = Config::or_default(Config::load());
    let mut size = [config.size.width, config.size.height];

    info!("Connecting to Wayland...");
    let conn = Connection::connect_to_env().context("Failed to connect to Wayland")?;
    let display = conn.display();

    let mut event_queue = conn.new_event_queue();
    let qh = event_queue.handle();
    let _registry = display.get_registry(&qh, ());

    let mut state = WaylandState::new();
    event_queue.roundtrip(&mut state)?;

    state.create_window(&qh, &config.title)?;
    while !state.configured {
        event_queue.blocking_dispatch(&mut state)?;
    }
    if let Some(requested) = state.pending_size.take() {
        size = requested;
    }
    info!("Window configured at {}x{}", size[0], size[1]);

    let surface = state
        .surface
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Window surface missing after configure"))?;
    let display_ptr = display.id().as_ptr() as *mut _;
    let mut egl = EglContext::new(display_ptr, surface, size)?;

    let gl = unsafe { glow::Context::from_loader_function(|s| egl.get_proc_address(s)) };
    info!("GL version: {}", unsafe { gl.get_parameter_string(glow::VERSION) });

    info!("Loading shaders from {}", config.shader_path.display());
    let source = ShaderSource::load(&config.shader_path)?;
    let program = load_shader_program(&gl, &source)?;
    let triangle = Triangle::new(gl, program, config.clear_color)?;

    let frame_time = config.frame_time();
    while state.running {
        let frame_start = Instant::now();
        event_queue.dispatch_pending(&mut state)?;

        if let Some(requested) = state.pending_size.take() {
            if requested != size {
                info!("Resized to {}x{}", requested[0], requested[1]);
                size = requested;
                egl.resize(size);
            }
        }

        triangle.draw(size);
        egl.swap_buffers()?;
        conn.flush()?;

        if let Some(remaining) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!("Shutting down");
    drop(triangle);
    drop(egl);
    Ok(())
}
