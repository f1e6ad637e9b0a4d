mod config;
mod constants;
mod renderer;
mod simulation;
mod utils;

use std::{sync::Arc, time::Instant};

use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use config::GridConfig;
use constants::FPS_UPDATE_INTERVAL_SECS;
use renderer::Renderer;
use simulation::SimulationState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let grid = GridConfig::default();
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("gridlife")
            .with_inner_size(grid.window_size())
            .with_resizable(false)
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), grid));
    let mut simulation = SimulationState::new(grid);
    simulation.restart(true);
    renderer.upload_cells(simulation.current_cells(), simulation.active_buffer());

    let mut is_paused = false;
    let mut last_fps_update_time = Instant::now();
    let mut frames_since_last_fps_update = 0u32;
    let mut current_fps = 0.0;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(physical_size) => renderer.resize(physical_size),
                WindowEvent::ScaleFactorChanged { .. } => renderer.resize(window.inner_size()),
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state == ElementState::Pressed && !key_event.repeat {
                        match key_event.physical_key {
                            PhysicalKey::Code(KeyCode::KeyR) => {
                                simulation.restart(true);
                                renderer.upload_cells(
                                    simulation.current_cells(),
                                    simulation.active_buffer(),
                                );
                            }
                            PhysicalKey::Code(KeyCode::KeyC) => {
                                simulation.restart(false);
                                renderer.upload_cells(
                                    simulation.current_cells(),
                                    simulation.active_buffer(),
                                );
                            }
                            PhysicalKey::Code(KeyCode::Space) => {
                                is_paused = !is_paused;
                                log::info!(
                                    "{}",
                                    if is_paused { "Paused" } else { "Resumed" }
                                );
                            }
                            PhysicalKey::Code(KeyCode::Escape) => elwt.exit(),
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    frames_since_last_fps_update += 1;
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
                    if elapsed_secs >= FPS_UPDATE_INTERVAL_SECS {
                        current_fps = frames_since_last_fps_update as f64 / elapsed_secs;
                        last_fps_update_time = now;
                        frames_since_last_fps_update = 0;
                    }

                    match renderer.frame(simulation.active_buffer(), !is_paused) {
                        Ok(()) => {
                            if !is_paused {
                                simulation.advance();
                            }
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.resize(renderer.size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU Error: OutOfMemory");
                            elwt.exit();
                        }
                        // No drawable this tick: drop the frame, generation
                        // and grids stay untouched, try again next tick.
                        Err(e) => log::warn!("frame skipped: {:?}", e),
                    }

                    let paused_text = if is_paused { " [PAUSED]" } else { "" };
                    window.set_title(&format!(
                        "gridlife - gen {} - FPS: {:.1}{}",
                        simulation.generation(),
                        current_fps,
                        paused_text
                    ));
                }
                _ => {}
            },
            _ => {}
        }
    })?;
    Ok(())
}
