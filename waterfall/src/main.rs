#[macro_use]
extern crate log;
#[macro_use]
extern crate glium;
extern crate nalgebra as na;

mod renderer;

use waterfall_core::analyzer;
use waterfall_core::attributes::{SpectrumWaterfallAttributes, WaterfallDisplayAttributes};
use waterfall_core::recorder::Recorder;
use waterfall_core::script::{self, Script};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

fn build_script() -> Box<dyn Script> {
    let name = waterfall_core::CONFIG.get_or("waterfall.script", "spectrum".to_string());

    match &*name {
        "spectrum" => Box::new(script::SpectrumWaterfall::new(
            SpectrumWaterfallAttributes::from_config(),
        )),
        "display" => Box::new(script::WaterfallDisplay::new(
            WaterfallDisplayAttributes::from_config(),
        )),
        _ => {
            warn!("Unknown script `{}`, using spectrum", name);
            Box::new(script::SpectrumWaterfall::new(
                SpectrumWaterfallAttributes::from_config(),
            ))
        }
    }
}

fn play(script: &mut dyn Script, recorder: &mut dyn Recorder, slot: &str) {
    match script.play(recorder, slot) {
        Ok(()) => info!("Playing `{}`", slot),
        Err(e) => error!("{}", e),
    }
}

/// Returns false if the app should quit
fn on_key(key: &Key, script: &mut dyn Script, recorder: &mut dyn Recorder) -> bool {
    let mut attributes = script.attributes().clone();

    match key {
        Key::Named(NamedKey::Escape) => return false,
        Key::Named(NamedKey::Space) => {
            script.stop(recorder);
            info!("Stopped");
            return true;
        }
        Key::Named(NamedKey::ArrowUp) => attributes.length = (attributes.length + 16).min(256),
        Key::Named(NamedKey::ArrowDown) => {
            attributes.length = attributes.length.saturating_sub(16).max(16)
        }
        Key::Named(NamedKey::ArrowRight) => attributes.fft_size = attributes.fft_size.doubled(),
        Key::Named(NamedKey::ArrowLeft) => attributes.fft_size = attributes.fft_size.halved(),
        Key::Character(c) => match c.as_str() {
            "a" => attributes.active = !attributes.active,
            "c" => attributes.cycle_colors = !attributes.cycle_colors,
            digit => {
                if let Some(n) = digit.parse::<usize>().ok().filter(|n| (1..=9).contains(n)) {
                    match recorder.slots().get(n - 1) {
                        Some(slot) => play(script, recorder, slot),
                        None => warn!("No sound slot #{}", n),
                    }
                }
                return true;
            }
        },
        _ => return true,
    }

    info!(
        "{}: active={} cycle_colors={} fft_size={} length={}",
        script.name(),
        attributes.active,
        attributes.cycle_colors,
        attributes.fft_size.get(),
        attributes.length
    );
    script.set_attributes(attributes);
    true
}

fn main() {
    waterfall_core::default_config();
    waterfall_core::default_log();

    let mut script = build_script();

    let mut frames = {
        // Analyzer {{{
        let handle = script.analyser().clone();
        let mut analyzer = analyzer::FourierBuilder::new()
            .settings(handle.get())
            .plan();

        waterfall_core::Visualizer::new(
            analyzer::Spectrum::new(
                vec![-script::NOISE_FLOOR; analyzer.buckets()],
                0.0,
                1.0,
            ),
            move |info, samples| {
                analyzer.follow(&handle);
                info.assign_from(&analyzer.analyze(samples));
            },
        )
        .frames()
        .expect("Can't set up audio")
        // }}}
    };

    info!(
        "Sound slots: {:?}",
        frames.recorder().slots()
    );

    let autoplay = waterfall_core::CONFIG.get_or("waterfall.autoplay", String::new());
    if !autoplay.is_empty() {
        play(&mut *script, frames.recorder_mut(), &autoplay);
    }

    // Config {{{
    let window_width = waterfall_core::CONFIG.get_or("window.width", 1280);
    let window_height = waterfall_core::CONFIG.get_or("window.height", 720);

    let frame_time =
        std::time::Duration::from_micros(1000000 / waterfall_core::CONFIG.get_or("waterfall.fps", 60));
    // }}}

    // Window Initialization {{{
    let event_loop = winit::event_loop::EventLoopBuilder::new()
        .build()
        .expect("Can't create event loop");
    let (window, display) = glium::backend::glutin::SimpleWindowBuilder::new()
        .with_title(&format!("Waterfall - {}", script.name()))
        .with_inner_size(window_width, window_height)
        .build(&event_loop);
    // }}}

    let mut renderer = renderer::Renderer::new(&display, renderer::Camera::from_config());

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::Resized(size) => display.resize(size.into()),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } => {
                    if !on_key(&logical_key, &mut *script, frames.recorder_mut()) {
                        target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let start = std::time::Instant::now();

                    let frame = match frames.next_frame() {
                        Some(f) => f,
                        None => {
                            info!("Recorder ran dry");
                            target.exit();
                            return;
                        }
                    };
                    trace!("Frame {} ({:.3}s)", frame.frame, frame.delta);

                    frames.info(|window| script.update(frame.delta, &window.as_ref()));
                    renderer.draw(&display, script.mesh());

                    let dur = start.elapsed();
                    if dur < frame_time {
                        std::thread::sleep(frame_time - dur);
                    }
                }
                _ => (),
            },
            Event::AboutToWait => window.request_redraw(),
            _ => (),
        })
        .expect("Event loop failed");
}
