use std::thread;
use std::time::Duration;

use anyhow::Result;

use gesso_core::hooks::{Hook, HookResult, SketchHook, shared};
use gesso_core::input::{KeyAction, KeyEvent, PointerAction, PointerButton, PointerEvent};
use gesso_core::logging::{LoggingConfig, init_logging};
use gesso_core::sketch::{ExitAction, Sketch, SketchBuilder};

const COLUMNS: u32 = 64;
const FRAMES: u64 = 60;

/// Counts frames from the post hook and reports on dispose.
struct Telemetry {
    frames: u64,
}

impl SketchHook for Telemetry {
    fn post(&mut self, _sketch: &Sketch) -> HookResult {
        self.frames += 1;
        Ok(())
    }

    fn dispose(&mut self, sketch: &Sketch) -> HookResult {
        println!();
        println!(
            "  [TELEMETRY] {} frames plotted, {:.1} fps measured, {} ms on the wall",
            self.frames,
            sketch.frame_rate(),
            sketch.millis()
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // Startup banner, printed before the first frame lands.
    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║          GESSO SKETCHBOOK v0.1         ║");
    println!("  ║   headless surface  ·  ascii plotter   ║");
    println!("  ╠════════════════════════════════════════╣");
    println!("  ║  One row per frame. Drag inks a brush  ║");
    println!("  ║  mark; the wave plots itself.          ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let telemetry = shared(Telemetry { frames: 0 });

    let runtime = SketchBuilder::new()
        .size(COLUMNS, 24)
        .frame_rate(30.0)
        .exit_action(ExitAction::ReturnFromRun)
        .setup(|sketch| {
            println!(
                "  canvas {}x{} on \"{}\"",
                sketch.width(),
                sketch.height(),
                sketch.renderer_id()
            );
            println!();
            Ok(())
        })
        .draw(|sketch| {
            println!("{}", trace_row(sketch));
            if sketch.frame_count() + 1 >= FRAMES {
                sketch.exit();
            }
            Ok(())
        })
        .pointer_dragged(|_, event| {
            log::debug!("brush dragged to ({}, {})", event.x, event.y);
            Ok(())
        })
        .pointer_released(|_, event| {
            println!("  >> brush lifted at column {}", event.x);
            Ok(())
        })
        .key_typed(|_, event| {
            println!("  >> key '{}'", event.key);
            Ok(())
        })
        .hook(Hook::Post, "telemetry", telemetry.clone())
        .hook(Hook::Dispose, "telemetry", telemetry)
        .build()?;

    // Scripted operator: a brush stroke across the canvas, then a keystroke.
    let controller = runtime.controller();
    let script = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        controller.post_event(
            PointerEvent::new(PointerAction::Press, 4, 12).with_button(PointerButton::Left),
        );
        for step in 0..12 {
            thread::sleep(Duration::from_millis(60));
            controller.post_event(
                PointerEvent::new(PointerAction::Drag, 4 + step * 5, 12)
                    .with_button(PointerButton::Left),
            );
        }
        controller.post_event(
            PointerEvent::new(PointerAction::Release, 63, 12).with_button(PointerButton::Left),
        );
        thread::sleep(Duration::from_millis(100));
        controller.post_event(KeyEvent::new(KeyAction::Press, 'g', 71));
        controller.post_event(KeyEvent::new(KeyAction::Type, 'g', 0));
        controller.post_event(KeyEvent::new(KeyAction::Release, 'g', 71));
    });

    let outcome = runtime.run();
    script.join().ok();
    outcome?;

    println!();
    println!("  Sketch complete. The gallery awaits.");
    println!();
    Ok(())
}

/// One frame of the plot: a wave crest, plus the brush while it is down.
fn trace_row(sketch: &Sketch) -> String {
    let width = sketch.width() as usize;
    let mut row = vec![b'.'; width];

    let phase = sketch.frame_count() as f32 * 0.21;
    let crest = ((phase.sin() * 0.45 + 0.5) * width as f32) as usize;
    row[crest.min(width - 1)] = b'*';

    if sketch.is_pointer_pressed() {
        let brush = sketch.pointer_x().clamp(0, width as i32 - 1) as usize;
        row[brush] = b'@';
    }

    let mut line = format!("  |{}|", String::from_utf8_lossy(&row));
    if sketch.frame_count() % 10 == 0 {
        line.push_str(&format!("  {:5.1} fps", sketch.frame_rate()));
    }
    line
}
