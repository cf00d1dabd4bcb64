use std::io::Write;
use std::sync::mpsc;
use std::time::Duration;

use framelink_anim::{Animator, Progress};
use framelink_core::dispatch::FrameDispatcher;
use framelink_core::logging::{LoggingConfig, init_logging};

const BAR_WIDTH: usize = 40;

fn main() {
    init_logging(LoggingConfig::default());

    println!();
    println!("  framelink demo — eased progress against a 60 fps timer");
    println!();

    let dispatcher = FrameDispatcher::with_preferred_fps(60.0);
    log::info!("dispatcher up, max fps ceiling: {}", dispatcher.max_fps());

    let (done_tx, done_rx) = mpsc::channel();

    let sweep = Animator::new(&dispatcher, Duration::from_secs(3))
        .on_frame(draw_bar)
        .on_complete(move |finished| {
            let _ = done_tx.send(finished);
        });
    sweep.run();

    let finished = done_rx
        .recv_timeout(Duration::from_secs(10))
        .unwrap_or(false);

    println!();
    println!();
    if finished {
        println!("  done — observed rate at the last tick: {:.1} fps", dispatcher.fps());
    } else {
        println!("  the timer never ticked; nothing animated");
    }
    println!();
}

fn draw_bar(progress: Progress) {
    let eased = progress.eased_in_out(1);
    let filled = (eased * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);

    print!(
        "\r  [{}{}] {:5.1}%  frame {:3}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        progress.fraction * 100.0,
        progress.index,
    );
    let _ = std::io::stdout().flush();
}
