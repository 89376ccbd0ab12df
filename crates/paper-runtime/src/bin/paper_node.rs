use clap::Parser;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use paper_core::{UnifiedExpression, UnifiedTrackingData};
use paper_runtime::{init_tracing, TrackingModule};

/// PaperTracker node - Run the tracking module outside a host and log what it pulls
#[derive(Parser, Debug)]
#[command(name = "paper-node", version, long_about = None)]
struct Args {
    /// Directory holding the configuration documents
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Host tick period in milliseconds
    #[arg(long, default_value_t = 8)]
    tick_ms: u64,

    /// Report period in milliseconds
    #[arg(long, default_value_t = 1000)]
    report_ms: u64,

    /// Log as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Do not build the eye engine
    #[arg(long, default_value_t = false)]
    no_eye: bool,

    /// Do not build the expression router
    #[arg(long, default_value_t = false)]
    no_face: bool,

    /// Exit after this many seconds (runs until killed if omitted)
    #[arg(long)]
    duration_secs: Option<u64>,
}

fn report(data: &UnifiedTrackingData) {
    let left = &data.eye.left;
    let right = &data.eye.right;
    tracing::info!(
        left_gaze_x = left.gaze.x,
        left_gaze_y = left.gaze.y,
        left_openness = left.openness,
        right_gaze_x = right.gaze.x,
        right_gaze_y = right.gaze.y,
        right_openness = right.openness,
        pupil_mm = left.pupil_diameter_mm,
        "eye"
    );

    let active: Vec<String> = UnifiedExpression::ALL
        .iter()
        .map(|&e| (e, data.weight(e)))
        .filter(|(_, w)| *w != 0.0)
        .map(|(e, w)| format!("{:?}={:.2}", e, w))
        .collect();
    tracing::info!(shapes = %active.join(" "), "expressions");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.json)?;

    let mut module = TrackingModule::new();
    let (eye, face) = module.initialize(&args.dir, !args.no_eye, !args.no_face);
    if !eye && !face {
        tracing::warn!("Neither engine is running; nothing to report");
    }
    if let Some(osc) = module.osc() {
        tracing::info!(
            state = %osc.state(),
            eye = ?osc.eye_addr(),
            face = ?osc.face_addr(),
            "Listening"
        );
    }

    let tick = Duration::from_millis(args.tick_ms.max(1));
    let report_every = Duration::from_millis(args.report_ms.max(1));
    let deadline = args.duration_secs.map(|s| Instant::now() + Duration::from_secs(s));

    let mut data = UnifiedTrackingData::new();
    let mut last_report = Instant::now();

    while deadline.map_or(true, |d| Instant::now() < d) {
        module.update(&mut data);
        if last_report.elapsed() >= report_every {
            report(&data);
            last_report = Instant::now();
        }
        thread::sleep(tick);
    }

    module.teardown();
    Ok(())
}
