use piano_roll::config::RollConfig;
use piano_roll::console_display::ConsoleDisplay;
use piano_roll::renderer::PianoRoll;
use piano_roll::segment_buf::SegmentBuffer;
use piano_roll::segment_reader::{self, SegmentReader};
use piano_roll::simulator;
use piano_roll::surface::PixelBuffer;
use piano_roll::types::*;

use clap::Parser;
use crossbeam_channel::{bounded, TryRecvError};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "piano-roll")]
#[command(about = "Scrolling piano roll for a real-time note detector")]
struct Cli {
    /// Display width in pixels
    #[arg(long, default_value_t = 160)]
    width: i32,

    /// Display height in pixels
    #[arg(long, default_value_t = 128)]
    height: i32,

    /// JSON config file (missing fields keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the time shown on one screen width (ms)
    #[arg(long)]
    screen_ms: Option<u32>,

    /// Override the detector's minimum recognized segment duration (ms)
    #[arg(long)]
    min_segment_ms: Option<u32>,

    /// Write the effective config to this file and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Simulator demo: "scale" (default), "arpeggio" or "improv"
    #[arg(long, default_value = "scale")]
    demo: String,

    /// Times to play the demo (0 = forever)
    #[arg(long, default_value_t = 0)]
    repeats: u32,

    /// Replay a JSONL segment recording instead of running the simulator
    #[arg(long)]
    segments: Option<PathBuf>,

    /// Host loop period (ms). Must stay below the minimum segment duration.
    #[arg(long, default_value_t = 20)]
    tick_ms: u64,

    /// Mirror the roll on the terminal
    #[arg(long)]
    console: bool,

    /// Console refresh rate (Hz)
    #[arg(long, default_value_t = 10)]
    display_hz: u32,

    /// Stop after this many seconds (0 = when the input ends)
    #[arg(long, default_value_t = 0)]
    duration_s: u64,

    /// Clear the roll every N seconds (0 = never)
    #[arg(long, default_value_t = 0)]
    reset_every_s: u64,

    /// Segments kept in the history
    #[arg(long, default_value_t = 64)]
    history: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match RollConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        None => RollConfig::default(),
    };
    if let Some(ms) = cli.screen_ms {
        config.screen_time_span_ms = ms;
    }
    if let Some(ms) = cli.min_segment_ms {
        config.min_segment_ms = ms;
    }

    if let Some(path) = &cli.dump_config {
        if let Err(e) = config.save(path) {
            error!("{}", e);
            process::exit(1);
        }
        return;
    }

    // Load the recording up front so a bad file fails before anything is drawn
    let recording = match &cli.segments {
        Some(path) => Some(load_recording(path, &config)),
        None => None,
    };

    info!("═══════════════════════════════════════════════");
    info!("  PIANO ROLL v{}", env!("CARGO_PKG_VERSION"));
    info!("  Display: {}x{}  tick {}ms", cli.width, cli.height, cli.tick_ms);
    match &cli.segments {
        Some(path) => info!("  Input: recording {:?}", path),
        None => info!("  Input: simulator ({})", cli.demo),
    }
    if cli.console { info!("  UI: Console"); }
    info!("═══════════════════════════════════════════════");

    if cli.tick_ms >= config.min_segment_ms as u64 {
        warn!(
            "Tick period {}ms is not below the minimum segment duration {}ms; expect gaps",
            cli.tick_ms, config.min_segment_ms
        );
    }

    let clock = SessionClock::new();
    let mut roll = match PianoRoll::initialize(
        PixelBuffer::new(cli.width, cli.height),
        config.clone(),
        clock.now_ms(),
    ) {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid display configuration: {}", e);
            process::exit(1);
        }
    };

    // Channel: detector → host loop
    let (tx, rx) = bounded::<DetectorEvent>(1024);

    // ─── Detector feed ──────────────────────────────────────────────
    let feed_clock = clock.clone();
    let feed = match recording {
        Some(segments) => thread::Builder::new().name("replay".into()).spawn(move || {
            segment_reader::replay(&segments, &feed_clock, &tx);
        }),
        None => {
            let demo = cli.demo.clone();
            let repeats = cli.repeats;
            let min_ms = config.min_segment_ms;
            thread::Builder::new().name("simulator".into()).spawn(move || {
                simulator::Simulator::new(feed_clock, tx, min_ms, 10).run(&demo, repeats);
            })
        }
    };
    if let Err(e) = feed {
        error!("Failed to start detector feed: {}", e);
        process::exit(1);
    }

    // ─── Host loop ──────────────────────────────────────────────────
    let mut buffer = SegmentBuffer::new(cli.history);
    let mut console = cli.console.then(|| ConsoleDisplay::new(cli.display_hz));
    let span = config.screen_time_span_ms as AbsTime;
    let started = clock.now_ms();
    let mut last_reset = started;
    let mut feed_closed_at: Option<AbsTime> = None;
    let mut ticks: u64 = 0;
    let mut events: u64 = 0;

    loop {
        let now = clock.now_ms();

        loop {
            match rx.try_recv() {
                Ok(event) => {
                    buffer.apply(event);
                    events += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if feed_closed_at.is_none() {
                        info!("Detector feed ended after {} events", events);
                        feed_closed_at = Some(now);
                    }
                    break;
                }
            }
        }

        if cli.reset_every_s > 0 && now - last_reset >= cli.reset_every_s * 1000 {
            info!("Clearing roll");
            roll.clear(now);
            last_reset = now;
        }

        let report = roll.render_tick(now, buffer.last_offset(), &buffer);
        ticks += 1;
        if ticks % 500 == 0 {
            debug!(
                "{} ticks, {} segments held, cursor at {} (pass {})",
                ticks,
                buffer.len(),
                report.plan.cursor,
                report.plan.wraps
            );
        }

        if let Some(display) = console.as_mut() {
            if let Err(e) = display.maybe_show(now, roll.surface()) {
                warn!("Console display disabled: {}", e);
                console = None;
            }
        }

        let done = if cli.duration_s > 0 {
            now - started >= cli.duration_s * 1000
        } else {
            // let the last notes scroll across once more
            feed_closed_at.is_some_and(|t| now - t >= span)
        };
        if done {
            break;
        }

        let spent = clock.now_ms() - now;
        thread::sleep(Duration::from_millis(cli.tick_ms.saturating_sub(spent)));
    }

    info!("Stopped after {} ticks, {} detector events", ticks, events);
}

fn load_recording(path: &Path, config: &RollConfig) -> Vec<NoteSegment> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to open recording {:?}: {}", path, e);
            process::exit(1);
        }
    };
    let reader = match SegmentReader::open(BufReader::new(file)) {
        Ok(r) => r,
        Err(e) => {
            error!("Bad recording {:?}: {}", path, e);
            process::exit(1);
        }
    };
    if let Some(ms) = reader.header.min_segment_ms {
        if ms != config.min_segment_ms {
            warn!(
                "Recording was made with min_segment_ms={} but the roll uses {}",
                ms, config.min_segment_ms
            );
        }
    }
    if !reader.header.title.is_empty() {
        info!("Recording: {}", reader.header.title);
    }
    reader.read_all()
}
