//! Command line player for the simulated waveform generator
#![forbid(unsafe_code)]

use {
    clap::Parser,
    serde::{Deserialize, Serialize},
    std::{
        io::{ErrorKind, IsTerminal, Write as _},
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    },
    wavegen::{Calibration, Engine, Snapshot, hal::sim::SimHardware},
};

#[derive(clap::Parser)]
struct Args {
    /// Settings file (TOML with optional `[calibration]` and `[snapshot]` tables)
    path: Option<PathBuf>,
    /// Milliseconds simulated per written chunk
    #[arg(short = 'c', long, default_value = "10")]
    chunk_ms: u64,
    /// Stop after this many milliseconds instead of running until interrupted
    #[arg(short = 'd', long)]
    duration_ms: Option<u64>,
    /// Seed of the simulated random source
    #[arg(long, default_value = "1")]
    seed: u32,
    /// Level on the modulation input (0 to 4095), used when modulation is on
    #[arg(long, default_value = "4095")]
    analog: u16,
    /// Run the configured frequency sweep
    #[arg(long)]
    sweep: bool,
    /// Print the default settings file and exit
    #[arg(long)]
    print_defaults: bool,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    calibration: Calibration,
    snapshot: Snapshot,
}

fn main() -> std::io::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let args = Args::parse();
    if args.print_defaults {
        let text = toml::to_string(&Settings::default()).map_err(std::io::Error::other)?;
        print!("{text}");
        return Ok(());
    }
    let settings = match &args.path {
        Some(path) => load(path)?,
        None => Settings::default(),
    };
    let mut hw = SimHardware::new(args.seed);
    hw.analog = args.analog.min(4095);
    let mut eng = Engine::with_snapshot(hw, settings.calibration, &settings.snapshot);
    if args.sweep {
        eng.start_sweep(0).map_err(|e| {
            log::error!("Can't sweep: {e}");
            std::io::Error::other("Invalid sweep")
        })?;
    }
    let st = eng.status();
    log::info!(
        "{:?} at {:.4} Hz ({:.2}% duty) on {:?}, {:?} mode, square wave {:.4} Hz",
        eng.shape(),
        st.wave_freq,
        st.wave_duty,
        st.selector,
        st.mode,
        st.square_freq
    );

    let mut writer = std::io::stdout().lock();
    if writer.is_terminal() {
        log::error!("Refusing to write sample data to a terminal");
        return Err(std::io::Error::other(
            "Attempting to write sample data to terminal",
        ));
    }
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })
        .map_err(std::io::Error::other)?;
    }
    let chunk = args.chunk_ms.max(1);
    let mut now_ms = 0;
    while args.duration_ms.is_none_or(|end| now_ms < end) {
        eng.run_sim_ms(chunk);
        now_ms += chunk;
        eng.poll(now_ms);
        let result = writer.write_all(bytemuck::cast_slice(&eng.hw().dac));
        eng.hw_mut().clear_records();
        if let Err(e) = result {
            if e.kind() == ErrorKind::BrokenPipe {
                break;
            }
            return Err(e);
        }
        if stop.load(Ordering::Relaxed) {
            log::info!("Stopping at {now_ms} ms");
            break;
        }
    }
    writer.flush()
}

fn load(path: &PathBuf) -> std::io::Result<Settings> {
    let text = std::fs::read_to_string(path).inspect_err(|e| {
        log::error!("Failed to read '{}': {e}", path.display());
    })?;
    toml::from_str(&text).map_err(|e| {
        log::error!("Failed to parse '{}': {e}", path.display());
        std::io::Error::other("Settings parse error")
    })
}
