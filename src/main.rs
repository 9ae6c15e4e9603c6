use std::error;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use argh::FromArgs;
use eyre::{eyre, Result};
use fundu::DurationParser;
use log::info;

use greenbutler::butler::{Butler, StdDelay};
use greenbutler::config::AppConfig;
use greenbutler_driver::mem::{MemIo, MemScreen, ScriptedProbe};
use greenbutler_driver::{
    DigitalIo, Display, HygroProbe, ProbeError, Reading, Relay, Sensors, TextScreen,
};

/// Pause between orchestrator ticks; polling cadence is configured
/// separately.
const TICK_MS: u64 = 250;

/// Greenhouse/incubator butler: polls the probe, drives the relays, renders
/// the panel.
#[derive(FromArgs)]
struct Args {
    /// path to a JSON config file
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// override the poll interval, e.g. "2s" or "1500ms"
    #[argh(option, short = 'i')]
    interval: Option<String>,

    /// run against in-memory hardware and log each frame
    #[argh(switch)]
    simulate: bool,

    /// gpio character device for hardware mode
    #[argh(option, default = "String::from(\"/dev/gpiochip0\")")]
    chip: String,

    /// stop after this many ticks (0 means run forever)
    #[argh(option, default = "0")]
    cycles: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let mut cfg = AppConfig::load(args.config.as_deref().map(Path::new))?;
    if let Some(text) = &args.interval {
        cfg.sensor.read_interval_ms = parse_interval_ms(text)?;
    }
    info!(
        "{} starting, polling every {} ms",
        cfg.system.name_version, cfg.sensor.read_interval_ms
    );

    if args.simulate {
        run_simulated(&cfg, args.cycles)
    } else {
        run_hardware(&cfg, &args)
    }
}

fn parse_interval_ms(text: &str) -> Result<u64> {
    let parsed = DurationParser::new()
        .parse(text)
        .map_err(|e| eyre!("cannot parse interval {text:?}: {e}"))?;
    let duration = Duration::try_from(parsed)
        .map_err(|e| eyre!("interval {text:?} is out of range: {e}"))?;

    Ok(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Canned climate sweep for simulate mode: warm-up, overshoot, cool-down,
/// with one bad read thrown in.
fn sim_profile() -> Vec<Result<Reading, ProbeError>> {
    let sweep = [
        (26.4, 41.0),
        (27.1, 44.5),
        (27.9, 48.0),
        (28.6, 52.5),
        (29.4, 58.0),
        (30.1, 63.0),
        (29.2, 66.5),
        (28.4, 62.0),
        (27.6, 55.0),
    ];

    let mut script: Vec<Result<Reading, ProbeError>> = sweep
        .into_iter()
        .map(|(temperature, humidity)| {
            Ok(Reading {
                temperature,
                humidity,
            })
        })
        .collect();
    script.insert(2, Err(ProbeError::Checksum));
    script
}

fn run_simulated(cfg: &AppConfig, cycles: u64) -> Result<()> {
    info!("running against in-memory peripherals");

    let io = MemIo::new();
    let screen = MemScreen::with_size(cfg.display.columns, cfg.display.lines);
    let relay = Relay::new(io.clone(), cfg.relay_pins());
    let display = Display::new(screen.clone(), StdDelay, cfg.banner());
    let sensors = Sensors::new(ScriptedProbe::cycle(sim_profile()));
    let mut butler = Butler::new(relay, display, sensors, io.clone(), StdDelay, cfg);

    butler.begin()?;
    run_loop(&mut butler, cycles, Some(&screen))
}

#[cfg(feature = "hardware")]
fn run_hardware(cfg: &AppConfig, args: &Args) -> Result<()> {
    use greenbutler::hw;
    use linux_embedded_hal::Delay;

    info!("opening lines on {}", args.chip);

    let relays = hw::open_relays(&args.chip, &cfg.pins)?;
    let panel = hw::open_panel(&args.chip, &cfg.pins)?;
    let screen = hw::open_screen(&args.chip, &cfg.pins)?;
    let probe = hw::open_probe(&args.chip, &cfg.pins)?;

    let relay = Relay::new(relays, cfg.relay_pins());
    let display = Display::new(screen, Delay, cfg.banner());
    let sensors = Sensors::new(probe);
    let mut butler = Butler::new(relay, display, sensors, panel, Delay, cfg);

    butler.begin()?;
    run_loop(&mut butler, args.cycles, None)
}

#[cfg(not(feature = "hardware"))]
fn run_hardware(_cfg: &AppConfig, _args: &Args) -> Result<()> {
    use eyre::bail;

    bail!("built without the hardware feature; rebuild with --features hardware or pass --simulate")
}

fn run_loop<IO, S, D, P, EIO, ES>(
    butler: &mut Butler<IO, S, D, P>,
    cycles: u64,
    peek: Option<&MemScreen>,
) -> Result<()>
where
    IO: DigitalIo<Error = EIO>,
    S: TextScreen<Error = ES>,
    D: embedded_hal::blocking::delay::DelayMs<u16>,
    P: HygroProbe,
    EIO: error::Error + Send + Sync + 'static,
    ES: error::Error + Send + Sync + 'static,
{
    let started = Instant::now();
    let mut last_frame = String::new();
    let mut ticks = 0_u64;

    loop {
        let now = chrono::Local::now();
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M").to_string();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        butler.process(elapsed, &date, &time)?;

        if let Some(screen) = peek {
            let frame = screen.frame();
            if frame != last_frame {
                for line in frame.lines() {
                    info!("panel |{line}|");
                }
                last_frame = frame;
            }
        }

        ticks += 1;
        if cycles != 0 && ticks >= cycles {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(TICK_MS));
    }
}
