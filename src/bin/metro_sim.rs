//! Desktop demo: drive the track simulator with both controllers.
//!
//! Usage: `metro_sim [STATIONS] [CONFIG.json]`
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rs_metro::catalog::ASSET_COUNT;
use rs_metro::hal::{StdClock, TrackSim};
use rs_metro::traits::{Clock, Vehicle};
use rs_metro::{
    AssetCatalog, AudioAsset, AudioEvent, AudioOutput, Config, CueSet, JourneyEvent,
    MotionController, SoundFeedbackController,
};

/// Give up if a single station takes longer than this.
const STATION_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Audio backend that only keeps time: cues advance at their rate and
/// report when a non-looping one reaches its end.
struct TimedAudio {
    catalog: AssetCatalog,
    playing: CueSet,
    positions: [f32; ASSET_COUNT],
    rates: [f32; ASSET_COUNT],
}

impl TimedAudio {
    fn new(catalog: AssetCatalog) -> Self {
        Self {
            catalog,
            playing: CueSet::new(),
            positions: [0.0; ASSET_COUNT],
            rates: [1.0; ASSET_COUNT],
        }
    }

    fn advance(&mut self, dt_ms: u64) -> heapless::Vec<AudioEvent, ASSET_COUNT> {
        let dt_s = dt_ms as f32 / 1000.0;
        let mut finished = heapless::Vec::new();
        let playing = self.playing;
        for asset in playing.iter() {
            let i = asset.index();
            let duration = self.catalog.duration(asset);
            self.positions[i] += dt_s * self.rates[i];
            if self.positions[i] < duration {
                continue;
            }
            if self.catalog.is_looping(asset) {
                self.positions[i] %= duration.max(f32::EPSILON);
            } else {
                self.playing.remove(asset);
                self.positions[i] = 0.0;
                // One slot per asset, cannot overflow
                let _ = finished.push(AudioEvent::Finished(asset));
            }
        }
        finished
    }
}

impl AudioOutput for TimedAudio {
    type Error = core::convert::Infallible;

    fn play(&mut self, asset: AudioAsset) -> Result<(), Self::Error> {
        info!(
            cue = asset.as_str(),
            at = self.positions[asset.index()],
            "play"
        );
        self.playing.insert(asset);
        Ok(())
    }

    fn stop(&mut self, asset: AudioAsset) -> Result<(), Self::Error> {
        debug!(cue = asset.as_str(), "stop");
        self.playing.remove(asset);
        self.positions[asset.index()] = 0.0;
        self.rates[asset.index()] = 1.0;
        Ok(())
    }

    fn seek(&mut self, asset: AudioAsset, position_s: f32) -> Result<(), Self::Error> {
        self.positions[asset.index()] = position_s;
        Ok(())
    }

    fn set_rate(&mut self, asset: AudioAsset, rate: f32) -> Result<(), Self::Error> {
        self.rates[asset.index()] = rate;
        Ok(())
    }
}

fn load_config(path: Option<String>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    load_config_file(&path)
}

#[cfg(feature = "serde-json-core")]
fn load_config_file(path: &str) -> Result<Config> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    Config::from_json(&bytes).with_context(|| format!("loading {path}"))
}

#[cfg(not(feature = "serde-json-core"))]
fn load_config_file(path: &str) -> Result<Config> {
    bail!("cannot load {path}: built without the serde-json-core feature")
}

/// Turn automatic operation off and let the sound side follow the
/// emergency stop.
fn disengage(
    autopilot: &mut MotionController<TrackSim>,
    sound: &mut SoundFeedbackController<TimedAudio>,
) -> Result<()> {
    if let Some(JourneyEvent::EmergencyStop { speed }) = autopilot.deactivate()? {
        warn!(speed, "emergency stop");
        sound.emergency_braking(speed);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let stations: u32 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid station count: {arg}"))?,
        None => 3,
    };
    if stations == 0 {
        bail!("station count must be at least 1");
    }
    let config = load_config(args.next())?;
    config.validate()?;

    let tick_ms = config.sim.tick_ms;
    let sim = TrackSim::new(config.sim.clone()).with_last_station(stations - 1);
    let mut autopilot = MotionController::with_config(sim, config.autopilot.clone());
    let mut sound = SoundFeedbackController::with_config(
        TimedAudio::new(config.sound.catalog.clone()),
        config.sound.clone(),
    );

    let wall = StdClock::new();
    info!(stations, tick_ms, "starting automatic operation");
    autopilot.activate(0)?;

    let mut served = 0u32;
    let mut last_progress_ms = 0u64;
    loop {
        autopilot.vehicle_mut().step(tick_ms);
        let now = autopilot.vehicle().now_ms();
        for event in sound.audio_mut().advance(tick_ms) {
            sound.notify(event);
        }

        let event = autopilot.update(now)?;
        let sample = autopilot.vehicle().telemetry();

        match event {
            Some(JourneyEvent::Arrived { distance }) => {
                served += 1;
                last_progress_ms = now;
                info!(station = served, distance, "arrived");
            }
            Some(JourneyEvent::StationMissed { distance }) => {
                warn!(distance, "station missed");
                sound.emergency_braking(sample.speed);
            }
            Some(JourneyEvent::Departed) if served >= stations => {
                info!("end of line, disengaging");
                disengage(&mut autopilot, &mut sound)?;
            }
            Some(JourneyEvent::ManualHandoff) => {
                warn!(status = autopilot.vehicle().status(), "handed back to manual");
            }
            Some(JourneyEvent::EmergencyHalt) => {
                warn!("halted with no station ahead");
                disengage(&mut autopilot, &mut sound)?;
            }
            Some(other) => debug!(?other, "journey event"),
            None => {}
        }

        sound.update(sample.speed, sample.acceleration);

        if !autopilot.is_active() && sample.speed <= 0.0 {
            break;
        }
        if now.saturating_sub(last_progress_ms) > STATION_TIMEOUT_MS {
            disengage(&mut autopilot, &mut sound)?;
            bail!("no station reached for {} s", STATION_TIMEOUT_MS / 1000);
        }
    }

    let now = autopilot.vehicle().now_ms();
    info!(
        served,
        elapsed_s = now / 1000,
        wall_ms = wall.now_ms(),
        position_m = autopilot.vehicle().position_m(),
        sound = sound.state().as_str(),
        "simulation finished"
    );
    if served < stations {
        bail!("served {served} of {stations} stations");
    }
    Ok(())
}
