#![doc = include_str!("../README.md")]
// When we return an error type, the possible errors are encoded within it.
#![allow(clippy::missing_errors_doc)]

mod calibration;
pub mod clock;
mod engine;
pub mod fast_mode;
pub mod hal;
pub mod noise;
mod output_timer;
pub mod phase_accumulator;
mod result;
mod rng;
mod shape;
mod snapshot;
mod sweep;
pub mod sync_square;
mod target;
pub mod unsynced_square;
pub mod wave_table;
mod waypoint;

pub use {
    calibration::{Calibration, SyncDelayCal},
    clock::{Tier, TierSelector},
    engine::{Engine, Mode, SquarePin, Status},
    noise::{NoiseFilter, NoiseSynth},
    output_timer::TimerPeriod,
    result::{
        SweepError, SweepResult, TimerError, TimerResult, UploadError, UploadResult,
    },
    rng::Rng,
    shape::{
        ArbParams, CompositeParams, NoiseParams, ShapeParam, ShapeParams, SineParams,
        TriangleParams, WaveShape,
    },
    snapshot::Snapshot,
    sweep::{Sweep, SweepConfig},
    sync_square::SyncSquare,
    target::{Control, DutyCycle, Frequency, Target},
    unsynced_square::{SquareDrive, UnsyncedSquare},
    waypoint::{MAX_WAYPOINTS, RandomStyle, Waypoint, WaypointUpload, Waypoints},
};

#[cfg(target_endian = "big")]
const _: () = panic!("Only little endian architectures are supported currently.");
