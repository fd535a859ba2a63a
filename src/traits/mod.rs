//! Trait definitions for the collaborators of the decision core.
//!
//! This module defines the abstractions that allow rs-metro to:
//! - Drive any vehicle simulation (or a mock) through one interface
//! - Play cues through any audio backend
//! - Run dwell timers against an injected clock
//!
//! # Submodules
//!
//! - `hardware`: Telemetry, vehicle commands, clock
//! - `audio`: Playback commands and playback events
//!
//! # Key Traits
//!
//! - [`Vehicle`]: Telemetry source and motion/door command sink
//! - [`AudioOutput`]: play/stop/seek/rate commands
//! - [`Clock`]: Time source for `no_std` environments

pub mod audio;
pub mod hardware;

pub use audio::*;
pub use hardware::*;
