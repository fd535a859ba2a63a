//! Audio playback abstraction.
//!
//! This module defines the [`AudioOutput`] trait for the playback primitive
//! behind the sound feedback controller (decoding, mixing, and the output
//! device are the implementor's business), and [`AudioEvent`], the
//! out-of-band notifications it sends back.

use crate::catalog::AudioAsset;

/// Audio playback trait.
///
/// The controller owns the *intended* state and drives the implementation
/// toward it with these four commands.
///
/// # Example
///
/// ```ignore
/// use rs_metro::catalog::AudioAsset;
/// use rs_metro::traits::AudioOutput;
///
/// struct WebAudio { /* ... */ }
///
/// impl AudioOutput for WebAudio {
///     type Error = PlaybackError;
///
///     fn play(&mut self, asset: AudioAsset) -> Result<(), PlaybackError> {
///         self.voices[asset.index()].start()
///     }
///     fn stop(&mut self, asset: AudioAsset) -> Result<(), PlaybackError> { /* ... */ }
///     fn seek(&mut self, asset: AudioAsset, position_s: f32) -> Result<(), PlaybackError> { /* ... */ }
///     fn set_rate(&mut self, asset: AudioAsset, rate: f32) -> Result<(), PlaybackError> { /* ... */ }
/// }
/// ```
pub trait AudioOutput {
    /// Error type for playback operations.
    type Error: core::fmt::Debug;

    /// Start (or resume) playback from the current position.
    fn play(&mut self, asset: AudioAsset) -> Result<(), Self::Error>;

    /// Stop playback, reset the position to 0 and the rate to 1.0.
    fn stop(&mut self, asset: AudioAsset) -> Result<(), Self::Error>;

    /// Move the playback position, in seconds from the start.
    fn seek(&mut self, asset: AudioAsset, position_s: f32) -> Result<(), Self::Error>;

    /// Set the playback rate (1.0 is normal speed).
    fn set_rate(&mut self, asset: AudioAsset, rate: f32) -> Result<(), Self::Error>;
}

/// Notification from the playback side.
///
/// Delivered with [`SoundFeedbackController::notify`] and applied on the
/// next tick, never synchronously.
///
/// [`SoundFeedbackController::notify`]: crate::sound::SoundFeedbackController::notify
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AudioEvent {
    /// A non-looping asset reached its end.
    Finished(AudioAsset),
}
