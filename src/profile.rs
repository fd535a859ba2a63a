//! Speed profile and stopping law for automatic operation.
//!
//! Three pieces of pure arithmetic drive the motion controller:
//!
//! - [`BrakingLaw`]: the distance at which maximum braking must begin
//! - [`SpeedProfile`]: the target speed for a given distance to the station
//! - [`StopWindow`]: which stopping positions count as "at the platform"
//!
//! The braking law is an empirical constant, not a physics model: at the base
//! speed the vehicle needs exactly the base distance, and the distance scales
//! with the square of the speed.
//!
//! ```rust
//! use rs_metro::profile::BrakingLaw;
//!
//! let law = BrakingLaw::default();
//! assert_eq!(law.braking_distance(80.0), 250.0);
//! assert_eq!(law.braking_distance(40.0), 62.5);
//! assert_eq!(law.braking_distance(0.0), 0.0);
//! ```

/// Quadratic stopping-distance law.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrakingLaw {
    /// Distance needed to stop from `base_speed` at maximum deceleration (m).
    pub base_distance_m: f32,
    /// Reference speed (km/h).
    pub base_speed: f32,
}

impl Default for BrakingLaw {
    fn default() -> Self {
        Self {
            base_distance_m: 250.0,
            base_speed: 80.0,
        }
    }
}

impl BrakingLaw {
    /// Distance in meters needed to stop from `speed` at maximum deceleration.
    ///
    /// Never negative; zero at or below standstill.
    pub fn braking_distance(&self, speed: f32) -> f32 {
        if speed <= 0.0 {
            return 0.0;
        }
        let ratio = speed / self.base_speed;
        (self.base_distance_m * ratio * ratio).max(0.0)
    }

    /// True when `distance` is already inside the braking envelope for `speed`.
    #[inline]
    pub fn must_brake(&self, distance: f32, speed: f32) -> bool {
        distance <= self.braking_distance(speed)
    }
}

/// One step of the speed profile: beyond `beyond_m` meters, aim for `speed`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedStep {
    /// Step applies when the distance is strictly greater than this (m).
    pub beyond_m: f32,
    /// Target speed for the step (km/h).
    pub speed: f32,
}

/// Target speed by distance to the next station.
///
/// | distance > (m) | target (km/h) |
/// |---|---|
/// | 350 | 80 |
/// | 250 | 70 |
/// | 180 | 60 |
/// | 120 | 45 |
/// | otherwise | 35 |
/// | no station ahead | 80 |
///
/// ```rust
/// use rs_metro::profile::SpeedProfile;
///
/// let profile = SpeedProfile::default();
/// assert_eq!(profile.target_speed(Some(400.0)), 80.0);
/// assert_eq!(profile.target_speed(Some(250.0)), 60.0);
/// assert_eq!(profile.target_speed(Some(10.0)), 35.0);
/// assert_eq!(profile.target_speed(None), 80.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedProfile {
    /// Steps, ordered by strictly decreasing `beyond_m`.
    pub steps: [SpeedStep; 4],
    /// Target when no step matches (km/h).
    pub approach_speed: f32,
    /// Target when no station is detected ahead (km/h).
    pub open_line_speed: f32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            steps: [
                SpeedStep {
                    beyond_m: 350.0,
                    speed: 80.0,
                },
                SpeedStep {
                    beyond_m: 250.0,
                    speed: 70.0,
                },
                SpeedStep {
                    beyond_m: 180.0,
                    speed: 60.0,
                },
                SpeedStep {
                    beyond_m: 120.0,
                    speed: 45.0,
                },
            ],
            approach_speed: 35.0,
            open_line_speed: 80.0,
        }
    }
}

impl SpeedProfile {
    /// Target speed for the given distance to the station.
    pub fn target_speed(&self, distance: Option<f32>) -> f32 {
        let Some(distance) = distance else {
            return self.open_line_speed;
        };
        self.steps
            .iter()
            .find(|step| distance > step.beyond_m)
            .map_or(self.approach_speed, |step| step.speed)
    }

    /// Steps are strictly decreasing in distance.
    pub fn is_ordered(&self) -> bool {
        self.steps.windows(2).all(|w| w[0].beyond_m > w[1].beyond_m)
    }
}

/// Acceptance window around the platform stopping mark.
///
/// Distances are measured to the mark; negative means the vehicle overran
/// it. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StopWindow {
    /// Ideal remaining distance when stopped (m).
    pub perfect_stop_m: f32,
    /// How far past the ideal point is still accepted (m).
    pub tolerance_before_m: f32,
    /// How far short of the ideal point is still accepted (m).
    pub tolerance_after_m: f32,
}

impl Default for StopWindow {
    fn default() -> Self {
        Self {
            perfect_stop_m: 0.5,
            tolerance_before_m: 2.0,
            tolerance_after_m: 2.0,
        }
    }
}

impl StopWindow {
    /// Lowest accepted distance.
    #[inline]
    pub fn min_acceptable(&self) -> f32 {
        self.perfect_stop_m - self.tolerance_before_m
    }

    /// Highest accepted distance.
    #[inline]
    pub fn max_acceptable(&self) -> f32 {
        self.perfect_stop_m + self.tolerance_after_m
    }

    /// Whether a vehicle stopped at `distance` is at the platform.
    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.min_acceptable() && distance <= self.max_acceptable()
    }
}
