//! Audio asset catalog.
//!
//! The cue set is closed: every sound the feedback controller can play is a
//! variant of [`AudioAsset`]. Durations and loop flags are resolved once into
//! an [`AssetCatalog`] indexed by the variant, so lookups during a tick are a
//! plain array access.
//!
//! # Example
//!
//! ```rust
//! use rs_metro::catalog::{AssetCatalog, AudioAsset};
//!
//! let catalog = AssetCatalog::default();
//! assert_eq!(catalog.duration(AudioAsset::Braking), 21.0);
//! assert!(catalog.is_looping(AudioAsset::MaxSpeed));
//!
//! let catalog = catalog.with_duration(AudioAsset::Engine, 20.0);
//! assert_eq!(catalog.duration(AudioAsset::Engine), 20.0);
//! ```

/// Number of assets in the catalog.
pub const ASSET_COUNT: usize = 12;

/// Every audio cue known to the feedback controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AudioAsset {
    /// Short cue played when the vehicle starts moving.
    StartChime,
    /// Traction run-up, seeked by speed.
    Engine,
    /// Braking run-down, seeked by remaining speed.
    Braking,
    /// Drone looped while at maximum speed.
    MaxSpeed,
    /// Short cue played when the vehicle comes to rest.
    StopChime,
    /// Ambient coasting loop used when no speed band applies.
    Inertia,
    /// Speed band drone, 7 to 26 km/h.
    Band15,
    /// Speed band drone, 26 to 32 km/h.
    Band30,
    /// Speed band drone, 32 to 35 km/h.
    Band35,
    /// Speed band drone, 35 to 41 km/h.
    Band40,
    /// Speed band drone, 41 to 61 km/h.
    Band50,
    /// Speed band drone, 61 to 80 km/h.
    Band60,
}

impl AudioAsset {
    /// All assets, in index order.
    pub const ALL: [AudioAsset; ASSET_COUNT] = [
        AudioAsset::StartChime,
        AudioAsset::Engine,
        AudioAsset::Braking,
        AudioAsset::MaxSpeed,
        AudioAsset::StopChime,
        AudioAsset::Inertia,
        AudioAsset::Band15,
        AudioAsset::Band30,
        AudioAsset::Band35,
        AudioAsset::Band40,
        AudioAsset::Band50,
        AudioAsset::Band60,
    ];

    /// Position of this asset in catalog tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase identifier, used in logs and snapshots.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AudioAsset::StartChime => "start_chime",
            AudioAsset::Engine => "engine",
            AudioAsset::Braking => "braking",
            AudioAsset::MaxSpeed => "max_speed",
            AudioAsset::StopChime => "stop_chime",
            AudioAsset::Inertia => "inertia",
            AudioAsset::Band15 => "band15",
            AudioAsset::Band30 => "band30",
            AudioAsset::Band35 => "band35",
            AudioAsset::Band40 => "band40",
            AudioAsset::Band50 => "band50",
            AudioAsset::Band60 => "band60",
        }
    }

    /// Ambient cues may overlap with one other cue.
    #[inline]
    pub const fn is_ambient(&self) -> bool {
        matches!(self, AudioAsset::Inertia)
    }
}

/// Static description of one asset.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetInfo {
    /// Which cue this entry describes.
    pub asset: AudioAsset,
    /// Total duration in seconds.
    pub duration_s: f32,
    /// Whether the collaborator should loop it.
    pub looping: bool,
}

impl AssetInfo {
    const fn new(asset: AudioAsset, duration_s: f32, looping: bool) -> Self {
        Self {
            asset,
            duration_s,
            looping,
        }
    }
}

/// Indexed table of [`AssetInfo`], one entry per [`AudioAsset`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetCatalog {
    entries: [AssetInfo; ASSET_COUNT],
}

impl Default for AssetCatalog {
    fn default() -> Self {
        use AudioAsset::*;
        Self {
            entries: [
                AssetInfo::new(StartChime, 1.0, false),
                AssetInfo::new(Engine, 18.15, false),
                AssetInfo::new(Braking, 21.0, false),
                AssetInfo::new(MaxSpeed, 5.0, true),
                AssetInfo::new(StopChime, 1.0, false),
                AssetInfo::new(Inertia, 6.0, true),
                AssetInfo::new(Band15, 4.0, true),
                AssetInfo::new(Band30, 4.0, true),
                AssetInfo::new(Band35, 4.0, true),
                AssetInfo::new(Band40, 4.0, true),
                AssetInfo::new(Band50, 4.0, true),
                AssetInfo::new(Band60, 4.0, true),
            ],
        }
    }
}

impl AssetCatalog {
    /// Look up an asset's entry.
    #[inline]
    pub fn info(&self, asset: AudioAsset) -> &AssetInfo {
        &self.entries[asset.index()]
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration(&self, asset: AudioAsset) -> f32 {
        self.info(asset).duration_s
    }

    /// Whether the asset loops.
    #[inline]
    pub fn is_looping(&self, asset: AudioAsset) -> bool {
        self.info(asset).looping
    }

    /// Override the duration of one asset (e.g. after decoding the real file).
    pub fn with_duration(mut self, asset: AudioAsset, duration_s: f32) -> Self {
        self.entries[asset.index()].duration_s = duration_s.max(0.0);
        self
    }

    /// Iterate over all entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetInfo> {
        self.entries.iter()
    }
}

/// Set of cues, stored as a bitmask over [`AudioAsset::index`].
///
/// The feedback controller keeps one of these as its intended playback
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CueSet(u16);

impl CueSet {
    /// Empty set.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add a cue.
    pub fn insert(&mut self, asset: AudioAsset) {
        self.0 |= 1 << asset.index();
    }

    /// Remove a cue, returning whether it was present.
    pub fn remove(&mut self, asset: AudioAsset) -> bool {
        let present = self.contains(asset);
        self.0 &= !(1 << asset.index());
        present
    }

    /// Membership test.
    #[inline]
    pub fn contains(&self, asset: AudioAsset) -> bool {
        self.0 & (1 << asset.index()) != 0
    }

    /// Number of cues in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when no cue is in the set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of non-ambient cues in the set.
    pub fn non_ambient_len(&self) -> usize {
        self.iter().filter(|a| !a.is_ambient()).count()
    }

    /// Iterate over members in index order.
    pub fn iter(&self) -> impl Iterator<Item = AudioAsset> + '_ {
        AudioAsset::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_table_order() {
        for (i, asset) in AudioAsset::ALL.iter().enumerate() {
            assert_eq!(asset.index(), i);
        }
        let catalog = AssetCatalog::default();
        for asset in AudioAsset::ALL {
            assert_eq!(catalog.info(asset).asset, asset);
        }
    }

    #[test]
    fn default_durations() {
        let catalog = AssetCatalog::default();
        assert_eq!(catalog.duration(AudioAsset::Engine), 18.15);
        assert_eq!(catalog.duration(AudioAsset::Braking), 21.0);
        assert_eq!(catalog.duration(AudioAsset::MaxSpeed), 5.0);
        assert_eq!(catalog.duration(AudioAsset::StartChime), 1.0);
    }

    #[test]
    fn loop_flags() {
        let catalog = AssetCatalog::default();
        assert!(catalog.is_looping(AudioAsset::MaxSpeed));
        assert!(catalog.is_looping(AudioAsset::Inertia));
        assert!(catalog.is_looping(AudioAsset::Band40));
        assert!(!catalog.is_looping(AudioAsset::Engine));
        assert!(!catalog.is_looping(AudioAsset::Braking));
        assert!(!catalog.is_looping(AudioAsset::StartChime));
        assert!(!catalog.is_looping(AudioAsset::StopChime));
    }

    #[test]
    fn with_duration_rejects_negative() {
        let catalog = AssetCatalog::default().with_duration(AudioAsset::Engine, -1.0);
        assert_eq!(catalog.duration(AudioAsset::Engine), 0.0);
    }

    #[test]
    fn only_inertia_is_ambient() {
        let ambient: heapless::Vec<AudioAsset, ASSET_COUNT> =
            AudioAsset::ALL.into_iter().filter(|a| a.is_ambient()).collect();
        assert_eq!(ambient.as_slice(), &[AudioAsset::Inertia]);
    }

    #[test]
    fn cue_set_operations() {
        let mut set = CueSet::new();
        assert!(set.is_empty());

        set.insert(AudioAsset::Engine);
        set.insert(AudioAsset::Inertia);
        set.insert(AudioAsset::Engine);
        assert_eq!(set.len(), 2);
        assert_eq!(set.non_ambient_len(), 1);
        assert!(set.contains(AudioAsset::Engine));

        assert!(set.remove(AudioAsset::Engine));
        assert!(!set.remove(AudioAsset::Engine));
        assert_eq!(set.len(), 1);

        let members: heapless::Vec<AudioAsset, ASSET_COUNT> = set.iter().collect();
        assert_eq!(members.as_slice(), &[AudioAsset::Inertia]);
    }

    #[test]
    fn asset_identifiers_are_unique() {
        for a in AudioAsset::ALL {
            for b in AudioAsset::ALL {
                if a != b {
                    assert_ne!(a.as_str(), b.as_str());
                }
            }
        }
    }
}
