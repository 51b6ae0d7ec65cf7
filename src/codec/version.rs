use serde::Serialize;

/// Map format generation, read from the first u32 of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u32)]
pub enum FormatVersion {
    /// Restoration of Erathia
    RoE = 0x0E,
    /// Armageddon's Blade
    AB = 0x15,
    /// Shadow of Death
    SoD = 0x1C,
    /// Horn of the Abyss
    HotA = 0x20,
    /// In the Wake of Gods
    WoG = 0x33,
}

impl FormatVersion {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0E => Some(Self::RoE),
            0x15 => Some(Self::AB),
            0x1C => Some(Self::SoD),
            0x20 => Some(Self::HotA),
            0x33 => Some(Self::WoG),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn at_least(self, threshold: FormatVersion) -> bool {
        self >= threshold
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RoE => "Restoration of Erathia",
            Self::AB => "Armageddon's Blade",
            Self::SoD => "Shadow of Death",
            Self::HotA => "Horn of the Abyss",
            Self::WoG => "In the Wake of Gods",
        }
    }

    pub const ALL: [FormatVersion; 5] = [Self::RoE, Self::AB, Self::SoD, Self::HotA, Self::WoG];
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value that changes at version thresholds. Entries are ordered oldest
/// first; the last entry whose threshold is reached wins.
pub struct Gated<T: Copy + 'static>(pub &'static [(FormatVersion, T)]);

impl<T: Copy + 'static> Gated<T> {
    pub fn at(&self, version: FormatVersion) -> T {
        let mut value = self.0[0].1;
        for &(threshold, v) in self.0 {
            if version >= threshold {
                value = v;
            }
        }
        value
    }
}

use FormatVersion::{HotA, SoD, AB, RoE};

/// Padding after the two flags of a player slot nobody can play.
pub const STUB_PLAYER_PADDING: Gated<usize> = Gated(&[(RoE, 6), (AB, 12), (SoD, 13)]);
/// Fixed-size allowed-heroes bitmask (HotA prefixes its own count instead).
pub const HERO_BITMASK_LEN: Gated<usize> = Gated(&[(RoE, 16), (AB, 20)]);
pub const HERO_COUNT: Gated<usize> = Gated(&[(RoE, 128), (AB, 156)]);
/// Fixed-size allowed-artifacts bitmask; absent in RoE.
pub const ARTIFACT_BITMASK_LEN: Gated<usize> = Gated(&[(RoE, 0), (AB, 17), (SoD, 18)]);
pub const ARTIFACT_ID_WIDTH: Gated<usize> = Gated(&[(RoE, 1), (AB, 2)]);
pub const CREATURE_ID_WIDTH: Gated<usize> = Gated(&[(RoE, 1), (AB, 2)]);
pub const HERO_ARTIFACT_SLOTS: Gated<usize> = Gated(&[(RoE, 18), (SoD, 19)]);

pub const SPELL_BITMASK_LEN: usize = 9;
pub const SKILL_BITMASK_LEN: usize = 4;
pub const BUILDING_BITMASK_LEN: usize = 6;
pub const MAP_OPTIONS_RESERVED: usize = 31;

/// Every version-dependent switch the decoder consults, resolved once per map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub version: FormatVersion,
    pub ab: bool,
    pub sod: bool,
    pub hota: bool,
    pub stub_player_padding: usize,
    pub hero_bitmask_len: usize,
    pub hero_count: usize,
    pub artifact_bitmask_len: usize,
    pub artifact_id_width: usize,
    pub creature_id_width: usize,
    pub artifact_slots: usize,
}

impl Features {
    pub fn for_version(version: FormatVersion) -> Self {
        Self {
            version,
            ab: version.at_least(AB),
            sod: version.at_least(SoD),
            hota: version.at_least(HotA),
            stub_player_padding: STUB_PLAYER_PADDING.at(version),
            hero_bitmask_len: HERO_BITMASK_LEN.at(version),
            hero_count: HERO_COUNT.at(version),
            artifact_bitmask_len: ARTIFACT_BITMASK_LEN.at(version),
            artifact_id_width: ARTIFACT_ID_WIDTH.at(version),
            creature_id_width: CREATURE_ID_WIDTH.at(version),
            artifact_slots: HERO_ARTIFACT_SLOTS.at(version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip_and_order() {
        for v in FormatVersion::ALL {
            assert_eq!(FormatVersion::from_code(v.code()), Some(v));
        }
        assert!(FormatVersion::RoE < FormatVersion::AB);
        assert!(FormatVersion::HotA < FormatVersion::WoG);
        assert_eq!(FormatVersion::from_code(0x1D), None);
    }

    #[test]
    fn test_gated_picks_latest_reached_threshold() {
        assert_eq!(STUB_PLAYER_PADDING.at(FormatVersion::RoE), 6);
        assert_eq!(STUB_PLAYER_PADDING.at(FormatVersion::AB), 12);
        assert_eq!(STUB_PLAYER_PADDING.at(FormatVersion::WoG), 13);
        assert_eq!(ARTIFACT_BITMASK_LEN.at(FormatVersion::RoE), 0);
    }

    #[test]
    fn test_features() {
        let roe = Features::for_version(FormatVersion::RoE);
        assert!(!roe.ab && !roe.sod && !roe.hota);
        assert_eq!(roe.creature_id_width, 1);
        assert_eq!(roe.hero_count, 128);

        let sod = Features::for_version(FormatVersion::SoD);
        assert!(sod.ab && sod.sod && !sod.hota);
        assert_eq!(sod.artifact_slots, 19);

        let wog = Features::for_version(FormatVersion::WoG);
        assert!(wog.hota);
    }
}
