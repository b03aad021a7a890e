//! Game Layout Table
//!
//! AUDIOT stores four consecutive sections: PC sounds, Adlib sounds,
//! digitized sound placeholders and music. Their starting chunk indices differ
//! per game release and are not recorded in the files themselves, so the
//! extractor needs an explicit version tag.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, WolfSoundsError};

/// Starting chunk indices of the AUDIOT sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundLayout {
    /// First PC speaker sound
    pub pc_sounds: u16,
    /// First Adlib sound effect
    pub adlib_sounds: u16,
    /// First digitized sound slot
    pub digi_sounds: u16,
    /// First music chunk
    pub music: u16,
}

impl SoundLayout {
    /// Check section order against an index of `chunk_count` chunks
    pub fn validate(&self, chunk_count: usize) -> Result<()> {
        let starts = [self.pc_sounds, self.adlib_sounds, self.digi_sounds, self.music];
        if starts.windows(2).any(|w| w[0] > w[1]) {
            return Err(WolfSoundsError::UnsupportedLayout(format!(
                "sections out of order: {:?}",
                starts
            )));
        }
        if self.music as usize > chunk_count {
            return Err(WolfSoundsError::UnsupportedLayout(format!(
                "music starts at chunk {} but the index holds {} chunks",
                self.music, chunk_count
            )));
        }
        Ok(())
    }

    /// PC speaker sound chunk range
    pub fn pc_sound_range(&self) -> Range<usize> {
        self.pc_sounds as usize..self.adlib_sounds as usize
    }

    /// Adlib sound effect chunk range
    pub fn adlib_sound_range(&self) -> Range<usize> {
        self.adlib_sounds as usize..self.digi_sounds as usize
    }

    /// Digitized sound slot range
    pub fn digi_sound_range(&self) -> Range<usize> {
        self.digi_sounds as usize..self.music as usize
    }

    /// Music chunk range for an index of `chunk_count` chunks
    pub fn music_range(&self, chunk_count: usize) -> Range<usize> {
        self.music as usize..chunk_count
    }
}

/// Built-in game releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameVersion {
    /// Wolfenstein 3D shareware
    Wl1,
    /// Wolfenstein 3D registered
    Wl6,
    /// Spear of Destiny
    Sod,
}

impl GameVersion {
    /// All built-in versions
    pub const ALL: [GameVersion; 3] = [GameVersion::Wl1, GameVersion::Wl6, GameVersion::Sod];

    /// File extension / tag for this version
    pub fn tag(&self) -> &'static str {
        match self {
            GameVersion::Wl1 => "WL1",
            GameVersion::Wl6 => "WL6",
            GameVersion::Sod => "SOD",
        }
    }

    /// Section layout of this version's AUDIOT
    pub fn layout(&self) -> SoundLayout {
        match self {
            GameVersion::Wl1 => SoundLayout {
                pc_sounds: 0,
                adlib_sounds: 69,
                digi_sounds: 138,
                music: 207,
            },
            GameVersion::Wl6 => SoundLayout {
                pc_sounds: 0,
                adlib_sounds: 87,
                digi_sounds: 174,
                music: 261,
            },
            GameVersion::Sod => SoundLayout {
                pc_sounds: 0,
                adlib_sounds: 81,
                digi_sounds: 162,
                music: 243,
            },
        }
    }

    /// Detect the version from a data file extension (`AUDIOHED.WL6`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            WolfSoundsError::UnsupportedLayout(format!(
                "{} has no game version extension",
                path.display()
            ))
        })?;
        ext.parse()
    }
}

impl FromStr for GameVersion {
    type Err = WolfSoundsError;

    fn from_str(s: &str) -> Result<Self> {
        GameVersion::ALL
            .into_iter()
            .find(|v| v.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                WolfSoundsError::UnsupportedLayout(format!("unknown game version '{}'", s))
            })
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tag to layout mapping: the built-in versions plus user overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTable {
    layouts: BTreeMap<String, SoundLayout>,
}

impl LayoutTable {
    /// Table holding only the built-in versions
    pub fn builtin() -> Self {
        let layouts = GameVersion::ALL
            .iter()
            .map(|v| (v.tag().to_string(), v.layout()))
            .collect();
        LayoutTable { layouts }
    }

    /// Add or replace layouts from a JSON object keyed by tag
    ///
    /// ```
    /// use wolfsounds::LayoutTable;
    /// let mut table = LayoutTable::builtin();
    /// let json = r#"{"n3d": {"pc_sounds": 0, "adlib_sounds": 0, "digi_sounds": 0, "music": 0}}"#;
    /// table.merge_json(json).unwrap();
    /// assert!(table.get("N3D").is_ok());
    /// ```
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let extra: BTreeMap<String, SoundLayout> = serde_json::from_str(json)
            .map_err(|e| WolfSoundsError::ConfigError(format!("layout file: {}", e)))?;
        for (tag, layout) in extra {
            self.layouts.insert(tag.to_ascii_uppercase(), layout);
        }
        Ok(())
    }

    /// Look up a layout by tag (case-insensitive)
    pub fn get(&self, tag: &str) -> Result<SoundLayout> {
        self.layouts
            .get(&tag.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| {
                WolfSoundsError::UnsupportedLayout(format!("unknown game version '{}'", tag))
            })
    }

    /// Look up a layout by a data file's extension
    pub fn for_path<P: AsRef<Path>>(&self, path: P) -> Result<SoundLayout> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            WolfSoundsError::UnsupportedLayout(format!(
                "{} has no game version extension",
                path.display()
            ))
        })?;
        self.get(ext)
    }

    /// Known tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layouts() {
        assert_eq!(GameVersion::Wl6.layout().music, 261);
        assert_eq!(GameVersion::Wl1.layout().adlib_sounds, 69);
        assert_eq!(GameVersion::Sod.layout().digi_sounds, 162);
    }

    #[test]
    fn test_version_from_tag_and_path() {
        assert_eq!("wl6".parse::<GameVersion>().unwrap(), GameVersion::Wl6);
        assert_eq!(
            GameVersion::from_path("data/AUDIOHED.SOD").unwrap(),
            GameVersion::Sod
        );
        assert!(matches!(
            "SDM".parse::<GameVersion>(),
            Err(WolfSoundsError::UnsupportedLayout(_))
        ));
        assert!(GameVersion::from_path("AUDIOHED").is_err());
    }

    #[test]
    fn test_ranges() {
        let layout = GameVersion::Wl6.layout();
        assert_eq!(layout.pc_sound_range(), 0..87);
        assert_eq!(layout.adlib_sound_range(), 87..174);
        assert_eq!(layout.digi_sound_range(), 174..261);
        assert_eq!(layout.music_range(288), 261..288);
    }

    #[test]
    fn test_validate() {
        let layout = GameVersion::Wl6.layout();
        assert!(layout.validate(288).is_ok());
        assert!(layout.validate(100).is_err());

        let shuffled = SoundLayout {
            pc_sounds: 10,
            adlib_sounds: 5,
            digi_sounds: 20,
            music: 30,
        };
        assert!(shuffled.validate(40).is_err());
    }

    #[test]
    fn test_json_overrides() {
        let mut table = LayoutTable::builtin();
        table
            .merge_json(
                r#"{"wl6": {"pc_sounds": 0, "adlib_sounds": 1, "digi_sounds": 2, "music": 3},
                    "demo": {"pc_sounds": 0, "adlib_sounds": 0, "digi_sounds": 0, "music": 1}}"#,
            )
            .unwrap();

        assert_eq!(table.get("WL6").unwrap().music, 3);
        assert_eq!(table.get("Demo").unwrap().music, 1);
        assert_eq!(table.for_path("AUDIOHED.wl1").unwrap(), GameVersion::Wl1.layout());
        assert_eq!(table.tags().count(), 4);
    }

    #[test]
    fn test_bad_json() {
        let mut table = LayoutTable::builtin();
        assert!(matches!(
            table.merge_json("{\"x\": 1}"),
            Err(WolfSoundsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            LayoutTable::builtin().get("N3D"),
            Err(WolfSoundsError::UnsupportedLayout(_))
        ));
    }
}
