use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed set of moods a recognized track can be filed under
///
/// Declaration order is the canonical listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Hyped,
    Chill,
    Romantic,
    Focus,
    Feelgood,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown mood '{0}' (expected one of: hyped, chill, romantic, focus, feelgood)")]
pub struct UnknownMood(pub String);

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Hyped,
        Mood::Chill,
        Mood::Romantic,
        Mood::Focus,
        Mood::Feelgood,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Hyped => "hyped",
            Self::Chill => "chill",
            Self::Romantic => "romantic",
            Self::Focus => "focus",
            Self::Feelgood => "feelgood",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Hyped => "Get Hyped",
            Self::Chill => "Chill Vibes",
            Self::Romantic => "Romantic Feels",
            Self::Focus => "Focus Mode",
            Self::Feelgood => "Feel-Good Tunes",
        }
    }

    /// Accent color as `#RRGGBB`
    pub fn color(&self) -> &'static str {
        match self {
            Self::Hyped => "#FF4B4B",
            Self::Chill => "#4BCDFF",
            Self::Romantic => "#FF4BA6",
            Self::Focus => "#8B4BFF",
            Self::Feelgood => "#4BFF91",
        }
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mood| mood.id() == id)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert_eq!("chill".parse::<Mood>(), Ok(Mood::Chill));
        assert_eq!(" FeelGood ".parse::<Mood>(), Ok(Mood::Feelgood));
        assert_eq!(
            "sad".parse::<Mood>(),
            Err(UnknownMood("sad".to_string()))
        );
    }

    #[test]
    fn test_canonical_order() {
        let mut moods = vec![Mood::Feelgood, Mood::Chill, Mood::Focus, Mood::Hyped, Mood::Romantic];
        moods.sort();
        assert_eq!(moods, Mood::ALL);
    }

    #[test]
    fn test_catalog_entry() {
        assert_eq!(Mood::Romantic.display_name(), "Romantic Feels");
        assert_eq!(Mood::Romantic.color(), "#FF4BA6");
        assert_eq!(serde_json::to_string(&Mood::Focus).unwrap(), "\"focus\"");
    }
}
