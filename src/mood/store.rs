use std::collections::BTreeMap;

use super::catalog::Mood;
use crate::recognition::RecognizedTrack;

/// Recognized tracks filed by mood
///
/// Append-only, insertion order kept per mood, duplicates allowed. Lives for
/// the process only.
#[derive(Debug, Clone, Default)]
pub struct MoodStore {
    collections: BTreeMap<Mood, Vec<RecognizedTrack>>,
}

impl MoodStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mood: Mood, track: RecognizedTrack) {
        self.collections.entry(mood).or_default().push(track);
    }

    /// Every mood holding at least one track, in canonical mood order
    ///
    /// The iterator can be cloned to walk the listing again.
    pub fn list(&self) -> impl Iterator<Item = (Mood, &[RecognizedTrack])> + Clone + '_ {
        self.collections
            .iter()
            .filter(|(_, tracks)| !tracks.is_empty())
            .map(|(mood, tracks)| (*mood, tracks.as_slice()))
    }

    pub fn tracks(&self, mood: Mood) -> &[RecognizedTrack] {
        self.collections
            .get(&mood)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Shareable text listing of one mood's tracks, `None` when it has none
    ///
    /// ```text
    /// Chill Vibes Playlist:
    /// Title - Artist
    /// ```
    pub fn export(&self, mood: Mood) -> Option<String> {
        let tracks = self.tracks(mood);
        if tracks.is_empty() {
            return None;
        }

        let mut text = format!("{} Playlist:", mood.display_name());
        for track in tracks {
            text.push('\n');
            text.push_str(&track.to_string());
        }
        Some(text)
    }

    /// Total number of filed tracks
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
