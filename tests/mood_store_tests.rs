// Integration tests for the mood catalog and store

use vibecatch::{Mood, MoodStore, RecognizedTrack};

fn track(title: &str, artist: &str) -> RecognizedTrack {
    RecognizedTrack {
        title: title.to_string(),
        artist: artist.to_string(),
        external_key: format!("{}-{}", title, artist),
    }
}

#[test]
fn test_tracks_keep_insertion_order() {
    let mut store = MoodStore::new();
    let a = track("A", "One");
    let b = track("B", "Two");

    store.add(Mood::Chill, a.clone());
    store.add(Mood::Chill, b.clone());

    let listing: Vec<(Mood, Vec<RecognizedTrack>)> = store
        .list()
        .map(|(mood, tracks)| (mood, tracks.to_vec()))
        .collect();

    assert_eq!(listing, vec![(Mood::Chill, vec![a, b])]);
}

#[test]
fn test_listing_follows_canonical_mood_order() {
    let mut store = MoodStore::new();
    store.add(Mood::Feelgood, track("F", "1"));
    store.add(Mood::Hyped, track("H", "1"));
    store.add(Mood::Focus, track("Fo", "1"));

    let moods: Vec<Mood> = store.list().map(|(mood, _)| mood).collect();
    assert_eq!(moods, vec![Mood::Hyped, Mood::Focus, Mood::Feelgood]);
}

#[test]
fn test_listing_is_restartable() {
    let mut store = MoodStore::new();
    store.add(Mood::Romantic, track("R", "1"));
    store.add(Mood::Chill, track("C", "1"));

    let listing = store.list();
    let first: Vec<Mood> = listing.clone().map(|(mood, _)| mood).collect();
    let second: Vec<Mood> = listing.map(|(mood, _)| mood).collect();

    assert_eq!(first, second);
    assert_eq!(store.list().count(), 2);
}

#[test]
fn test_catalog_covers_every_mood() {
    let ids: Vec<&str> = Mood::ALL.iter().map(Mood::id).collect();
    assert_eq!(ids, vec!["hyped", "chill", "romantic", "focus", "feelgood"]);

    for mood in Mood::ALL {
        assert_eq!(mood.id().parse::<Mood>(), Ok(mood));
        assert!(mood.color().starts_with('#') && mood.color().len() == 7);
    }

    assert_eq!(Mood::Feelgood.display_name(), "Feel-Good Tunes");
    assert_eq!(Mood::Hyped.color(), "#FF4B4B");
}
