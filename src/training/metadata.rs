use super::ordering::RankedSong;

/// Outcome of a selection, reported to the user after every run
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSummary {
    pub available_songs: usize,
    pub selected_songs: usize,
    /// Requested duration in seconds
    pub planned_duration: f64,
    /// Sum of the selected song durations in seconds
    pub total_duration: f64,
}

impl SelectionSummary {
    pub fn new(available_songs: usize, selected: &[RankedSong], planned_duration: f64) -> Self {
        Self {
            available_songs,
            selected_songs: selected.len(),
            planned_duration,
            total_duration: total_duration(selected),
        }
    }

    /// Positive when the selection runs longer than planned
    pub fn difference(&self) -> f64 {
        self.total_duration - self.planned_duration
    }

    pub fn reached_target(&self) -> bool {
        self.total_duration >= self.planned_duration
    }
}

/// Total duration of `songs` in seconds, ignoring songs without a length
pub fn total_duration(songs: &[RankedSong]) -> f64 {
    songs.iter().filter_map(|ranked| ranked.song.length()).sum()
}

/// Format seconds as `H:MM:SS`
pub fn human_readable_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (minutes, secs) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{hours}:{minutes:02}:{secs:02}")
}
