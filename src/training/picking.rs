//! Picking strategies: choose a duplicate-free subset of an ordered pool
//! whose total duration approaches a target.

use super::error::SelectionError;
use super::ordering::RankedSong;
use super::stats::{FieldStats, play_count_levels};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Initial selection stops once the remaining gap is within this many seconds
pub const MAX_ALLOWED_TIME_DIFFERENCE: f64 = 120.0;
/// Acceptable overshoot of the target for the improvement pass (seconds)
pub const MAX_OVERTIME: f64 = 10.0;
/// Round-robin visits allowed for the initial selection
pub const MAX_INITIAL_ROUNDS: usize = 100;
/// Improvement attempts allowed per bin
pub const IMPROVEMENT_ROUNDS_PER_BIN: usize = 3;

/// A song that has been picked, identified by its position in the ordered pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEntry {
    pub index: usize,
    pub bin: Option<usize>,
    pub duration: f64,
    pub play_count: u32,
}

impl SelectionEntry {
    fn new(pool: &[RankedSong], index: usize, bin: Option<usize>) -> Self {
        let song = &pool[index].song;
        Self {
            index,
            bin,
            duration: song.length().unwrap_or(0.0),
            play_count: song.play_count_or_zero(),
        }
    }
}

/// Registered picking strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PickStrategy {
    #[default]
    Top,
    RandomFromBins,
}

impl PickStrategy {
    pub const ALL: [PickStrategy; 2] = [PickStrategy::Top, PickStrategy::RandomFromBins];

    pub fn name(self) -> &'static str {
        match self {
            PickStrategy::Top => "top",
            PickStrategy::RandomFromBins => "random_from_bins",
        }
    }

    /// Resolve a configured name. Unset names give the default, unknown
    /// names are logged and also give the default.
    pub fn resolve(name: Option<&str>) -> Self {
        match name.map(str::parse::<PickStrategy>) {
            None => Self::default(),
            Some(Ok(strategy)) => strategy,
            Some(Err(e)) => {
                warn!("{e}; using '{}'", Self::default());
                Self::default()
            }
        }
    }

    /// Pick entries from `ordered` for `target` seconds
    pub fn select<R: Rng + ?Sized>(
        self,
        ordered: &[RankedSong],
        target: f64,
        favour_unplayed: bool,
        rng: &mut R,
    ) -> Result<Vec<SelectionEntry>, SelectionError> {
        info!(
            "PICKER strategy: {self} ('favour_unplayed': {})",
            if favour_unplayed { "yes" } else { "no" }
        );
        match self {
            PickStrategy::Top => Ok(top_selection(ordered, target)),
            PickStrategy::RandomFromBins => {
                RandomFromBinsPicker::new(ordered, target, favour_unplayed)?.make_selection(rng)
            }
        }
    }
}

impl fmt::Display for PickStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PickStrategy {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s.trim())
            .ok_or_else(|| SelectionError::UnknownStrategy {
                kind: "picking",
                name: s.to_string(),
            })
    }
}

/// Walk from the best scored song backwards until the target is reached
fn top_selection(ordered: &[RankedSong], target: f64) -> Vec<SelectionEntry> {
    let mut selection = Vec::new();
    let mut total = 0.0;

    for index in (0..ordered.len()).rev() {
        if total >= target {
            break;
        }
        let entry = SelectionEntry::new(ordered, index, None);
        total += entry.duration;
        selection.push(entry);
    }

    selection
}

/// Split `pool_size` items into the bins used by the random picker.
///
/// Returns half-open ranges that cover `0..pool_size` without gaps.
/// Halves round to even, so `2.5` gives 2 bins.
pub fn bin_boundaries(pool_size: usize, target: f64, avg: f64) -> Vec<Range<usize>> {
    let num_bins = (target / avg).round_ties_even().max(0.0) as usize;
    let bin_size = if num_bins == 0 {
        0
    } else {
        (pool_size as f64 / num_bins as f64).round_ties_even() as usize
    };

    debug!("Number of bins: {num_bins}");
    debug!("Bin size: {bin_size}");

    if bin_size == 0 || bin_size * num_bins > pool_size {
        return vec![0..pool_size];
    }

    (0..num_bins)
        .map(|bin| {
            let low = bin * bin_size;
            let high = if bin == num_bins - 1 {
                pool_size
            } else {
                low + bin_size
            };
            low..high
        })
        .collect()
}

/// Random picking spread over contiguous bins of the ordered pool
struct RandomFromBinsPicker<'a> {
    items: &'a [RankedSong],
    target: f64,
    favour_unplayed: bool,
    bins: Vec<Range<usize>>,
    selection: Vec<SelectionEntry>,
    /// Bin visits made by the initial selection
    initial_rounds: usize,
    /// Attempts made by the improvement pass
    improvement_rounds: usize,
    /// Replacement candidates drawn by the improvement pass, in order
    proposed: Vec<usize>,
}

impl<'a> RandomFromBinsPicker<'a> {
    fn new(
        items: &'a [RankedSong],
        target: f64,
        favour_unplayed: bool,
    ) -> Result<Self, SelectionError> {
        if items.len() <= 1 {
            return Err(SelectionError::InvalidPool(
                "There is only one song in the selection!".to_string(),
            ));
        }

        let avg = FieldStats::collect(items.iter().map(|item| item.song.length()))
            .map(|stats| stats.avg())
            .unwrap_or(0.0);
        if avg <= 0.0 {
            return Err(SelectionError::InvalidPool(
                "Average song length is zero!".to_string(),
            ));
        }

        let bins = bin_boundaries(items.len(), target, avg);
        debug!("Bin boundaries: {bins:?}");

        Ok(Self {
            items,
            target,
            favour_unplayed,
            bins,
            selection: Vec::new(),
            initial_rounds: 0,
            improvement_rounds: 0,
            proposed: Vec::new(),
        })
    }

    fn make_selection<R: Rng + ?Sized>(
        mut self,
        rng: &mut R,
    ) -> Result<Vec<SelectionEntry>, SelectionError> {
        self.make_initial_selection(rng);
        self.improve_selection(rng);
        Ok(self.selection)
    }

    fn selected_time(&self) -> f64 {
        self.selection.iter().map(|entry| entry.duration).sum()
    }

    fn is_selected(&self, index: usize) -> bool {
        self.selection.iter().any(|entry| entry.index == index)
    }

    fn make_initial_selection<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut sel_time = 0.0;
        let mut curr_bin = 0;
        self.initial_rounds = 0;

        while self.target - sel_time > MAX_ALLOWED_TIME_DIFFERENCE {
            if self.initial_rounds == MAX_INITIAL_ROUNDS {
                warn!("Initial selection: MAX HIT after {MAX_INITIAL_ROUNDS} rounds");
                break;
            }
            self.initial_rounds += 1;

            let available: Vec<usize> = self.bins[curr_bin]
                .clone()
                .filter(|&index| !self.is_selected(index))
                .collect();

            let Some(index) = self.draw_candidate(&available, rng) else {
                // Nothing left in this bin
                curr_bin = (curr_bin + 1) % self.bins.len();
                continue;
            };

            let entry = SelectionEntry::new(self.items, index, Some(curr_bin));
            let time_diff = (sel_time - self.target).abs();
            let new_diff = (sel_time + entry.duration - self.target).abs();

            if new_diff < time_diff {
                self.selection.push(entry);
                sel_time += entry.duration;
                curr_bin = (curr_bin + 1) % self.bins.len();
            }
        }

        info!("INITIAL SELECTION: FINISHED");
        self.log_selection_status();
    }

    fn improve_selection<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.selection.is_empty() {
            info!("IMPROVEMENTS: SKIPPED (No initial selection)");
            return;
        }

        let max_run = self.bins.len() * IMPROVEMENT_ROUNDS_PER_BIN;
        let mut sel_time = self.selected_time();
        let mut curr_sel = 0;
        self.improvement_rounds = 0;
        let mut exclusions: HashMap<usize, HashSet<usize>> = HashMap::new();

        while sel_time < self.target || sel_time > self.target + MAX_OVERTIME {
            if self.improvement_rounds == max_run {
                warn!("Improvements: MAX HIT after {max_run} rounds");
                break;
            }
            self.improvement_rounds += 1;
            let curr_run = self.improvement_rounds;

            let current = self.selection[curr_sel];
            let curr_bin = current.bin.unwrap_or(0);
            let time_diff = (sel_time - self.target).abs();
            let min_len = current.duration - time_diff;
            let max_len = current.duration + time_diff;

            let exclude = exclusions
                .entry(curr_bin)
                .or_insert_with(|| HashSet::from([current.index]));

            let candidates: Vec<usize> = self.bins[curr_bin]
                .clone()
                .filter(|index| !exclude.contains(index))
                .filter(|&index| !self.selection.iter().any(|entry| entry.index == index))
                .filter(|&index| {
                    self.items[index]
                        .song
                        .length()
                        .is_some_and(|len| min_len < len && len < max_len)
                })
                .collect();

            if let Some(index) = self.draw_candidate(&candidates, rng) {
                exclude.insert(index);
                self.proposed.push(index);

                let proposal = SelectionEntry::new(self.items, index, Some(curr_bin));
                let new_diff =
                    (sel_time - current.duration + proposal.duration - self.target).abs();

                if new_diff < time_diff {
                    self.selection[curr_sel] = proposal;
                    sel_time = self.selected_time();

                    debug!("IMPROVEMENT RUN: {curr_run}/{max_run}");
                    debug!(
                        "PROPOSAL[bin: {curr_bin}](index: {index}): {} -> {}",
                        current.duration.round(),
                        proposal.duration.round()
                    );
                    debug!("IMPROVED BY: {} sec", (time_diff - new_diff).round());
                    self.log_selection_status();
                }
            }

            curr_sel = (curr_sel + 1) % self.selection.len();
        }

        info!(
            "IMPROVEMENTS: FINISHED ({} proposals in {} rounds)",
            self.proposed.len(),
            self.improvement_rounds
        );
        self.log_selection_status();
    }

    /// Draw one of `candidates`, preferring low play counts when asked to
    fn draw_candidate<R: Rng + ?Sized>(&self, candidates: &[usize], rng: &mut R) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }

        if self.favour_unplayed {
            let levels = play_count_levels(
                candidates
                    .iter()
                    .map(|&index| self.items[index].song.play_count_or_zero()),
            );
            let attempts = ((candidates.len() as f64 / 2.0).round_ties_even() as usize).max(1);

            for level in levels {
                for _ in 0..attempts {
                    let index = candidates[rng.gen_range(0..candidates.len())];
                    if self.items[index].song.play_count_or_zero() == level {
                        return Some(index);
                    }
                }
            }
        }

        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    fn log_selection_status(&self) {
        let sel_time = self.selected_time();
        debug!(
            "TOTAL(sec):{} SELECTED(sec):{} DIFFERENCE(sec):{}",
            self.target.round(),
            sel_time.round(),
            (sel_time - self.target).round()
        );
    }
}

/// Pick songs from `ordered` for `target_duration` seconds with the strategy
/// registered under `strategy_name`
pub fn pick(
    ordered: &[RankedSong],
    strategy_name: Option<&str>,
    target_duration: f64,
    favour_unplayed: bool,
) -> Result<Vec<RankedSong>, SelectionError> {
    pick_with_rng(
        ordered,
        strategy_name,
        target_duration,
        favour_unplayed,
        &mut rand::thread_rng(),
    )
}

/// Same as [`pick`] with an explicit random source
pub fn pick_with_rng<R: Rng + ?Sized>(
    ordered: &[RankedSong],
    strategy_name: Option<&str>,
    target_duration: f64,
    favour_unplayed: bool,
    rng: &mut R,
) -> Result<Vec<RankedSong>, SelectionError> {
    let entries = PickStrategy::resolve(strategy_name).select(
        ordered,
        target_duration,
        favour_unplayed,
        rng,
    )?;

    Ok(entries
        .into_iter()
        .map(|entry| ordered[entry.index].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Song;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(durations: &[f64]) -> Vec<RankedSong> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| {
                RankedSong::unscored(Song {
                    id: i.to_string(),
                    duration: Some(duration),
                    ..Default::default()
                })
            })
            .collect()
    }

    fn in_band(picker: &RandomFromBinsPicker<'_>, target: f64) -> bool {
        let selected = picker.selected_time();
        selected >= target && selected <= target + MAX_OVERTIME
    }

    #[test]
    fn test_improvement_pass_lands_in_band_more_often() {
        // 150..209 seconds, spread over every bin
        let durations: Vec<f64> = (0..60).map(|i| 150.0 + ((i * 37) % 60) as f64).collect();
        let items = pool(&durations);
        let target = 1800.0;

        let mut initial_in_band = 0;
        let mut improved_in_band = 0;
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut picker = RandomFromBinsPicker::new(&items, target, false).unwrap();

            picker.make_initial_selection(&mut rng);
            let initial_diff = (picker.selected_time() - target).abs();
            let was_in_band = in_band(&picker, target);

            picker.improve_selection(&mut rng);
            let improved_diff = (picker.selected_time() - target).abs();

            assert!(improved_diff <= initial_diff);
            if was_in_band {
                initial_in_band += 1;
                assert!(in_band(&picker, target));
                assert_eq!(picker.improvement_rounds, 0);
            }
            if in_band(&picker, target) {
                improved_in_band += 1;
            }
        }

        assert!(
            improved_in_band > initial_in_band,
            "in band: {improved_in_band} improved vs {initial_in_band} initial"
        );
    }

    #[test]
    fn test_rejected_candidate_is_not_proposed_again() {
        // One bin; neither replacement brings 500 s closer to 600 s
        let items = pool(&[500.0, 440.0, 470.0]);
        let mut rng = StdRng::seed_from_u64(21);
        let mut picker = RandomFromBinsPicker::new(&items, 600.0, false).unwrap();
        assert_eq!(picker.bins, vec![0..3]);

        picker.selection = vec![SelectionEntry::new(&items, 0, Some(0))];
        picker.improve_selection(&mut rng);

        // Third round finds nothing left to propose
        assert_eq!(picker.improvement_rounds, IMPROVEMENT_ROUNDS_PER_BIN);
        let mut proposed = picker.proposed.clone();
        proposed.sort_unstable();
        assert_eq!(proposed, vec![1, 2]);
        assert_eq!(picker.selection[0].index, 0);
    }

    #[test]
    fn test_improvement_stops_after_three_rounds_per_bin() {
        // Four bins of two songs; an equal length swap never improves
        let items = pool(&[300.0; 8]);
        let mut rng = StdRng::seed_from_u64(4);
        let mut picker = RandomFromBinsPicker::new(&items, 1200.0, false).unwrap();
        assert_eq!(picker.bins.len(), 4);

        picker.selection = vec![SelectionEntry::new(&items, 0, Some(0))];
        picker.improve_selection(&mut rng);

        assert_eq!(picker.improvement_rounds, 4 * IMPROVEMENT_ROUNDS_PER_BIN);
        assert_eq!(picker.proposed, vec![1]);
        assert_eq!(picker.selection.len(), 1);
    }

    #[test]
    fn test_initial_selection_stops_after_max_rounds() {
        let items = pool(&[200.0, 200.0]);
        let mut rng = StdRng::seed_from_u64(8);
        let mut picker = RandomFromBinsPicker::new(&items, 10_000.0, false).unwrap();

        picker.make_initial_selection(&mut rng);

        assert_eq!(picker.initial_rounds, MAX_INITIAL_ROUNDS);
        assert_eq!(picker.selection.len(), 2);
    }

    #[test]
    fn test_initial_selection_stops_once_close_enough() {
        let items = pool(&[200.0; 10]);
        let mut rng = StdRng::seed_from_u64(8);
        let mut picker = RandomFromBinsPicker::new(&items, 1000.0, false).unwrap();

        picker.make_initial_selection(&mut rng);

        // 800 s leaves a 200 s gap, 1000 s leaves none
        assert_eq!(picker.selection.len(), 5);
        assert_eq!(picker.initial_rounds, 5);
    }
}
