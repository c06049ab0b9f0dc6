use super::config::ResolvedTraining;
use super::error::SelectionError;
use super::metadata::SelectionSummary;
use super::ordering::{OrderingStrategy, RankedSong};
use super::picking::PickStrategy;
use super::query::TrainingQuery;
use crate::models::Song;
use rand::Rng;

/// Songs chosen for one training run
#[derive(Debug)]
pub struct TrainingSelection {
    pub songs: Vec<RankedSong>,
    pub summary: SelectionSummary,
}

/// Runs the query, ordering and picking steps of a training
pub struct TrainingRunner {
    training: ResolvedTraining,
    ordering: OrderingStrategy,
    picking: PickStrategy,
}

impl TrainingRunner {
    pub fn new(training: ResolvedTraining) -> Self {
        let ordering = OrderingStrategy::resolve(training.ordering_strategy.as_deref());
        let picking = PickStrategy::resolve(training.pick_strategy.as_deref());
        Self {
            training,
            ordering,
            picking,
        }
    }

    pub fn training(&self) -> &ResolvedTraining {
        &self.training
    }

    /// Combine command line elements with the training and flavour queries
    pub fn query(&self, command_query: &[String]) -> TrainingQuery {
        TrainingQuery::combine(&[
            command_query.to_vec(),
            self.training.training_query.clone(),
            self.training.flavour_query.clone(),
        ])
    }

    /// Songs of the library that match the training
    pub fn candidate_pool(&self, songs: Vec<Song>, command_query: &[String]) -> Vec<Song> {
        self.query(command_query).filter(songs)
    }

    /// Order and pick from an already filtered pool
    pub fn select<R: Rng + ?Sized>(
        &self,
        pool: Vec<Song>,
        rng: &mut R,
    ) -> Result<TrainingSelection, SelectionError> {
        let available = pool.len();
        let duration = self.training.duration_seconds();

        let ordered = self.ordering.order(pool, &self.training.ordering, rng);
        let entries = self
            .picking
            .select(&ordered, duration, self.training.favour_unplayed, rng)?;

        let songs: Vec<RankedSong> = entries
            .into_iter()
            .map(|entry| ordered[entry.index].clone())
            .collect();
        let summary = SelectionSummary::new(available, &songs, duration);

        Ok(TrainingSelection { songs, summary })
    }
}
