//! Ordering strategies: give every candidate a preference score and sort
//! the pool ascending by it, so the most preferred songs end up last.

use super::error::SelectionError;
use super::stats::FieldStats;
use crate::models::Song;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What to use for a field a song has no (numeric) value for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoValueStrategy {
    /// The field minimum
    #[default]
    Zero,
    /// Halfway between minimum and maximum
    Average,
    /// Uniformly drawn from `[min, max]`
    Random,
}

/// Sign applied to a field's weighted contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Ascending => 1.0,
            Direction::Descending => -1.0,
        }
    }
}

/// Ordering configuration of a training: `{field: signed weight}`.
///
/// A negative weight means the field direction is `-`, i.e. lower values
/// are preferred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderingConfig {
    pub fields: BTreeMap<String, f64>,
    #[serde(default)]
    pub no_value_strategy: NoValueStrategy,
}

impl OrderingConfig {
    pub fn new(fields: BTreeMap<String, f64>, no_value_strategy: NoValueStrategy) -> Self {
        Self {
            fields,
            no_value_strategy,
        }
    }
}

/// Per-field normalisation model, rebuilt from the pool on every call
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScoreModel {
    pub field: String,
    pub min: f64,
    pub max: f64,
    pub delta: f64,
    pub step: f64,
    pub weight: f64,
    pub direction: Direction,
}

impl FieldScoreModel {
    /// Build the model for `field` from the values present in `pool`
    pub fn from_pool(field: &str, signed_weight: f64, pool: &[Song]) -> Self {
        let field = field.trim();
        let (min, max) = FieldStats::collect(pool.iter().map(|song| song.field_value(field)))
            .map(|stats| (stats.min, stats.max))
            .unwrap_or((0.0, 0.0));

        let delta = max - min;
        let step = if delta > 0.0 { 100.0 / delta } else { 0.0 };
        let direction = if signed_weight < 0.0 {
            Direction::Descending
        } else {
            Direction::Ascending
        };

        Self {
            field: field.to_string(),
            min,
            max,
            delta,
            step,
            weight: signed_weight.abs(),
            direction,
        }
    }

    /// Value substituted for songs that lack this field
    fn fallback_value<R: Rng + ?Sized>(&self, strategy: NoValueStrategy, rng: &mut R) -> f64 {
        match strategy {
            NoValueStrategy::Zero => self.min,
            NoValueStrategy::Average => self.min + self.delta / 2.0,
            NoValueStrategy::Random if self.max > self.min => rng.gen_range(self.min..=self.max),
            NoValueStrategy::Random => self.min,
        }
    }

    /// Score one song on this field
    pub fn score<R: Rng + ?Sized>(
        &self,
        song: &Song,
        strategy: NoValueStrategy,
        rng: &mut R,
    ) -> FieldScore {
        let value = song
            .field_value(&self.field)
            .unwrap_or_else(|| self.fallback_value(strategy, rng));

        let distance_from_min = value - self.min;
        let field_score = (distance_from_min * self.step).clamp(0.0, 100.0);
        let weighted_field_score = self.direction.sign() * self.weight * field_score / 100.0;

        FieldScore {
            distance_from_min,
            field_score,
            weighted_field_score,
        }
    }
}

/// Diagnostic breakdown of one field's contribution to a song's score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScore {
    pub distance_from_min: f64,
    /// Normalised score in `[0, 100]`
    pub field_score: f64,
    pub weighted_field_score: f64,
}

/// A candidate song together with the transient ordering data of one run
#[derive(Debug, Clone)]
pub struct RankedSong {
    pub song: Song,
    pub ordering_score: f64,
    pub ordering_info: BTreeMap<String, FieldScore>,
}

impl RankedSong {
    pub fn unscored(song: Song) -> Self {
        Self {
            song,
            ordering_score: 0.0,
            ordering_info: BTreeMap::new(),
        }
    }
}

/// Registered ordering strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingStrategy {
    #[default]
    Unordered,
    ScoreBasedLinear,
}

impl OrderingStrategy {
    pub const ALL: [OrderingStrategy; 2] =
        [OrderingStrategy::Unordered, OrderingStrategy::ScoreBasedLinear];

    pub fn name(self) -> &'static str {
        match self {
            OrderingStrategy::Unordered => "unordered",
            OrderingStrategy::ScoreBasedLinear => "score_based_linear",
        }
    }

    /// Resolve a configured name. Unset names give the default, unknown
    /// names are logged and also give the default.
    pub fn resolve(name: Option<&str>) -> Self {
        match name.map(str::parse::<OrderingStrategy>) {
            None => Self::default(),
            Some(Ok(strategy)) => strategy,
            Some(Err(e)) => {
                warn!("{e}; using '{}'", Self::default());
                Self::default()
            }
        }
    }

    /// Order `pool` ascending by preference score
    pub fn order<R: Rng + ?Sized>(
        self,
        pool: Vec<Song>,
        config: &OrderingConfig,
        rng: &mut R,
    ) -> Vec<RankedSong> {
        info!("ORDERING permutation: {self}");
        match self {
            OrderingStrategy::Unordered => pool.into_iter().map(RankedSong::unscored).collect(),
            OrderingStrategy::ScoreBasedLinear => score_based_linear(pool, config, rng),
        }
    }
}

impl fmt::Display for OrderingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OrderingStrategy {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s.trim())
            .ok_or_else(|| SelectionError::UnknownStrategy {
                kind: "ordering",
                name: s.to_string(),
            })
    }
}

/// Build one model per configured field
pub fn build_field_models(pool: &[Song], config: &OrderingConfig) -> Vec<FieldScoreModel> {
    config
        .fields
        .iter()
        .map(|(field, weight)| FieldScoreModel::from_pool(field, *weight, pool))
        .collect()
}

fn score_based_linear<R: Rng + ?Sized>(
    pool: Vec<Song>,
    config: &OrderingConfig,
    rng: &mut R,
) -> Vec<RankedSong> {
    debug!("Scoring {} items...", pool.len());

    let models = build_field_models(&pool, config);
    for model in &models {
        debug!(
            "ORDER INFO [{}]: min={} max={} delta={} step={} weight={}{}",
            model.field,
            model.min,
            model.max,
            model.delta,
            model.step,
            if model.direction == Direction::Descending { "-" } else { "+" },
            model.weight
        );
    }

    let mut ranked: Vec<RankedSong> = pool
        .into_iter()
        .map(|song| {
            let mut ordering_score = 0.0;
            let mut ordering_info = BTreeMap::new();
            for model in &models {
                let field_score = model.score(&song, config.no_value_strategy, rng);
                ordering_score += field_score.weighted_field_score;
                ordering_info.insert(model.field.clone(), field_score);
            }
            RankedSong {
                song,
                ordering_score,
                ordering_info,
            }
        })
        .collect();

    // Stable: equal scores keep their pool order
    ranked.sort_by(|a, b| a.ordering_score.total_cmp(&b.ordering_score));
    ranked
}

/// Order a pool with the strategy registered under `strategy_name`
pub fn order(pool: Vec<Song>, strategy_name: Option<&str>, config: &OrderingConfig) -> Vec<RankedSong> {
    order_with_rng(pool, strategy_name, config, &mut rand::thread_rng())
}

/// Same as [`order`], drawing missing values from `rng`
pub fn order_with_rng<R: Rng + ?Sized>(
    pool: Vec<Song>,
    strategy_name: Option<&str>,
    config: &OrderingConfig,
    rng: &mut R,
) -> Vec<RankedSong> {
    OrderingStrategy::resolve(strategy_name).order(pool, config, rng)
}
