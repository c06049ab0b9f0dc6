use super::config::{FALLBACK_TRAINING, ResolvedTraining, TrainingSettings};
use super::generator::TrainingRunner;
use super::metadata::human_readable_time;
use super::ordering::OrderingStrategy;
use super::picking::PickStrategy;

/// Lines printed by `--list`: every training except the fallback one
pub fn training_listing(settings: &TrainingSettings) -> Vec<String> {
    if settings.trainings.is_empty() {
        return vec!["You have not created any trainings yet.".to_string()];
    }

    let mut lines = vec!["Available trainings:".to_string()];
    for name in settings
        .trainings
        .keys()
        .filter(|name| name.as_str() != FALLBACK_TRAINING)
    {
        match settings.resolve_training(name) {
            Ok(training) => lines.extend(describe_training(&training)),
            Err(e) => lines.push(format!("Training[{name}] cannot be listed: {e}")),
        }
    }
    lines
}

/// Resolved attributes of one training, one `key: value` line each
pub fn describe_training(training: &ResolvedTraining) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("{:=^80}", format!("[   {}   ]", training.name)),
        format!(
            "duration: {}",
            human_readable_time(training.duration_seconds())
        ),
    ];

    if !training.training_query.is_empty() {
        lines.push(format!("query: {}", query_display(&training.training_query)));
    }
    if !training.flavours.is_empty() {
        lines.push(format!("use_flavours: {}", training.flavours.join(", ")));

        let combined = TrainingRunner::new(training.clone()).query(&[]);
        lines.push(format!("combined_query: {}", query_display(&combined.raw)));
    }
    if !training.ordering.fields.is_empty() {
        let ordering: Vec<String> = training
            .ordering
            .fields
            .iter()
            .map(|(field, weight)| format!("{field}({weight})"))
            .collect();
        lines.push(format!("ordering: {}", ordering.join(", ")));
    }
    if let Some(target) = &training.target {
        lines.push(format!("target: {target}"));
    }

    lines.push(format!(
        "ordering_strategy: {}",
        OrderingStrategy::resolve(training.ordering_strategy.as_deref())
    ));
    lines.push(format!(
        "no_value_strategy: {}",
        format!("{:?}", training.ordering.no_value_strategy).to_lowercase()
    ));
    lines.push(format!(
        "pick_strategy: {}",
        PickStrategy::resolve(training.pick_strategy.as_deref())
    ));
    lines.push(format!("favour_unplayed: {}", training.favour_unplayed));
    lines.push(format!(
        "increment_play_count: {}",
        training.increment_play_count
    ));

    lines
}

/// `bpm:150..` becomes `bpm(150..)`
fn query_display(elements: &[String]) -> String {
    elements
        .iter()
        .map(|element| match element.split_once(':') {
            Some((key, value)) => format!("{key}({value})"),
            None => element.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
