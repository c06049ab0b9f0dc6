#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::ordering::NoValueStrategy;
    use tempfile::TempDir;

    const SETTINGS: &str = r#"{
        "targets": {
            "watch": {
                "device_root": "/media/watch",
                "device_path": "Music/Training",
                "clean_target": true,
                "delete_from_device": ["LASTPLAYED.txt"]
            },
            "phone": {
                "device_path": "Music"
            }
        },
        "flavours": {
            "energetic": { "bpm": "150..", "genre": ["electronic", "rock"] },
            "recent": { "year": "2015.." }
        },
        "trainings": {
            "fallback": {
                "target": "watch",
                "ordering": { "bpm": 100 },
                "ordering_strategy": "score_based_linear",
                "pick_strategy": "random_from_bins",
                "favour_unplayed": true
            },
            "long-run": {
                "duration": 90,
                "query": { "bpm": "140..160" },
                "use_flavours": ["energetic", "recent"],
                "no_value_strategy": "average"
            },
            "sprint": {
                "duration": 20,
                "use_flavours": "energetic",
                "pick_strategy": "top",
                "target": "phone",
                "increment_play_count": true
            }
        }
    }"#;

    fn settings() -> TrainingSettings {
        TrainingSettings::from_json(SETTINGS).unwrap()
    }

    #[test]
    fn test_training_inherits_from_fallback() {
        let training = settings().resolve_training("long-run").unwrap();

        assert_eq!(training.name, "long-run");
        assert_eq!(training.duration_minutes, 90.0);
        assert_eq!(training.duration_seconds(), 5400.0);
        assert_eq!(training.target.as_deref(), Some("watch"));
        assert_eq!(training.ordering_strategy.as_deref(), Some("score_based_linear"));
        assert_eq!(training.pick_strategy.as_deref(), Some("random_from_bins"));
        assert!(training.favour_unplayed);
        assert!(!training.increment_play_count);
        assert_eq!(training.ordering.fields.get("bpm"), Some(&100.0));
        assert_eq!(training.ordering.no_value_strategy, NoValueStrategy::Average);
    }

    #[test]
    fn test_training_overrides_fallback() {
        let training = settings().resolve_training("sprint").unwrap();

        assert_eq!(training.duration_minutes, 20.0);
        assert_eq!(training.target.as_deref(), Some("phone"));
        assert_eq!(training.pick_strategy.as_deref(), Some("top"));
        assert!(training.increment_play_count);
        assert_eq!(training.ordering.no_value_strategy, NoValueStrategy::Zero);
    }

    #[test]
    fn test_fallback_defaults() {
        let settings = TrainingSettings::from_json(r#"{"trainings": {"easy": {}}}"#).unwrap();
        let training = settings.resolve_training("easy").unwrap();

        assert_eq!(training.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(training.target, None);
        assert_eq!(training.ordering_strategy, None);
        assert_eq!(training.pick_strategy, None);
        assert!(training.ordering.fields.is_empty());
        assert!(!training.favour_unplayed);
        assert!(training.training_query.is_empty());
        assert!(training.flavour_query.is_empty());
    }

    #[test]
    fn test_query_and_flavour_elements() {
        let training = settings().resolve_training("long-run").unwrap();

        assert_eq!(training.training_query, vec!["bpm:140..160"]);
        assert_eq!(training.flavours, vec!["energetic", "recent"]);
        assert_eq!(
            training.flavour_query,
            vec!["bpm:150..", "genre:electronic", "genre:rock", "year:2015.."]
        );
    }

    #[test]
    fn test_single_flavour_name() {
        let training = settings().resolve_training("sprint").unwrap();
        assert_eq!(
            training.flavour_query,
            vec!["bpm:150..", "genre:electronic", "genre:rock"]
        );
        assert!(settings().flavour_elements("unknown").is_empty());
    }

    #[test]
    fn test_unknown_training() {
        let err = settings().resolve_training("yoga").unwrap_err();
        assert_eq!(
            err.to_string(),
            "There is no training[yoga] registered with this name!"
        );
    }

    #[test]
    fn test_resolve_target_defaults() {
        let settings = settings();
        let training = settings.resolve_training("long-run").unwrap();
        let target = settings.resolve_target(&training).unwrap();

        assert_eq!(target.name, "watch");
        assert_eq!(target.device_root.as_deref(), Some("/media/watch"));
        assert_eq!(target.device_path, "Music/Training");
        assert!(target.clean_target);
        assert_eq!(target.delete_from_device, vec!["LASTPLAYED.txt"]);
        assert!(target.generate_playlist);
        assert!(target.copy_files);
    }

    #[test]
    fn test_missing_target_errors() {
        let settings = TrainingSettings::from_json(
            r#"{"trainings": {"easy": {}, "lost": {"target": "usb"}}}"#,
        )
        .unwrap();

        let easy = settings.resolve_training("easy").unwrap();
        assert_eq!(
            settings.resolve_target(&easy).unwrap_err().to_string(),
            "The training[easy] does not declare a target!"
        );

        let lost = settings.resolve_training("lost").unwrap();
        assert_eq!(
            settings.resolve_target(&lost).unwrap_err().to_string(),
            "The target name[usb] is not defined!"
        );
    }

    #[test]
    fn test_destination_path_validation() {
        let settings = settings();
        let sprint = settings.resolve_training("sprint").unwrap();
        let phone = settings.resolve_target(&sprint).unwrap();
        assert_eq!(
            phone.destination_path().unwrap_err().to_string(),
            "The target[phone] does not declare a device root path."
        );

        let root = TempDir::new().unwrap();
        let mut target = ResolvedTarget {
            name: "usb".to_string(),
            device_root: Some(root.path().to_string_lossy().to_string()),
            device_path: "/Music/".to_string(),
            clean_target: false,
            delete_from_device: Vec::new(),
            generate_playlist: true,
            copy_files: true,
        };
        assert!(
            target
                .destination_path()
                .unwrap_err()
                .to_string()
                .starts_with("The target[usb] path does not exist:")
        );

        std::fs::create_dir(root.path().join("Music")).unwrap();
        assert_eq!(target.destination_path().unwrap(), root.path().join("Music"));

        target.device_path = String::new();
        assert_eq!(target.destination_path().unwrap(), root.path());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trainings.json");
        std::fs::write(&path, SETTINGS).unwrap();

        let settings = TrainingSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.trainings.len(), 3);
        assert_eq!(settings.targets.len(), 2);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(TrainingSettings::load_from_file(&path).is_err());
    }
}
