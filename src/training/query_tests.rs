#[cfg(test)]
mod tests {
    use super::super::query::*;
    use crate::models::{Genre, Song};
    use serde_json::json;

    fn create_song(title: &str, artist: &str, bpm: Option<u32>, year: Option<u32>) -> Song {
        Song {
            id: title.to_lowercase(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Road Work".to_string(),
            genres: Some(vec![Genre {
                name: "Electronic".to_string(),
            }]),
            bpm,
            year,
            duration: Some(210.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            QueryElement::parse("bpm:120..150"),
            QueryElement {
                key: Some("bpm".to_string()),
                matcher: Matcher::Range {
                    min: Some(120.0),
                    max: Some(150.0)
                }
            }
        );
        assert_eq!(
            QueryElement::parse("year:2010..").matcher,
            Matcher::Range {
                min: Some(2010.0),
                max: None
            }
        );
        assert_eq!(
            QueryElement::parse("length:..240").matcher,
            Matcher::Range {
                min: None,
                max: Some(240.0)
            }
        );
    }

    #[test]
    fn test_parse_text_values() {
        assert_eq!(
            QueryElement::parse("genre:Rock").matcher,
            Matcher::Text("rock".to_string())
        );
        // Not numeric, so not a range
        assert_eq!(
            QueryElement::parse("album:a..z").matcher,
            Matcher::Text("a..z".to_string())
        );
        let bare = QueryElement::parse("Sunrise");
        assert_eq!(bare.key, None);
        assert_eq!(bare.matcher, Matcher::Text("sunrise".to_string()));
    }

    #[test]
    fn test_range_is_inclusive_and_needs_a_value() {
        let element = QueryElement::parse("bpm:120..150");

        assert!(element.matches(&create_song("Low", "X", Some(120), None)));
        assert!(element.matches(&create_song("High", "X", Some(150), None)));
        assert!(!element.matches(&create_song("Fast", "X", Some(151), None)));
        assert!(!element.matches(&create_song("Unknown", "X", None, None)));
    }

    #[test]
    fn test_range_on_extra_attribute() {
        let mut song = create_song("Rated", "X", None, None);
        song.extra.insert("userRating".to_string(), json!(4));

        assert!(QueryElement::parse("userRating:3..").matches(&song));
        assert!(!QueryElement::parse("userRating:5..").matches(&song));
    }

    #[test]
    fn test_text_and_bare_terms() {
        let song = create_song("Morning Sprint", "The Pacers", Some(160), Some(2018));

        assert!(QueryElement::parse("genre:electro").matches(&song));
        assert!(QueryElement::parse("artist:pacers").matches(&song));
        assert!(!QueryElement::parse("artist:walkers").matches(&song));
        assert!(QueryElement::parse("sprint").matches(&song));
        assert!(QueryElement::parse("road").matches(&song));
        assert!(!QueryElement::parse("marathon").matches(&song));
    }

    #[test]
    fn test_combine_keeps_first_element_per_key() {
        let query = TrainingQuery::combine(&[
            vec!["bpm:160..180".to_string()],
            vec!["bpm:120..140".to_string(), "year:2000..".to_string()],
            vec!["year:1990..".to_string(), "genre:rock".to_string()],
        ]);

        assert_eq!(query.raw, vec!["bpm:160..180", "year:2000..", "genre:rock"]);
        assert_eq!(query.keys(), vec!["bpm", "year", "genre"]);
    }

    #[test]
    fn test_filter_requires_every_element() {
        let songs = vec![
            create_song("A", "X", Some(165), Some(2015)),
            create_song("B", "X", Some(165), Some(1995)),
            create_song("C", "X", Some(120), Some(2015)),
            create_song("D", "X", None, Some(2015)),
        ];

        let query = TrainingQuery::combine(&[vec![
            "bpm:160..180".to_string(),
            "year:2000..".to_string(),
        ]]);
        let matching = query.filter(songs);

        let titles: Vec<&str> = matching.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = TrainingQuery::combine(&[vec![], vec!["  ".to_string()]]);
        assert!(query.elements.is_empty());
        assert_eq!(query.filter(vec![create_song("A", "X", None, None)]).len(), 1);
    }

    #[test]
    fn test_format_query_elements() {
        assert_eq!(format_query_elements("bpm", &json!("150..170")), vec!["bpm:150..170"]);
        assert_eq!(format_query_elements("year", &json!(2010)), vec!["year:2010"]);
        assert_eq!(
            format_query_elements("genre", &json!(["rock", "metal"])),
            vec!["genre:rock", "genre:metal"]
        );
        assert!(format_query_elements("genre", &json!(null)).is_empty());
    }
}
