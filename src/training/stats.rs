/// Summary statistics over the values of one numeric field.
///
/// Only values that could be coerced to a finite number take part; the
/// rest are skipped instead of being counted as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: usize,
}

impl FieldStats {
    /// Collect statistics from an iterator of optional values.
    /// Returns `None` when no usable value is present.
    pub fn collect<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<FieldStats>, value| {
                Some(match acc {
                    None => FieldStats {
                        min: value,
                        max: value,
                        sum: value,
                        count: 1,
                    },
                    Some(stats) => FieldStats {
                        min: stats.min.min(value),
                        max: stats.max.max(value),
                        sum: stats.sum + value,
                        count: stats.count + 1,
                    },
                })
            })
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn delta(&self) -> f64 {
        self.max - self.min
    }
}

/// Sorted, de-duplicated play-count levels present in `counts`.
pub fn play_count_levels<I>(counts: I) -> Vec<u32>
where
    I: IntoIterator<Item = u32>,
{
    let mut levels: Vec<u32> = counts.into_iter().collect();
    levels.sort_unstable();
    levels.dedup();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_collect_skips_missing_values() {
        let stats = FieldStats::collect(vec![Some(120.0), None, Some(180.0), Some(f64::NAN)])
            .expect("two usable values");

        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.min, 120.0);
        assert_relative_eq!(stats.max, 180.0);
        assert_relative_eq!(stats.avg(), 150.0);
        assert_relative_eq!(stats.delta(), 60.0);
    }

    #[test]
    fn test_collect_without_values() {
        assert!(FieldStats::collect(vec![None, None]).is_none());
        assert!(FieldStats::collect(Vec::<Option<f64>>::new()).is_none());
    }

    #[test]
    fn test_play_count_levels_sorted_and_unique() {
        assert_eq!(play_count_levels(vec![3, 0, 1, 0, 3]), vec![0, 1, 3]);
    }
}
