use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily temperature series for one request, as returned by the archive.
///
/// `time` holds one date per day of the requested range; every other field is a
/// series parallel to it. Values the archive could not compute are `None`.
/// A `DailyWeather` produced by this crate always satisfies
/// [`DailyWeather::is_consistent`].
///
/// Serializes with the archive's own field names, so a cached record reads the
/// same as the `daily` object of a response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyWeather {
    pub time: Vec<NaiveDate>,
    #[serde(rename = "temperature_2m_max")]
    pub temp_max: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min")]
    pub temp_min: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_mean")]
    pub temp_mean: Vec<Option<f64>>,
    #[serde(rename = "apparent_temperature_max")]
    pub apparent_temp_max: Vec<Option<f64>>,
    #[serde(rename = "apparent_temperature_min")]
    pub apparent_temp_min: Vec<Option<f64>>,
    #[serde(rename = "apparent_temperature_mean")]
    pub apparent_temp_mean: Vec<Option<f64>>,
}

/// A single day out of a [`DailyWeather`], in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_mean: Option<f64>,
    pub apparent_temp_max: Option<f64>,
    pub apparent_temp_min: Option<f64>,
    pub apparent_temp_mean: Option<f64>,
}

impl DailyWeather {
    /// Number of days covered.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// True when all six series have exactly as many entries as `time`.
    pub fn is_consistent(&self) -> bool {
        let days = self.time.len();
        self.series().iter().all(|series| series.len() == days)
    }

    fn series(&self) -> [&[Option<f64>]; 6] {
        [
            self.temp_max.as_slice(),
            self.temp_min.as_slice(),
            self.temp_mean.as_slice(),
            self.apparent_temp_max.as_slice(),
            self.apparent_temp_min.as_slice(),
            self.apparent_temp_mean.as_slice(),
        ]
    }

    /// Iterates the data one day at a time, oldest first.
    pub fn records(&self) -> impl Iterator<Item = DailyRecord> + '_ {
        self.time.iter().enumerate().map(move |(i, &date)| DailyRecord {
            date,
            temp_max: value_at(&self.temp_max, i),
            temp_min: value_at(&self.temp_min, i),
            temp_mean: value_at(&self.temp_mean, i),
            apparent_temp_max: value_at(&self.apparent_temp_max, i),
            apparent_temp_min: value_at(&self.apparent_temp_min, i),
            apparent_temp_mean: value_at(&self.apparent_temp_mean, i),
        })
    }

    /// Returns the records of one page. `page` is 1-based; page 0 or a page past
    /// the end yields an empty vector.
    pub fn page(&self, page: usize, per_page: usize) -> Vec<DailyRecord> {
        if page == 0 || per_page == 0 {
            return Vec::new();
        }
        self.records()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect()
    }

    /// Number of pages needed to show every record at `per_page` records each.
    pub fn page_count(&self, per_page: usize) -> usize {
        if per_page == 0 {
            return 0;
        }
        self.len().div_ceil(per_page)
    }
}

fn value_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(days: usize) -> DailyWeather {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let values: Vec<Option<f64>> = (0..days).map(|i| Some(i as f64)).collect();
        DailyWeather {
            time: start.iter_days().take(days).collect(),
            temp_max: values.clone(),
            temp_min: values.clone(),
            temp_mean: values.clone(),
            apparent_temp_max: values.clone(),
            apparent_temp_min: values.clone(),
            apparent_temp_mean: values,
        }
    }

    #[test]
    fn test_consistency() {
        assert!(DailyWeather::default().is_consistent());
        let mut weather = sample(3);
        assert!(weather.is_consistent());
        weather.apparent_temp_min.pop();
        assert!(!weather.is_consistent());
    }

    #[test]
    fn test_records_follow_time_order() {
        let mut weather = sample(3);
        weather.temp_mean[1] = None;
        let records: Vec<_> = weather.records().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(records[2].temp_max, Some(2.0));
        assert_eq!(records[1].temp_mean, None);
    }

    #[test]
    fn test_paging() {
        let weather = sample(12);
        assert_eq!(weather.page_count(5), 3);
        assert_eq!(weather.page(1, 5).len(), 5);
        let last = weather.page(3, 5);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].date, NaiveDate::from_ymd_opt(2023, 1, 11).unwrap());
        assert!(weather.page(4, 5).is_empty());
        assert!(weather.page(0, 5).is_empty());
    }

    #[test]
    fn test_serializes_with_archive_field_names() {
        let json = serde_json::to_value(sample(1)).unwrap();
        assert_eq!(json["time"][0], "2023-01-01");
        assert_eq!(json["temperature_2m_max"][0], 0.0);
        assert!(json.get("apparent_temperature_mean").is_some());
    }
}
