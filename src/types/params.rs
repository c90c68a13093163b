//! Request parameters for the archive endpoint and the cache key derived from them.

use chrono::{Days, Months, NaiveDate};
use std::fmt;
use thiserror::Error;

/// Days between the newest date the archive reliably covers and today.
const ARCHIVE_LAG_DAYS: u64 = 3;
/// Longest range, in days, that [`FetchParams::check`] accepts.
const MAX_RANGE_DAYS: i64 = 365;

/// Coordinates and inclusive date range for one archive request.
///
/// All fields are kept as the caller typed them. Surrounding whitespace is
/// ignored when deriving the [`RequestKey`] and when building the request.
///
/// # Examples
///
/// ```
/// use weather_archive::FetchParams;
///
/// let params = FetchParams::new("52.5", "13.4", "2023-01-01", "2023-01-03");
/// assert_eq!(params.key().as_str(), "weather_52.5_13.4_2023-01-01_2023-01-03");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub latitude: String,
    pub longitude: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
}

impl FetchParams {
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// The cache / single-flight key for these parameters.
    pub fn key(&self) -> RequestKey {
        RequestKey::from(self)
    }

    /// Query pairs sent to the archive, excluding the metric list.
    pub(crate) fn query_pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("latitude", self.latitude.trim()),
            ("longitude", self.longitude.trim()),
            ("start_date", self.start_date.trim()),
            ("end_date", self.end_date.trim()),
        ]
    }

    /// Checks the parameters the way an interactive form should before calling
    /// [`ArchiveClient::fetch`](crate::ArchiveClient::fetch).
    ///
    /// `today` anchors the recency window: the newest allowed date is three days
    /// before `today`, the oldest is one year before that. The fetch path never
    /// calls this; it is offered to callers that collect free-form input.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found, in the order the checks are listed
    /// on its variants.
    pub fn check(&self, today: NaiveDate) -> Result<(), InputError> {
        let latitude = self.latitude.trim();
        let longitude = self.longitude.trim();
        let start = self.start_date.trim();
        let end = self.end_date.trim();

        if latitude.is_empty() && longitude.is_empty() && start.is_empty() && end.is_empty() {
            return Err(InputError::Empty);
        }
        if latitude.is_empty() || longitude.is_empty() {
            return Err(InputError::MissingCoordinates);
        }
        let in_bounds = match (latitude.parse::<f64>(), longitude.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon),
            _ => false,
        };
        if !in_bounds {
            return Err(InputError::InvalidCoordinates);
        }

        if start.is_empty() || end.is_empty() {
            return Err(InputError::MissingDates);
        }
        let (start, end) = match (parse_date(start), parse_date(end)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(InputError::InvalidDates),
        };
        if end < start {
            return Err(InputError::EndBeforeStart);
        }

        let max_date = today
            .checked_sub_days(Days::new(ARCHIVE_LAG_DAYS))
            .ok_or(InputError::InvalidDates)?;
        if start > max_date || end > max_date {
            return Err(InputError::TooRecent { max_date });
        }
        let min_date = max_date
            .checked_sub_months(Months::new(12))
            .ok_or(InputError::InvalidDates)?;
        if start < min_date || end < min_date {
            return Err(InputError::TooOld { min_date });
        }
        if (end - start).num_days() > MAX_RANGE_DAYS {
            return Err(InputError::RangeTooLong);
        }
        Ok(())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Problems with caller-supplied parameters, worded for display to end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter coordinates and select dates to fetch weather data")]
    Empty,

    #[error("Please enter both latitude and longitude values")]
    MissingCoordinates,

    #[error("Please enter valid coordinates (Latitude: -90 to 90, Longitude: -180 to 180)")]
    InvalidCoordinates,

    #[error("Please select both start and end dates")]
    MissingDates,

    #[error("Please enter valid dates")]
    InvalidDates,

    #[error("End date must be after start date")]
    EndBeforeStart,

    #[error("Max date selected can be 3 days before current date ({max_date})")]
    TooRecent { max_date: NaiveDate },

    #[error("Dates cannot be earlier than 1 year before the maximum allowed date ({min_date})")]
    TooOld { min_date: NaiveDate },

    #[error("Date range cannot exceed 1 year")]
    RangeTooLong,
}

/// Deterministic lookup key for a [`FetchParams`] tuple.
///
/// Shared by the cache and the in-flight registry, so two requests that map to
/// the same key are treated as the same request everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&FetchParams> for RequestKey {
    fn from(params: &FetchParams) -> Self {
        RequestKey(format!(
            "weather_{}_{}_{}_{}",
            params.latitude.trim(),
            params.longitude.trim(),
            params.start_date.trim(),
            params.end_date.trim()
        ))
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin() -> FetchParams {
        FetchParams::new("52.5", "13.4", "2023-01-01", "2023-01-03")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            berlin().key().as_str(),
            "weather_52.5_13.4_2023-01-01_2023-01-03"
        );
    }

    #[test]
    fn test_equal_params_equal_keys() {
        assert_eq!(berlin().key(), berlin().key());
        let padded = FetchParams::new(" 52.5", "13.4 ", "2023-01-01", "\t2023-01-03");
        assert_eq!(padded.key(), berlin().key());
    }

    #[test]
    fn test_any_field_changes_key() {
        let base = berlin().key();
        let variants = [
            FetchParams::new("52.6", "13.4", "2023-01-01", "2023-01-03"),
            FetchParams::new("52.5", "13.5", "2023-01-01", "2023-01-03"),
            FetchParams::new("52.5", "13.4", "2023-01-02", "2023-01-03"),
            FetchParams::new("52.5", "13.4", "2023-01-01", "2023-01-04"),
        ];
        for params in &variants {
            assert_ne!(params.key(), base, "{params:?} collided with base key");
        }
    }

    #[test]
    fn test_query_pairs_are_trimmed() {
        let params = FetchParams::new(" 52.5 ", "13.4", "2023-01-01", "2023-01-03");
        let pairs = params.query_pairs();
        assert_eq!(pairs[0], ("latitude", "52.5"));
        assert_eq!(pairs[3], ("end_date", "2023-01-03"));
    }

    #[test]
    fn test_check_accepts_valid_input() {
        assert_eq!(berlin().check(today()), Ok(()));
    }

    #[test]
    fn test_check_rejections() {
        let cases = [
            (FetchParams::new("", "", "", ""), InputError::Empty),
            (
                FetchParams::new("52.5", "", "2023-01-01", "2023-01-03"),
                InputError::MissingCoordinates,
            ),
            (
                FetchParams::new("91", "13.4", "2023-01-01", "2023-01-03"),
                InputError::InvalidCoordinates,
            ),
            (
                FetchParams::new("north", "13.4", "2023-01-01", "2023-01-03"),
                InputError::InvalidCoordinates,
            ),
            (
                FetchParams::new("52.5", "13.4", "2023-01-01", ""),
                InputError::MissingDates,
            ),
            (
                FetchParams::new("52.5", "13.4", "2023-02-30", "2023-03-01"),
                InputError::InvalidDates,
            ),
            (
                FetchParams::new("52.5", "13.4", "2023-01-03", "2023-01-01"),
                InputError::EndBeforeStart,
            ),
        ];
        for (params, expected) in cases {
            assert_eq!(params.check(today()), Err(expected), "{params:?}");
        }
    }

    #[test]
    fn test_check_recency_window() {
        let too_recent = FetchParams::new("52.5", "13.4", "2023-06-01", "2023-06-13");
        assert_eq!(
            too_recent.check(today()),
            Err(InputError::TooRecent {
                max_date: NaiveDate::from_ymd_opt(2023, 6, 12).unwrap()
            })
        );

        let too_old = FetchParams::new("52.5", "13.4", "2022-06-11", "2022-07-01");
        assert_eq!(
            too_old.check(today()),
            Err(InputError::TooOld {
                min_date: NaiveDate::from_ymd_opt(2022, 6, 12).unwrap()
            })
        );

        let edge = FetchParams::new("52.5", "13.4", "2022-06-12", "2023-06-12");
        assert_eq!(edge.check(today()), Ok(()));
    }
}
