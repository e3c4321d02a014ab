use crate::errors::FeedinError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;

/// This module contains the weather data adapter. It normalises column names
/// and units from arbitrary weather sources (open_FRED, ERA5, coastDat2, own
/// measurements) into a canonical schema tagged with per-column measurement
/// heights, and validates the structure of the series before any model sees
/// it.
///
/// Canonical units: wind speed in m/s, air temperature in K, pressure in Pa,
/// roughness length in m, irradiance in W/m2. Heights are in metres above
/// ground; columns that are physically height-invariant (irradiance,
/// roughness length) use height 0 by convention.

pub const WIND_SPEED: &str = "wind_speed";
pub const AIR_TEMPERATURE: &str = "air_temperature";
pub const PRESSURE: &str = "pressure";
pub const ROUGHNESS_LENGTH: &str = "roughness_length";
/// Diffuse horizontal irradiance.
pub const DHI: &str = "dhi";
/// Direct irradiance on the horizontal plane.
pub const DIRHI: &str = "dirhi";
/// Direct irradiance at normal incidence.
pub const DNI: &str = "dni";
/// Global horizontal irradiance.
pub const GHI: &str = "ghi";

#[derive(Clone, Debug)]
struct WeatherColumn {
    values: Vec<f64>,
    height: f64,
}

/// An ordered weather time series with one row per timestamp.
#[derive(Clone, Debug)]
pub struct WeatherSeries {
    timestamps: Vec<DateTime<FixedOffset>>,
    columns: IndexMap<String, WeatherColumn>,
}

impl WeatherSeries {
    pub fn builder() -> WeatherSeriesBuilder {
        WeatherSeriesBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<FixedOffset>] {
        &self.timestamps
    }

    /// The step of the series, inferred from the first two timestamps.
    /// A single-row series reports an hourly step.
    pub fn resolution(&self) -> Duration {
        match self.timestamps.len() {
            0 | 1 => Duration::hours(1),
            _ => self.timestamps[1] - self.timestamps[0],
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|c| c.values.as_slice())
    }

    /// Measurement height of a column in metres above ground.
    pub fn height_of(&self, name: &str) -> Option<f64> {
        self.columns.get(name).map(|c| c.height)
    }

    /// Checks that all columns a model relies on are present, failing with an
    /// error naming the first missing column.
    pub fn require(
        &self,
        model: &'static str,
        columns: &[&'static str],
    ) -> Result<(), FeedinError> {
        for column in columns {
            if !self.has_column(column) {
                return Err(FeedinError::MissingColumn { column, model });
            }
        }
        Ok(())
    }
}

/// Builder accepting a tabular time series plus a column-name mapping and a
/// per-column height mapping.
#[derive(Debug, Default)]
pub struct WeatherSeriesBuilder {
    timestamps: Option<Vec<DateTime<FixedOffset>>>,
    naive_timestamps: Option<Vec<NaiveDateTime>>,
    utc_offset: Option<FixedOffset>,
    columns: IndexMap<String, Vec<f64>>,
    renames: IndexMap<String, String>,
    heights: IndexMap<String, f64>,
}

impl WeatherSeriesBuilder {
    /// Timezone-aware time index.
    pub fn timestamps(mut self, timestamps: Vec<DateTime<FixedOffset>>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Naive time index; only accepted together with [`Self::utc_offset`].
    pub fn naive_timestamps(mut self, timestamps: Vec<NaiveDateTime>) -> Self {
        self.naive_timestamps = Some(timestamps);
        self
    }

    /// Explicit UTC offset used to localise a naive time index.
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    /// Maps a source column name onto one of the canonical names.
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    /// Measurement height for a (canonical) column name, in metres.
    pub fn height(mut self, name: impl Into<String>, height: f64) -> Self {
        self.heights.insert(name.into(), height);
        self
    }

    pub fn build(self) -> Result<WeatherSeries, FeedinError> {
        let timestamps = match (self.timestamps, self.naive_timestamps) {
            (Some(aware), _) => aware,
            (None, Some(naive)) => {
                let offset = self.utc_offset.ok_or_else(|| {
                    FeedinError::InvalidWeather(
                        "time index is not timezone-aware and no UTC offset was given".into(),
                    )
                })?;
                naive
                    .into_iter()
                    .map(|ts| ts.and_local_timezone(offset).single())
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        FeedinError::InvalidWeather(
                            "time index could not be localised to the given UTC offset".into(),
                        )
                    })?
            }
            (None, None) => {
                return Err(FeedinError::InvalidWeather("no time index given".into()));
            }
        };
        if timestamps.is_empty() {
            return Err(FeedinError::InvalidWeather("time index is empty".into()));
        }
        if timestamps.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(FeedinError::InvalidWeather(
                "time index must be strictly increasing".into(),
            ));
        }

        let mut columns: IndexMap<String, WeatherColumn> = Default::default();
        for (name, values) in self.columns {
            if values.len() != timestamps.len() {
                return Err(FeedinError::InvalidWeather(format!(
                    "column '{name}' has {} values but the time index has {} entries",
                    values.len(),
                    timestamps.len(),
                )));
            }
            let name = self.renames.get(&name).cloned().unwrap_or(name);
            let height = self.heights.get(&name).copied().unwrap_or(0.);
            if columns
                .insert(name.clone(), WeatherColumn { values, height })
                .is_some()
            {
                return Err(FeedinError::InvalidWeather(format!(
                    "two source columns map onto canonical column '{name}'",
                )));
            }
        }

        Ok(WeatherSeries {
            timestamps,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rstest::*;

    fn hourly_timestamps(n: usize) -> Vec<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(0).unwrap();
        (0..n)
            .map(|h| {
                offset
                    .with_ymd_and_hms(2020, 6, 1, h as u32, 0, 0)
                    .unwrap()
            })
            .collect()
    }

    #[fixture]
    fn weather() -> WeatherSeries {
        WeatherSeries::builder()
            .timestamps(hourly_timestamps(3))
            .column("wss_10", vec![5.0, 6.0, 7.0])
            .rename("wss_10", WIND_SPEED)
            .height(WIND_SPEED, 10.)
            .column(DHI, vec![100., 120., 90.])
            .build()
            .unwrap()
    }

    #[rstest]
    fn renames_source_columns_onto_canonical_schema(weather: WeatherSeries) {
        assert!(weather.has_column(WIND_SPEED));
        assert!(!weather.has_column("wss_10"));
        assert_eq!(weather.column(WIND_SPEED).unwrap(), &[5.0, 6.0, 7.0]);
        assert_eq!(weather.height_of(WIND_SPEED), Some(10.));
        // irradiance keeps the height-0 convention
        assert_eq!(weather.height_of(DHI), Some(0.));
    }

    #[rstest]
    fn reports_hourly_resolution(weather: WeatherSeries) {
        assert_eq!(weather.resolution(), Duration::hours(1));
    }

    #[rstest]
    fn require_names_the_missing_column(weather: WeatherSeries) {
        let err = weather
            .require("windpower", &[WIND_SPEED, PRESSURE])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "weather data is missing required column 'pressure' for model 'windpower'"
        );
    }

    #[test]
    fn rejects_naive_time_index_without_offset() {
        let naive = vec![
            NaiveDate::from_ymd_opt(2020, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ];
        let err = WeatherSeries::builder()
            .naive_timestamps(naive)
            .column(DHI, vec![0.])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not timezone-aware"));
    }

    #[test]
    fn accepts_naive_time_index_with_offset() {
        let naive = vec![
            NaiveDate::from_ymd_opt(2020, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ];
        let weather = WeatherSeries::builder()
            .naive_timestamps(naive)
            .utc_offset(FixedOffset::east_opt(3600).unwrap())
            .column(DHI, vec![0.])
            .build()
            .unwrap();
        assert_eq!(weather.timestamps()[0].offset().local_minus_utc(), 3600);
    }

    #[test]
    fn rejects_unsorted_time_index() {
        let mut timestamps = hourly_timestamps(3);
        timestamps.swap(0, 2);
        let err = WeatherSeries::builder()
            .timestamps(timestamps)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_column_length_mismatch() {
        let err = WeatherSeries::builder()
            .timestamps(hourly_timestamps(3))
            .column(DHI, vec![0., 1.])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'dhi'"));
    }
}
