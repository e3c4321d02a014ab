use crate::weather::WeatherSeries;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;
use std::io::{BufRead, BufReader, Read};

/// Reader for the crate's own weather CSV format: a block of `# key: value`
/// metadata lines followed by a regular CSV table whose first column is the
/// timestamp and whose remaining headers are canonical column names.
///
/// Recognised metadata keys are `latitude`, `longitude`, `timezone` (a fixed
/// offset like `+01:00`, or `UTC`) and `data_height <column>` with a height
/// in metres.

const TIMESTAMP_COLUMN: &str = "timestamp";
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A weather series plus the location metadata found in the file header.
#[derive(Debug)]
pub struct WeatherFile {
    pub weather: WeatherSeries,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default)]
struct Metadata {
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<FixedOffset>,
    heights: IndexMap<String, f64>,
}

impl Metadata {
    fn apply(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "latitude" => self.latitude = Some(value.parse()?),
            "longitude" => self.longitude = Some(value.parse()?),
            "timezone" => self.timezone = Some(parse_timezone(value)?),
            _ => {
                if let Some(column) = key.strip_prefix("data_height ") {
                    self.heights.insert(column.trim().to_string(), value.parse()?);
                }
                // unknown keys are ignored so that files can carry their own
                // annotations
            }
        }
        Ok(())
    }
}

fn parse_timezone(value: &str) -> anyhow::Result<FixedOffset> {
    if value.eq_ignore_ascii_case("utc") {
        return Ok(FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid UTC offset"))?);
    }
    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => bail!("timezone '{value}' is neither 'UTC' nor a signed offset"),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("timezone offset '{value}' is not of the form +HH:MM"))?;
    let seconds = sign * (hours.parse::<i32>()? * 3_600 + minutes.parse::<i32>()? * 60);
    FixedOffset::east_opt(seconds).ok_or_else(|| anyhow!("timezone offset '{value}' out of range"))
}

fn parse_timestamp(
    value: &str,
    timezone: Option<FixedOffset>,
) -> anyhow::Result<DateTime<FixedOffset>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp);
    }
    let naive = NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .with_context(|| format!("could not parse timestamp '{value}'"))?;
    let timezone = timezone.ok_or_else(|| {
        anyhow!("timestamp '{value}' has no offset and the file declares no timezone")
    })?;
    naive
        .and_local_timezone(timezone)
        .single()
        .ok_or_else(|| anyhow!("timestamp '{value}' is ambiguous in the declared timezone"))
}

/// Reads a weather file in the crate's CSV format.
pub fn read_feedin_weather(source: impl Read) -> anyhow::Result<WeatherFile> {
    let mut reader = BufReader::new(source);
    let mut metadata = Metadata::default();
    let mut table = String::new();

    // the metadata block only ever sits at the top, but the csv reader below
    // skips comment lines anywhere
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if let Some(comment) = line.trim_start().strip_prefix('#') {
            if let Some((key, value)) = comment.split_once(':') {
                metadata
                    .apply(key.trim(), value.trim())
                    .with_context(|| format!("invalid metadata line '{}'", line.trim_end()))?;
            }
        } else {
            table.push_str(&line);
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(table.as_bytes());

    let headers = csv_reader.headers()?.clone();
    if headers.get(0) != Some(TIMESTAMP_COLUMN) {
        bail!(
            "first column of a weather file must be '{TIMESTAMP_COLUMN}', found '{}'",
            headers.get(0).unwrap_or_default()
        );
    }

    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len().saturating_sub(1)];
    for record in csv_reader.records() {
        let record = record?;
        timestamps.push(parse_timestamp(
            record.get(0).unwrap_or_default(),
            metadata.timezone,
        )?);
        for (index, column) in columns.iter_mut().enumerate() {
            let field = record.get(index + 1).ok_or_else(|| {
                anyhow!("row {} is missing a value for '{}'", timestamps.len(), &headers[index + 1])
            })?;
            column.push(field.parse().with_context(|| {
                format!("invalid value '{field}' in column '{}'", &headers[index + 1])
            })?);
        }
    }

    let mut builder = WeatherSeries::builder().timestamps(timestamps);
    for (index, values) in columns.into_iter().enumerate() {
        let name = &headers[index + 1];
        builder = builder.column(name, values);
        if let Some(height) = metadata.heights.get(name) {
            builder = builder.height(name, *height);
        }
    }

    Ok(WeatherFile {
        weather: builder.build()?,
        latitude: metadata.latitude,
        longitude: metadata.longitude,
    })
}
