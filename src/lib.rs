pub mod core;
mod errors;
pub mod input;
pub mod output;
pub mod read_weather_file;
pub mod weather;

pub use crate::core::parameters::ParameterLibrary;
pub use crate::core::power_plant::{
    FeedinModel, FeedinSeries, PhotovoltaicPlant, Scaling, WindPlant,
};
pub use crate::core::pv::PvModel;
pub use crate::core::wind::WindModel;
pub use crate::errors::FeedinError;
pub use crate::input::{ingest, PlantInput, RunInput};
pub use crate::read_weather_file::{read_feedin_weather, WeatherFile};
pub use crate::weather::WeatherSeries;

use crate::output::FeedinOutput;
use std::io::Read;
use tracing::{info, instrument};

/// Runs one plant described by a JSON input against a weather file and writes
/// the feed-in series as CSV to the given output.
///
/// For PV plants whose input omits the coordinates, the latitude and
/// longitude fall back to the weather file's metadata.
#[instrument(skip_all, fields(result_key = result_key))]
pub fn run_feedin(
    input: impl Read,
    weather: impl Read,
    result_key: &str,
    output: &FeedinOutput,
) -> anyhow::Result<()> {
    let run = input::ingest(input)?;
    let weather_file = read_feedin_weather(weather)?;
    let library = ParameterLibrary::bundled()?;

    let series = match run.plant {
        PlantInput::Photovoltaic(mut plant) => {
            if plant.latitude.is_none() {
                plant.latitude = weather_file.latitude;
            }
            if plant.longitude.is_none() {
                plant.longitude = weather_file.longitude;
            }
            let model = PvModel::new(plant, &library)?;
            info!(model = model.name(), rows = weather_file.weather.len(), "running feed-in model");
            model.feedin_scaled(&weather_file.weather, run.scaling.as_ref())?
        }
        PlantInput::Wind(plant) => {
            let model = WindModel::new(plant, &library)?;
            info!(model = model.name(), rows = weather_file.weather.len(), "running feed-in model");
            model.feedin_scaled(&weather_file.weather, run.scaling.as_ref())?
        }
    };

    write_feedin(&series, result_key, output)?;
    info!(rows = series.len(), "feed-in series written");

    Ok(())
}

fn write_feedin(
    series: &FeedinSeries,
    result_key: &str,
    output: &FeedinOutput,
) -> anyhow::Result<()> {
    if output.is_sink() {
        return Ok(());
    }
    let writer = output.writer(result_key)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["timestamp", "feedin [W]"])?;
    for (timestamp, value) in series.timestamps().iter().zip(series.values()) {
        csv_writer.write_record([timestamp.to_rfc3339(), value.to_string()])?;
    }
    csv_writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    const WEATHER: &str = "\
# latitude: 52.5
# longitude: 13.4
# timezone: +01:00
# data_height wind_speed: 10
# data_height air_temperature: 2
timestamp,wind_speed,air_temperature,pressure,roughness_length,dhi,dirhi
2020-06-01 11:00:00,5.0,293.15,101325.0,0.15,100.0,400.0
2020-06-01 12:00:00,6.0,294.15,101325.0,0.15,120.0,450.0
";

    #[rstest]
    fn runs_a_pv_plant_with_coordinates_from_the_weather_file() {
        let input = r#"{
            "plant": {
                "type": "photovoltaic",
                "module_name": "Aleo S19 285",
                "azimuth": 0.0,
                "tilt": 30.0
            }
        }"#;
        run_feedin(input.as_bytes(), WEATHER.as_bytes(), "pv", &FeedinOutput::Sink)
            .unwrap();
    }

    #[rstest]
    fn runs_a_wind_plant_with_capacity_scaling() {
        let input = r#"{
            "plant": {
                "type": "wind",
                "turbine_type": "V90/2000",
                "hub_height": 105.0
            },
            "scaling": {"capacity": 6000000.0}
        }"#;
        run_feedin(input.as_bytes(), WEATHER.as_bytes(), "wind", &FeedinOutput::Sink)
            .unwrap();
    }

    #[rstest]
    fn pv_plant_without_any_coordinates_fails() {
        let input = r#"{
            "plant": {
                "type": "photovoltaic",
                "module_name": "Aleo S19 285",
                "azimuth": 0.0,
                "tilt": 30.0
            }
        }"#;
        let weather = "\
timestamp,wind_speed,air_temperature,dhi,dirhi
2020-06-01T11:00:00Z,5.0,293.15,100.0,400.0
";
        let err = run_feedin(input.as_bytes(), weather.as_bytes(), "pv", &FeedinOutput::Sink)
            .unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }
}
