use crate::core::irradiance::plane_of_array_irradiance;
use crate::core::parameters::{ParameterLibrary, PvModuleRecord};
use crate::core::power_plant::{FeedinModel, FeedinSeries, PhotovoltaicPlant, Scaling};
use crate::core::solar::averaged_solar_position;
use crate::core::units::kelvin_to_celsius;
use crate::errors::{invalid_parameter, FeedinError};
use crate::weather::{WeatherSeries, AIR_TEMPERATURE, DHI, DIRHI, DNI, GHI, WIND_SPEED};

/// Feed-in model for a photovoltaic plant: irradiance on the module plane,
/// a wind-corrected NOCT cell temperature and a linear power-temperature
/// derating, evaluated per series step for a single module.

/// Reference irradiance for the NOCT conditions in W/m2.
const NOCT_IRRADIANCE: f64 = 800.;
/// Ambient temperature of the NOCT conditions in degC.
const NOCT_AMBIENT_TEMPERATURE: f64 = 20.;
/// Irradiance at standard test conditions in W/m2.
const STC_IRRADIANCE: f64 = 1_000.;
/// Cell temperature at standard test conditions in degC.
const STC_CELL_TEMPERATURE: f64 = 25.;

pub struct PvModel {
    plant: PhotovoltaicPlant,
    module: PvModuleRecord,
    inverter_efficiency: f64,
}

impl PvModel {
    pub fn new(plant: PhotovoltaicPlant, library: &ParameterLibrary) -> Result<Self, FeedinError> {
        plant.validate()?;
        let module = library.module(&plant.module_name)?.clone();
        let inverter_efficiency = match &plant.inverter_name {
            Some(name) => library.inverter(name)?.efficiency,
            None => 1.,
        };
        Ok(Self {
            plant,
            module,
            inverter_efficiency,
        })
    }

    /// Cell temperature from the NOCT conditions, corrected for wind cooling.
    fn cell_temperature(&self, air_temperature: f64, poa_total: f64, wind_speed: f64) -> f64 {
        kelvin_to_celsius(air_temperature)
            + (self.module.noct - NOCT_AMBIENT_TEMPERATURE)
                * (poa_total / NOCT_IRRADIANCE)
                * (9.5 / (5.7 + 3.8 * wind_speed))
    }

    /// Power of one module in W, derated linearly with cell temperature above
    /// the standard test conditions and reduced by the system and inverter
    /// efficiencies. Never negative.
    fn module_power(&self, poa_total: f64, cell_temperature: f64) -> f64 {
        (self.module.peak_power
            * (poa_total / STC_IRRADIANCE)
            * (1. - self.module.temperature_coefficient
                * (cell_temperature - STC_CELL_TEMPERATURE))
            * self.module.system_efficiency
            * self.inverter_efficiency)
            .max(0.)
    }

    /// The direct horizontal irradiance for each row, taken from the best
    /// available source: DNI projected onto the horizontal, a direct
    /// horizontal column, or the difference of global and diffuse.
    fn direct_horizontal<'a>(
        &self,
        weather: &'a WeatherSeries,
    ) -> Result<DirectHorizontalSource<'a>, FeedinError> {
        if let Some(dni) = weather.column(DNI) {
            return Ok(DirectHorizontalSource::Normal(dni));
        }
        if let Some(dirhi) = weather.column(DIRHI) {
            return Ok(DirectHorizontalSource::Horizontal(dirhi));
        }
        if let Some(ghi) = weather.column(GHI) {
            let dhi = weather
                .column(DHI)
                .expect("diffuse column presence is checked before decomposition");
            if ghi.iter().zip(dhi).any(|(ghi, dhi)| ghi < dhi) {
                return Err(FeedinError::InvalidWeather(
                    "global horizontal irradiance is smaller than its diffuse part".into(),
                ));
            }
            return Ok(DirectHorizontalSource::GlobalMinusDiffuse(ghi, dhi));
        }
        Err(FeedinError::MissingColumn {
            column: DIRHI,
            model: self.name(),
        })
    }
}

enum DirectHorizontalSource<'a> {
    Normal(&'a [f64]),
    Horizontal(&'a [f64]),
    GlobalMinusDiffuse(&'a [f64], &'a [f64]),
}

impl DirectHorizontalSource<'_> {
    fn at(&self, row: usize, zenith: f64) -> f64 {
        match self {
            Self::Normal(dni) => {
                crate::core::solar::direct_horizontal_irradiance(dni[row], zenith)
            }
            Self::Horizontal(dirhi) => dirhi[row],
            Self::GlobalMinusDiffuse(ghi, dhi) => ghi[row] - dhi[row],
        }
    }
}

impl FeedinModel for PvModel {
    fn name(&self) -> &'static str {
        "photovoltaic"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[DHI, AIR_TEMPERATURE, WIND_SPEED]
    }

    fn feedin(&self, weather: &WeatherSeries) -> Result<FeedinSeries, FeedinError> {
        weather.require(self.name(), self.required_columns())?;
        let direct = self.direct_horizontal(weather)?;
        let dhi = weather.column(DHI).expect("checked by require");
        let air_temperature = weather.column(AIR_TEMPERATURE).expect("checked by require");
        let wind_speed = weather.column(WIND_SPEED).expect("checked by require");

        // validated by the caller before the model is built
        let latitude = self.plant.latitude.unwrap_or_default();
        let longitude = self.plant.longitude.unwrap_or_default();
        let step = weather.resolution();

        let values = weather
            .timestamps()
            .iter()
            .enumerate()
            .map(|(row, timestamp)| {
                let position = averaged_solar_position(*timestamp, step, latitude, longitude);
                let poa = plane_of_array_irradiance(
                    &position,
                    self.plant.tilt,
                    self.plant.azimuth,
                    latitude,
                    dhi[row],
                    direct.at(row, position.zenith),
                    self.plant.albedo,
                );
                let cell_temperature =
                    self.cell_temperature(air_temperature[row], poa.total, wind_speed[row]);
                self.module_power(poa.total, cell_temperature)
            })
            .collect();

        Ok(FeedinSeries::new(weather.timestamps().to_vec(), values))
    }

    fn scale_factor(&self, scaling: &Scaling) -> Result<f64, FeedinError> {
        match scaling {
            Scaling::Number(number) => Ok(*number),
            Scaling::PeakPower(peak_power) => Ok(peak_power / self.module.peak_power),
            Scaling::Area(area) => Ok(area / self.module.area),
            Scaling::Capacity(_) => Err(invalid_parameter(
                "scaling",
                "capacity scaling is only defined for wind plants",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{FixedOffset, TimeZone};
    use rstest::*;

    fn plant() -> PhotovoltaicPlant {
        PhotovoltaicPlant {
            module_name: "Aleo S19 285".into(),
            inverter_name: None,
            azimuth: 0.,
            tilt: 30.,
            albedo: 0.2,
            latitude: Some(52.5),
            longitude: Some(13.4),
        }
    }

    #[fixture]
    fn model() -> PvModel {
        PvModel::new(plant(), &ParameterLibrary::bundled().unwrap()).unwrap()
    }

    fn weather_row(hour: u32, dhi: f64, dirhi: f64) -> WeatherSeries {
        let offset = FixedOffset::east_opt(0).unwrap();
        WeatherSeries::builder()
            .timestamps(vec![offset
                .with_ymd_and_hms(2020, 6, 1, hour, 0, 0)
                .unwrap()])
            .column(DHI, vec![dhi])
            .column(DIRHI, vec![dirhi])
            .column(AIR_TEMPERATURE, vec![293.15])
            .column(WIND_SPEED, vec![3.])
            .build()
            .unwrap()
    }

    #[rstest]
    fn produces_nothing_at_night(model: PvModel) {
        let feedin = model.feedin(&weather_row(0, 0., 0.)).unwrap();
        assert_eq!(feedin.values(), &[0.]);
    }

    #[rstest]
    fn produces_power_around_summer_noon(model: PvModel) {
        let feedin = model.feedin(&weather_row(11, 100., 500.)).unwrap();
        let power = feedin.values()[0];
        assert!(power > 50., "implausibly low feed-in {power}");
        assert!(
            power < model.module.peak_power,
            "feed-in {power} exceeds the module's peak power"
        );
    }

    #[rstest]
    fn higher_cell_temperature_lowers_the_output(model: PvModel) {
        let cool = model.module_power(800., 25.);
        let hot = model.module_power(800., 55.);
        assert!(hot < cool);
    }

    #[rstest]
    fn wind_cools_the_cell(model: PvModel) {
        let calm = model.cell_temperature(293.15, 800., 0.);
        let breezy = model.cell_temperature(293.15, 800., 10.);
        assert!(breezy < calm);
    }

    #[rstest]
    fn number_scaling_multiplies_exactly(model: PvModel) {
        let weather = weather_row(11, 100., 500.);
        let single = model.feedin(&weather).unwrap();
        let doubled = model
            .feedin_scaled(&weather, Some(&Scaling::Number(2.)))
            .unwrap();
        assert_eq!(doubled.values()[0], single.values()[0] * 2.);
    }

    #[rstest]
    fn peak_power_scaling_is_relative_to_the_module(model: PvModel) {
        let factor = model
            .scale_factor(&Scaling::PeakPower(2. * model.module.peak_power))
            .unwrap();
        assert_relative_eq!(factor, 2.);
    }

    #[rstest]
    fn capacity_scaling_is_rejected(model: PvModel) {
        assert!(model.scale_factor(&Scaling::Capacity(1e6)).is_err());
    }

    #[rstest]
    fn global_smaller_than_diffuse_is_rejected(model: PvModel) {
        let offset = FixedOffset::east_opt(0).unwrap();
        let weather = WeatherSeries::builder()
            .timestamps(vec![offset.with_ymd_and_hms(2020, 6, 1, 11, 0, 0).unwrap()])
            .column(DHI, vec![200.])
            .column(GHI, vec![150.])
            .column(AIR_TEMPERATURE, vec![293.15])
            .column(WIND_SPEED, vec![3.])
            .build()
            .unwrap();
        let err = model.feedin(&weather).unwrap_err();
        assert!(err.to_string().contains("diffuse"));
    }

    #[test]
    fn invalid_latitude_fails_model_construction() {
        let plant = PhotovoltaicPlant {
            latitude: Some(95.),
            ..plant()
        };
        assert!(PvModel::new(plant, &ParameterLibrary::bundled().unwrap()).is_err());
    }

    #[rstest]
    fn named_inverter_derates_the_output(model: PvModel) {
        let plant = PhotovoltaicPlant {
            inverter_name: Some("SMA Sunny Boy 240".into()),
            ..plant()
        };
        let with_inverter =
            PvModel::new(plant, &ParameterLibrary::bundled().unwrap()).unwrap();
        assert_relative_eq!(
            with_inverter.module_power(800., 25.),
            model.module_power(800., 25.) * 0.95
        );
    }

    #[test]
    fn unknown_inverter_fails_model_construction() {
        let plant = PhotovoltaicPlant {
            inverter_name: Some("No Such Inverter".into()),
            ..plant()
        };
        assert!(PvModel::new(plant, &ParameterLibrary::bundled().unwrap()).is_err());
    }

    #[test]
    fn unknown_module_fails_model_construction() {
        let plant = PhotovoltaicPlant {
            module_name: "No Such Module".into(),
            ..plant()
        };
        assert!(PvModel::new(plant, &ParameterLibrary::bundled().unwrap()).is_err());
    }
}
