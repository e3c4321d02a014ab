use crate::core::parameters::{ParameterLibrary, WindTurbineRecord};
use crate::core::power_plant::{FeedinModel, FeedinSeries, Scaling, WindPlant};
use crate::core::units::{
    rotor_area, GAS_CONSTANT_DRY_AIR, PRESSURE_GRADIENT, TEMPERATURE_GRADIENT,
};
use crate::errors::{invalid_parameter, FeedinError};
use crate::weather::{WeatherSeries, AIR_TEMPERATURE, PRESSURE, ROUGHNESS_LENGTH, WIND_SPEED};

/// Feed-in model for a wind power plant. Measurements taken near the ground
/// are extrapolated to hub height (logarithmic wind profile, linear
/// temperature and pressure gradients), the air density at the hub follows
/// from the ideal gas law, and the electrical power from the swept rotor
/// area and the turbine's power coefficient curve.

/// Wind speed at hub height from a measurement at `measurement_height`,
/// assuming a logarithmic wind profile over terrain with roughness length
/// `roughness_length`.
pub fn wind_speed_at_hub(
    wind_speed: f64,
    measurement_height: f64,
    hub_height: f64,
    roughness_length: f64,
) -> Result<f64, FeedinError> {
    if roughness_length <= 0. {
        return Err(invalid_parameter(
            "roughness_length",
            format!("{roughness_length} is not positive"),
        ));
    }
    if measurement_height <= roughness_length {
        return Err(invalid_parameter(
            "measurement_height",
            format!("{measurement_height} m does not exceed the roughness length"),
        ));
    }
    Ok(wind_speed * (hub_height / roughness_length).ln()
        / (measurement_height / roughness_length).ln())
}

/// Air temperature at hub height in K, via the linear lapse rate of the lower
/// atmosphere.
pub fn temperature_at_hub(temperature: f64, measurement_height: f64, hub_height: f64) -> f64 {
    temperature + TEMPERATURE_GRADIENT * (hub_height - measurement_height)
}

/// Air pressure at hub height in Pa, using the barometric drop of roughly
/// one hectopascal per eight metres.
pub fn pressure_at_hub(pressure: f64, measurement_height: f64, hub_height: f64) -> f64 {
    pressure + PRESSURE_GRADIENT * (hub_height - measurement_height)
}

/// Density of dry air in kg/m3 from the ideal gas law.
pub fn air_density(pressure: f64, temperature: f64) -> f64 {
    pressure / (GAS_CONSTANT_DRY_AIR * temperature)
}

/// Electrical power in W extracted from the wind by a rotor of diameter
/// `rotor_diameter` at the given power coefficient.
pub fn turbine_power(
    air_density: f64,
    rotor_diameter: f64,
    wind_speed: f64,
    power_coefficient: f64,
) -> f64 {
    0.5 * air_density * rotor_area(rotor_diameter) * wind_speed.powi(3) * power_coefficient
}

pub struct WindModel {
    plant: WindPlant,
    turbine: WindTurbineRecord,
    rotor_diameter: f64,
}

impl WindModel {
    pub fn new(plant: WindPlant, library: &ParameterLibrary) -> Result<Self, FeedinError> {
        plant.validate()?;
        let turbine = library.turbine(&plant.turbine_type)?.clone();
        let rotor_diameter = plant.rotor_diameter.unwrap_or(turbine.rotor_diameter);
        Ok(Self {
            plant,
            turbine,
            rotor_diameter,
        })
    }
}

impl FeedinModel for WindModel {
    fn name(&self) -> &'static str {
        "windpower"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[WIND_SPEED, AIR_TEMPERATURE, PRESSURE, ROUGHNESS_LENGTH]
    }

    fn feedin(&self, weather: &WeatherSeries) -> Result<FeedinSeries, FeedinError> {
        weather.require(self.name(), self.required_columns())?;
        let wind_speed = weather.column(WIND_SPEED).expect("checked by require");
        let temperature = weather.column(AIR_TEMPERATURE).expect("checked by require");
        let pressure = weather.column(PRESSURE).expect("checked by require");
        let roughness_length = weather
            .column(ROUGHNESS_LENGTH)
            .expect("checked by require");

        let wind_height = weather.height_of(WIND_SPEED).unwrap_or_default();
        let temperature_height = weather.height_of(AIR_TEMPERATURE).unwrap_or_default();
        let pressure_height = weather.height_of(PRESSURE).unwrap_or_default();
        let hub_height = self.plant.hub_height;

        let values = (0..weather.len())
            .map(|row| {
                let hub_wind_speed = wind_speed_at_hub(
                    wind_speed[row],
                    wind_height,
                    hub_height,
                    roughness_length[row],
                )?;
                let hub_temperature =
                    temperature_at_hub(temperature[row], temperature_height, hub_height);
                let hub_pressure = pressure_at_hub(pressure[row], pressure_height, hub_height);
                let density = air_density(hub_pressure, hub_temperature);
                Ok(turbine_power(
                    density,
                    self.rotor_diameter,
                    hub_wind_speed,
                    self.turbine.power_coefficient(hub_wind_speed),
                ))
            })
            .collect::<Result<Vec<_>, FeedinError>>()?;

        Ok(FeedinSeries::new(weather.timestamps().to_vec(), values))
    }

    fn scale_factor(&self, scaling: &Scaling) -> Result<f64, FeedinError> {
        match scaling {
            Scaling::Number(number) => Ok(*number),
            Scaling::Capacity(capacity) => Ok(capacity / self.turbine.nominal_power),
            Scaling::PeakPower(_) | Scaling::Area(_) => Err(invalid_parameter(
                "scaling",
                "peak power and area scaling are only defined for PV plants",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::{STANDARD_PRESSURE, STANDARD_TEMPERATURE};
    use approx::assert_relative_eq;
    use chrono::{FixedOffset, TimeZone};
    use rstest::*;

    #[fixture]
    fn model() -> WindModel {
        WindModel::new(
            WindPlant {
                turbine_type: "V90/2000".into(),
                hub_height: 105.,
                rotor_diameter: None,
            },
            &ParameterLibrary::bundled().unwrap(),
        )
        .unwrap()
    }

    fn weather_row(wind_speed: f64) -> WeatherSeries {
        let offset = FixedOffset::east_opt(0).unwrap();
        WeatherSeries::builder()
            .timestamps(vec![offset
                .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
                .unwrap()])
            .column(WIND_SPEED, vec![wind_speed])
            .height(WIND_SPEED, 10.)
            .column(AIR_TEMPERATURE, vec![275.])
            .height(AIR_TEMPERATURE, 2.)
            .column(PRESSURE, vec![STANDARD_PRESSURE])
            .column(ROUGHNESS_LENGTH, vec![0.15])
            .build()
            .unwrap()
    }

    #[test]
    fn logarithmic_profile_matches_the_closed_form() {
        let hub = wind_speed_at_hub(5., 10., 50., 0.1).unwrap();
        assert_eq!(hub, 5. * (50f64 / 0.1).ln() / (10f64 / 0.1).ln());
        assert_relative_eq!(hub, 6.74, epsilon = 0.01);
    }

    #[test]
    fn wind_speed_grows_with_hub_height() {
        let mut previous = 0.;
        for hub_height in [20., 50., 80., 110.] {
            let speed = wind_speed_at_hub(5., 10., hub_height, 0.1).unwrap();
            assert!(speed > previous);
            previous = speed;
        }
    }

    #[rstest]
    #[case(0.)]
    #[case(-0.1)]
    fn non_positive_roughness_length_is_rejected(#[case] roughness_length: f64) {
        assert!(wind_speed_at_hub(5., 10., 50., roughness_length).is_err());
    }

    #[test]
    fn temperature_drops_with_the_lapse_rate() {
        assert_relative_eq!(temperature_at_hub(288.15, 2., 102.), 287.5);
    }

    #[test]
    fn standard_atmosphere_density_is_reproduced() {
        assert_relative_eq!(
            air_density(STANDARD_PRESSURE, STANDARD_TEMPERATURE),
            1.225,
            epsilon = 1e-3
        );
    }

    #[rstest]
    fn feedin_composes_the_helper_functions(model: WindModel) {
        let weather = weather_row(8.);
        let feedin = model.feedin(&weather).unwrap();

        let hub_speed = wind_speed_at_hub(8., 10., 105., 0.15).unwrap();
        let density = air_density(
            pressure_at_hub(STANDARD_PRESSURE, 0., 105.),
            temperature_at_hub(275., 2., 105.),
        );
        let expected = turbine_power(
            density,
            90.,
            hub_speed,
            model.turbine.power_coefficient(hub_speed),
        );
        assert_relative_eq!(feedin.values()[0], expected);
    }

    #[rstest]
    fn calm_air_produces_nothing(model: WindModel) {
        // below the cut-in speed the power coefficient is zero
        let feedin = model.feedin(&weather_row(0.5)).unwrap();
        assert_eq!(feedin.values()[0], 0.);
    }

    #[rstest]
    fn number_scaling_multiplies_exactly(model: WindModel) {
        let weather = weather_row(8.);
        let single = model.feedin(&weather).unwrap();
        let tripled = model
            .feedin_scaled(&weather, Some(&Scaling::Number(3.)))
            .unwrap();
        assert_eq!(tripled.values()[0], single.values()[0] * 3.);
    }

    #[rstest]
    fn capacity_scaling_is_relative_to_nominal_power(model: WindModel) {
        let factor = model.scale_factor(&Scaling::Capacity(6_000_000.)).unwrap();
        assert_relative_eq!(factor, 3.);
    }

    #[rstest]
    fn area_scaling_is_rejected(model: WindModel) {
        assert!(model.scale_factor(&Scaling::Area(100.)).is_err());
    }

    #[rstest]
    fn plant_rotor_diameter_overrides_the_record(model: WindModel) {
        let custom = WindModel::new(
            WindPlant {
                turbine_type: "V90/2000".into(),
                hub_height: 105.,
                rotor_diameter: Some(80.),
            },
            &ParameterLibrary::bundled().unwrap(),
        )
        .unwrap();
        assert_relative_eq!(custom.rotor_diameter, 80.);
        assert_relative_eq!(model.rotor_diameter, 90.);
    }
}
