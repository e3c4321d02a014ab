use crate::errors::{invalid_parameter, FeedinError};
use crate::weather::WeatherSeries;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// This module contains the plant descriptors shared by all feed-in models
/// and the trait through which the models are driven. A descriptor carries
/// the plant-specific parameters (location, geometry, the name of a record in
/// the parameter library); the model built from it turns a weather series
/// into a feed-in series.

/// An electrical feed-in time series in W, aligned with the weather series it
/// was computed from.
#[derive(Clone, Debug)]
pub struct FeedinSeries {
    timestamps: Vec<DateTime<FixedOffset>>,
    values: Vec<f64>,
}

impl FeedinSeries {
    pub fn new(timestamps: Vec<DateTime<FixedOffset>>, values: Vec<f64>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self { timestamps, values }
    }

    pub fn timestamps(&self) -> &[DateTime<FixedOffset>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The same series with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().map(|value| value * factor).collect(),
        }
    }
}

/// How a single-unit feed-in series is scaled up to plant size.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Plain multiplier, e.g. the number of modules or turbines.
    Number(f64),
    /// Installed peak power in W; valid for PV plants only.
    PeakPower(f64),
    /// Installed module area in m2; valid for PV plants only.
    Area(f64),
    /// Installed capacity in W; valid for wind plants only.
    Capacity(f64),
}

/// Descriptor of a photovoltaic plant.
#[derive(Clone, Debug, Deserialize)]
pub struct PhotovoltaicPlant {
    /// Name of a module record in the parameter library.
    pub module_name: String,
    /// Name of an inverter record in the parameter library; when absent the
    /// module's system efficiency alone applies.
    #[serde(default)]
    pub inverter_name: Option<String>,
    /// Surface azimuth in degrees: 0 south, 90 east, -90 west.
    pub azimuth: f64,
    /// Surface tilt from horizontal in degrees.
    pub tilt: f64,
    /// Ground reflectance for the reflected irradiance component.
    #[serde(default = "default_albedo")]
    pub albedo: f64,
    /// Latitude in degrees; may be omitted when the weather source carries it.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees; may be omitted when the weather source carries it.
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_albedo() -> f64 {
    0.2
}

impl PhotovoltaicPlant {
    pub fn validate(&self) -> Result<(), FeedinError> {
        let latitude = self
            .latitude
            .ok_or_else(|| invalid_parameter("latitude", "no latitude given for the PV plant"))?;
        let longitude = self
            .longitude
            .ok_or_else(|| invalid_parameter("longitude", "no longitude given for the PV plant"))?;
        if !(-90. ..=90.).contains(&latitude) {
            return Err(invalid_parameter(
                "latitude",
                format!("{latitude} is outside [-90, 90]"),
            ));
        }
        if !(-180. ..=180.).contains(&longitude) {
            return Err(invalid_parameter(
                "longitude",
                format!("{longitude} is outside [-180, 180]"),
            ));
        }
        if !(0. ..=90.).contains(&self.tilt) {
            return Err(invalid_parameter(
                "tilt",
                format!("{} is outside [0, 90]", self.tilt),
            ));
        }
        if !(-180. ..=180.).contains(&self.azimuth) {
            return Err(invalid_parameter(
                "azimuth",
                format!("{} is outside [-180, 180]", self.azimuth),
            ));
        }
        if !(0. ..=1.).contains(&self.albedo) {
            return Err(invalid_parameter(
                "albedo",
                format!("{} is outside [0, 1]", self.albedo),
            ));
        }
        Ok(())
    }
}

/// Descriptor of a wind power plant.
#[derive(Clone, Debug, Deserialize)]
pub struct WindPlant {
    /// Name of a turbine record in the parameter library.
    pub turbine_type: String,
    /// Hub height in metres above ground.
    pub hub_height: f64,
    /// Rotor diameter in metres; defaults to the library record's value.
    #[serde(default)]
    pub rotor_diameter: Option<f64>,
}

impl WindPlant {
    pub fn validate(&self) -> Result<(), FeedinError> {
        if self.hub_height <= 0. {
            return Err(invalid_parameter(
                "hub_height",
                format!("{} is not positive", self.hub_height),
            ));
        }
        if let Some(rotor_diameter) = self.rotor_diameter {
            if rotor_diameter <= 0. {
                return Err(invalid_parameter(
                    "rotor_diameter",
                    format!("{rotor_diameter} is not positive"),
                ));
            }
        }
        Ok(())
    }
}

/// A model that converts weather into electrical feed-in.
pub trait FeedinModel {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// The canonical weather columns this model reads.
    fn required_columns(&self) -> &'static [&'static str];

    /// Feed-in of a single unit (one module, one turbine) in W.
    fn feedin(&self, weather: &WeatherSeries) -> Result<FeedinSeries, FeedinError>;

    /// Factor turning the single-unit series into the plant series.
    fn scale_factor(&self, scaling: &Scaling) -> Result<f64, FeedinError>;

    /// Feed-in of the whole plant, applying the scaling if one is given.
    fn feedin_scaled(
        &self,
        weather: &WeatherSeries,
        scaling: Option<&Scaling>,
    ) -> Result<FeedinSeries, FeedinError> {
        let series = self.feedin(weather)?;
        match scaling {
            Some(scaling) => Ok(series.scaled(self.scale_factor(scaling)?)),
            None => Ok(series),
        }
    }
}
