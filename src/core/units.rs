use std::f64::consts::PI;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const DAYS_PER_YEAR: u32 = 365;

/// Solar constant in W/m2.
pub const SOLAR_CONSTANT: f64 = 1_367.;

/// Specific gas constant of dry air in J/(kg*K).
pub const GAS_CONSTANT_DRY_AIR: f64 = 287.058;

/// Temperature gradient of the lower atmosphere in K/m (adiabatic lapse rate).
pub const TEMPERATURE_GRADIENT: f64 = -0.0065;

/// Pressure drop of the lower atmosphere in Pa/m (1 hPa per 8 m).
pub const PRESSURE_GRADIENT: f64 = -100. / 8.;

pub const STANDARD_PRESSURE: f64 = 101_325.;
pub const STANDARD_TEMPERATURE: f64 = 288.15;

pub(crate) fn kelvin_to_celsius(temp_k: f64) -> f64 {
    temp_k - 273.15
}

/// Swept rotor area in m2 for a rotor diameter in m.
pub(crate) fn rotor_area(rotor_diameter: f64) -> f64 {
    PI / 4. * rotor_diameter.powi(2)
}
