pub mod irradiance;
pub mod parameters;
pub mod power_plant;
pub mod pv;
pub mod solar;
pub mod units;
pub mod wind;
