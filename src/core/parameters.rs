use crate::errors::FeedinError;
use indexmap::IndexMap;
use interp::{interp, InterpMode};
use itertools::Itertools;
use serde::Deserialize;
use std::io::Read;

/// This module contains the static reference tables with technical parameters
/// of PV modules and wind turbines, including the turbines' power coefficient
/// curves. Tables are loaded once from CSV and are read-only afterwards;
/// records are looked up by name.

/// Technical parameters of a PV module as used by the performance model.
#[derive(Clone, Debug, Deserialize)]
pub struct PvModuleRecord {
    pub name: String,
    /// Peak power at standard test conditions in W.
    pub peak_power: f64,
    /// Module area in m2.
    pub area: f64,
    /// Relative power loss per K of cell temperature above 25 degC.
    pub temperature_coefficient: f64,
    /// Nominal operating cell temperature in degC.
    pub noct: f64,
    /// Overall system efficiency (inverter and balance of system).
    pub system_efficiency: f64,
}

/// Technical parameters of an inverter.
#[derive(Clone, Debug, Deserialize)]
pub struct InverterRecord {
    pub name: String,
    /// Conversion efficiency at nominal load.
    pub efficiency: f64,
}

/// Technical parameters of a wind turbine, including its cp-curve.
#[derive(Clone, Debug)]
pub struct WindTurbineRecord {
    pub name: String,
    /// Nominal power in W.
    pub nominal_power: f64,
    /// Rotor diameter in m.
    pub rotor_diameter: f64,
    cp_wind_speeds: Vec<f64>,
    cp_values: Vec<f64>,
}

impl WindTurbineRecord {
    /// Power coefficient at the given wind speed, linearly interpolated
    /// between the tabulated nodes. Below cut-in and above cut-out (outside
    /// the tabulated range) the turbine produces nothing.
    pub fn power_coefficient(&self, wind_speed: f64) -> f64 {
        let (first, last) = (
            self.cp_wind_speeds[0],
            self.cp_wind_speeds[self.cp_wind_speeds.len() - 1],
        );
        if wind_speed < first || wind_speed > last {
            return 0.;
        }
        // the tabulated value itself at a node; interpolation arithmetic only
        // strictly between nodes
        if let Some(index) = self
            .cp_wind_speeds
            .iter()
            .position(|&node| node == wind_speed)
        {
            return self.cp_values[index];
        }
        interp(
            &self.cp_wind_speeds,
            &self.cp_values,
            wind_speed,
            &InterpMode::default(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct WindTurbineRow {
    name: String,
    nominal_power: f64,
    rotor_diameter: f64,
    cp_curve: String,
}

impl TryFrom<WindTurbineRow> for WindTurbineRecord {
    type Error = anyhow::Error;

    fn try_from(row: WindTurbineRow) -> anyhow::Result<Self> {
        let nodes = row
            .cp_curve
            .split(';')
            .map(|node| {
                node.split(':')
                    .map(str::trim)
                    .collect_tuple()
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "malformed cp-curve node '{node}' for turbine '{}'",
                            row.name
                        )
                    })
                    .and_then(|(speed, cp)| Ok((speed.parse::<f64>()?, cp.parse::<f64>()?)))
            })
            .collect::<anyhow::Result<Vec<(f64, f64)>>>()?;
        let (cp_wind_speeds, cp_values): (Vec<f64>, Vec<f64>) = nodes.into_iter().unzip();
        if cp_wind_speeds.windows(2).any(|pair| pair[0] >= pair[1]) {
            anyhow::bail!(
                "cp-curve wind speeds must be strictly increasing for turbine '{}'",
                row.name
            );
        }
        if cp_wind_speeds.is_empty() {
            anyhow::bail!("empty cp-curve for turbine '{}'", row.name);
        }

        Ok(Self {
            name: row.name,
            nominal_power: row.nominal_power,
            rotor_diameter: row.rotor_diameter,
            cp_wind_speeds,
            cp_values,
        })
    }
}

/// The parameter library holding all reference tables.
#[derive(Clone, Debug)]
pub struct ParameterLibrary {
    modules: IndexMap<String, PvModuleRecord>,
    inverters: IndexMap<String, InverterRecord>,
    turbines: IndexMap<String, WindTurbineRecord>,
}

impl ParameterLibrary {
    /// The compact module/inverter/turbine tables shipped with the crate.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_readers(
            include_str!("../../data/pv_modules.csv").as_bytes(),
            include_str!("../../data/inverters.csv").as_bytes(),
            include_str!("../../data/wind_turbines.csv").as_bytes(),
        )
    }

    /// Loads module, inverter and turbine tables from CSV sources using the
    /// same format as the bundled data.
    pub fn from_readers(
        modules: impl Read,
        inverters: impl Read,
        turbines: impl Read,
    ) -> anyhow::Result<Self> {
        let modules = csv::Reader::from_reader(modules)
            .deserialize::<PvModuleRecord>()
            .map_ok(|record| (record.name.clone(), record))
            .collect::<Result<IndexMap<_, _>, _>>()?;
        let inverters = csv::Reader::from_reader(inverters)
            .deserialize::<InverterRecord>()
            .map_ok(|record| (record.name.clone(), record))
            .collect::<Result<IndexMap<_, _>, _>>()?;
        let turbines = csv::Reader::from_reader(turbines)
            .deserialize::<WindTurbineRow>()
            .map(|row| {
                let record: WindTurbineRecord = row?.try_into()?;
                Ok((record.name.clone(), record))
            })
            .collect::<anyhow::Result<IndexMap<_, _>>>()?;

        Ok(Self {
            modules,
            inverters,
            turbines,
        })
    }

    pub fn module(&self, name: &str) -> Result<&PvModuleRecord, FeedinError> {
        self.modules.get(name).ok_or_else(|| FeedinError::UnknownRecord {
            key: name.to_string(),
            table: "PV module",
        })
    }

    pub fn inverter(&self, name: &str) -> Result<&InverterRecord, FeedinError> {
        self.inverters
            .get(name)
            .ok_or_else(|| FeedinError::UnknownRecord {
                key: name.to_string(),
                table: "inverter",
            })
    }

    pub fn turbine(&self, name: &str) -> Result<&WindTurbineRecord, FeedinError> {
        self.turbines
            .get(name)
            .ok_or_else(|| FeedinError::UnknownRecord {
                key: name.to_string(),
                table: "wind turbine",
            })
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn turbine_names(&self) -> impl Iterator<Item = &str> {
        self.turbines.keys().map(String::as_str)
    }
}
