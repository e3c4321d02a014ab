use crate::core::power_plant::{PhotovoltaicPlant, Scaling, WindPlant};
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;

/// JSON run description: one plant plus an optional scaling.

#[derive(Clone, Debug, Deserialize)]
pub struct RunInput {
    pub plant: PlantInput,
    #[serde(default)]
    pub scaling: Option<Scaling>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlantInput {
    Photovoltaic(PhotovoltaicPlant),
    Wind(WindPlant),
}

pub fn ingest(source: impl Read) -> anyhow::Result<RunInput> {
    serde_json::from_reader(source).context("could not parse the run input")
}
