use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::assets::manifest::Asset;
use crate::assets::registry::AssetCatalog;
use crate::cutscene::Actors;
use crate::puppet::PuppetTemplate;
use crate::stage::{Stage, StageConfig};

/// A saved project: stage settings, named puppets and the asset catalog they draw from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub environment: StageConfig,
    pub actors: HashMap<String, PuppetTemplate>,
    pub assets: HashMap<String, Asset>,
}

impl Project {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn catalog(&self) -> AssetCatalog {
        AssetCatalog::from_assets(self.assets.clone())
    }

    /// Actor table for cutscenes.
    pub fn actors(&self) -> Rc<Actors> {
        Rc::new(self.actors.clone())
    }

    /// Build a stage for this project's environment, with no puppets on it yet.
    pub fn into_stage(self) -> Stage {
        let catalog = AssetCatalog::from_assets(self.assets);
        log::info!(
            "loading project: {} assets, {} actors",
            catalog.len(),
            self.actors.len()
        );
        Stage::new(self.environment, catalog)
    }
}
