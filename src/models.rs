//! Data models for recipes, items and computed production chains

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ItemId = i64;
pub type BuildingId = i64;
pub type RecipeId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
}

/// One line of a recipe: an item consumed or produced per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: Item,
    pub quantity: u32,
    pub is_output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub crafting_time: f64, // seconds per cycle, always > 0
    pub building: Building,
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn inputs(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| !i.is_output)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| i.is_output)
    }

    pub fn produces(&self, item_id: ItemId) -> bool {
        self.outputs().any(|i| i.item.id == item_id)
    }

    pub fn cycles_per_minute(&self) -> f64 {
        60.0 / self.crafting_time
    }
}

/// An item flowing at a given rate (units/minute)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub item_id: ItemId,
    pub item_name: String,
    pub rate: f64,
}

/// One recipe scaled to hit a target output rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequirements {
    pub recipe_name: String,
    pub building_name: String,
    /// Fractional buildings are allowed: this is aggregate throughput, not a physical count.
    pub num_buildings: f64,
    pub output: RequirementEntry,
    pub inputs: Vec<RequirementEntry>,
    pub byproducts: Vec<RequirementEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTarget {
    pub item: String,
    pub rate: f64,
    pub recipe: String,
}

/// Terminal node: nothing produces this item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialNode {
    pub item_id: ItemId,
    pub item_name: String,
    pub required_rate: f64,
    pub is_raw_material: bool,
}

impl RawMaterialNode {
    pub fn new(item: Item, required_rate: f64) -> Self {
        Self {
            item_id: item.id,
            item_name: item.name,
            required_rate,
            is_raw_material: true,
        }
    }
}

/// Internal node: a recipe plus the chains feeding each of its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub target: ChainTarget,
    pub requirements: RecipeRequirements,
    pub dependencies: BTreeMap<String, ProductionChainNode>,
    pub raw_materials: BTreeMap<String, f64>,
    pub building_summary: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub byproducts: BTreeMap<String, f64>,
}

/// Result of a production chain calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductionChainNode {
    RawMaterial(RawMaterialNode),
    Step(Box<ChainStep>),
}

impl ProductionChainNode {
    pub fn is_raw_material(&self) -> bool {
        matches!(self, ProductionChainNode::RawMaterial(_))
    }

    pub fn as_step(&self) -> Option<&ChainStep> {
        match self {
            ProductionChainNode::Step(step) => Some(step),
            ProductionChainNode::RawMaterial(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_raw_material(&self) -> Option<&RawMaterialNode> {
        match self {
            ProductionChainNode::RawMaterial(raw) => Some(raw),
            ProductionChainNode::Step(_) => None,
        }
    }
}
