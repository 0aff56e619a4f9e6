//! Read-only recipe lookups consumed by the resolver

use std::collections::BTreeMap;

use crate::error::{CalcError, Result};
use crate::models::{Building, BuildingId, Ingredient, Item, ItemId, Recipe, RecipeId};

/// The three queries the resolver needs from whatever stores the recipe data.
pub trait RecipeProvider {
    fn get_recipe(&self, recipe_id: RecipeId) -> Result<Recipe>;

    fn get_item(&self, item_id: ItemId) -> Result<Item>;

    /// Recipes listing `item_id` among their outputs, in a stable order.
    /// An empty list marks the item as a raw material.
    fn get_recipes_for_item(&self, item_id: ItemId) -> Result<Vec<Recipe>>;
}

impl<P: RecipeProvider + ?Sized> RecipeProvider for &P {
    fn get_recipe(&self, recipe_id: RecipeId) -> Result<Recipe> {
        (**self).get_recipe(recipe_id)
    }

    fn get_item(&self, item_id: ItemId) -> Result<Item> {
        (**self).get_item(item_id)
    }

    fn get_recipes_for_item(&self, item_id: ItemId) -> Result<Vec<Recipe>> {
        (**self).get_recipes_for_item(item_id)
    }
}

/// In-memory recipe data. Recipes are returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    items: BTreeMap<ItemId, Item>,
    buildings: BTreeMap<BuildingId, Building>,
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item and return its id
    pub fn add_item(&mut self, name: &str) -> ItemId {
        let id = self.items.len() as ItemId + 1;
        self.items.insert(
            id,
            Item {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_building(&mut self, name: &str) -> BuildingId {
        let id = self.buildings.len() as BuildingId + 1;
        self.buildings.insert(
            id,
            Building {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    /// Register a recipe from `(item, quantity)` pairs.
    ///
    /// Panics if an item or the building was never registered, since that is a
    /// bug in whoever is assembling the book.
    pub fn add_recipe(
        &mut self,
        name: &str,
        crafting_time: f64,
        building: BuildingId,
        inputs: &[(ItemId, u32)],
        outputs: &[(ItemId, u32)],
    ) -> RecipeId {
        assert!(crafting_time > 0.0, "crafting time must be positive");

        let id = self.recipes.len() as RecipeId + 1;
        let building = self.buildings[&building].clone();

        let line = |(item, quantity): &(ItemId, u32), is_output: bool| Ingredient {
            item: self.items[item].clone(),
            quantity: *quantity,
            is_output,
        };
        let ingredients = inputs
            .iter()
            .map(|i| line(i, false))
            .chain(outputs.iter().map(|o| line(o, true)))
            .collect();

        self.recipes.push(Recipe {
            id,
            name: name.to_string(),
            crafting_time,
            building,
            ingredients,
        });
        id
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    #[cfg(test)]
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        self.items.values().find(|i| i.name == name)
    }
}

impl RecipeProvider for RecipeBook {
    fn get_recipe(&self, recipe_id: RecipeId) -> Result<Recipe> {
        self.recipes
            .iter()
            .find(|r| r.id == recipe_id)
            .cloned()
            .ok_or(CalcError::recipe_not_found(recipe_id))
    }

    fn get_item(&self, item_id: ItemId) -> Result<Item> {
        self.items
            .get(&item_id)
            .cloned()
            .ok_or(CalcError::item_not_found(item_id))
    }

    fn get_recipes_for_item(&self, item_id: ItemId) -> Result<Vec<Recipe>> {
        Ok(self
            .recipes
            .iter()
            .filter(|r| r.produces(item_id))
            .cloned()
            .collect())
    }
}
