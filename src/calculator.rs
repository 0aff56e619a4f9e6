//! Production chain calculator logic

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::{CalcError, Result};
use crate::models::{
    ChainStep, ChainTarget, Ingredient, ItemId, ProductionChainNode, RawMaterialNode, Recipe,
    RecipeId, RecipeRequirements, RequirementEntry,
};
use crate::provider::RecipeProvider;

/// Resolves production chains against a recipe provider.
///
/// Holds no mutable state, so one resolver can serve any number of
/// calculations as long as the provider's reads are safe to share.
pub struct Resolver<P> {
    provider: P,
}

impl<P: RecipeProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Scale one recipe so that its `item_id` output runs at `target_rate` per minute.
    ///
    /// If the recipe does not output `item_id` the result has zero buildings
    /// and zero rates; callers should check `Recipe::produces` first.
    pub fn calculate_recipe_requirements(
        &self,
        recipe_id: RecipeId,
        item_id: ItemId,
        target_rate: f64,
    ) -> Result<RecipeRequirements> {
        let recipe = self.provider.get_recipe(recipe_id)?;
        self.scale_recipe(&recipe, item_id, target_rate)
    }

    /// Calculate the full production chain for `item_id` at `target_rate` per minute.
    ///
    /// When several recipes produce an item the first one the provider
    /// returns is used.
    pub fn get_production_chain(
        &self,
        item_id: ItemId,
        target_rate: f64,
    ) -> Result<ProductionChainNode> {
        self.resolve(item_id, target_rate, None, &mut Vec::new())
    }

    /// Like [`Self::get_production_chain`], but the root uses `recipe_id`
    /// instead of the provider's first producer. Inputs still resolve normally.
    pub fn get_production_chain_with_recipe(
        &self,
        recipe_id: RecipeId,
        item_id: ItemId,
        target_rate: f64,
    ) -> Result<ProductionChainNode> {
        let recipe = self.provider.get_recipe(recipe_id)?;
        self.resolve(item_id, target_rate, Some(recipe), &mut Vec::new())
    }

    fn scale_recipe(
        &self,
        recipe: &Recipe,
        item_id: ItemId,
        target_rate: f64,
    ) -> Result<RecipeRequirements> {
        let cycles_per_minute = recipe.cycles_per_minute();
        let target = recipe.outputs().find(|o| o.item.id == item_id);

        let num_buildings = match target {
            Some(output) => target_rate / (cycles_per_minute * f64::from(output.quantity)),
            None => {
                warn!(
                    recipe = %recipe.name,
                    item_id,
                    "recipe does not produce the requested item; scaling to zero"
                );
                0.0
            }
        };

        let entry = |ingredient: &Ingredient| RequirementEntry {
            item_id: ingredient.item.id,
            item_name: ingredient.item.name.clone(),
            rate: cycles_per_minute * f64::from(ingredient.quantity) * num_buildings,
        };

        let mut inputs = Vec::new();
        let mut byproducts = Vec::new();
        for ingredient in &recipe.ingredients {
            if !ingredient.is_output {
                inputs.push(entry(ingredient));
            } else if ingredient.item.id != item_id {
                byproducts.push(entry(ingredient));
            }
        }

        let item_name = match target {
            Some(output) => output.item.name.clone(),
            None => self.provider.get_item(item_id)?.name,
        };

        Ok(RecipeRequirements {
            recipe_name: recipe.name.clone(),
            building_name: recipe.building.name.clone(),
            num_buildings,
            output: RequirementEntry {
                item_id,
                item_name,
                rate: target_rate,
            },
            inputs,
            byproducts,
        })
    }

    /// `path` holds the items currently being resolved above this call.
    fn resolve(
        &self,
        item_id: ItemId,
        rate: f64,
        recipe: Option<Recipe>,
        path: &mut Vec<ItemId>,
    ) -> Result<ProductionChainNode> {
        if path.contains(&item_id) {
            return Err(self.cycle_error(path, item_id));
        }

        let recipe = match recipe {
            Some(recipe) => recipe,
            None => {
                let mut producers = self.provider.get_recipes_for_item(item_id)?.into_iter();
                let Some(recipe) = producers.next() else {
                    let item = self.provider.get_item(item_id)?;
                    debug!(item = %item.name, rate, "raw material");
                    return Ok(ProductionChainNode::RawMaterial(RawMaterialNode::new(
                        item, rate,
                    )));
                };

                let alternatives: Vec<String> = producers.map(|r| r.name).collect();
                if !alternatives.is_empty() {
                    debug!(
                        chosen = %recipe.name,
                        ?alternatives,
                        "several recipes produce item; using the first"
                    );
                }
                recipe
            }
        };

        let requirements = self.scale_recipe(&recipe, item_id, rate)?;
        debug!(
            recipe = %recipe.name,
            building = %recipe.building.name,
            buildings = requirements.num_buildings,
            rate,
            "resolved recipe"
        );

        let mut dependencies = BTreeMap::new();
        let mut raw_materials: BTreeMap<String, f64> = BTreeMap::new();
        let mut building_summary: BTreeMap<String, f64> = BTreeMap::new();
        let mut byproducts: BTreeMap<String, f64> = BTreeMap::new();

        path.push(item_id);
        for input in &requirements.inputs {
            let node = self.resolve(input.item_id, input.rate, None, path)?;

            match &node {
                ProductionChainNode::Step(step) => {
                    merge_totals(&mut building_summary, &step.building_summary);
                    merge_totals(&mut raw_materials, &step.raw_materials);
                    merge_totals(&mut byproducts, &step.byproducts);
                }
                ProductionChainNode::RawMaterial(raw) => {
                    *raw_materials.entry(input.item_name.clone()).or_default() +=
                        raw.required_rate;
                }
            }

            dependencies.insert(input.item_name.clone(), node);
        }
        path.pop();

        *building_summary
            .entry(requirements.building_name.clone())
            .or_default() += requirements.num_buildings;
        for byproduct in &requirements.byproducts {
            *byproducts.entry(byproduct.item_name.clone()).or_default() += byproduct.rate;
        }

        Ok(ProductionChainNode::Step(Box::new(ChainStep {
            target: ChainTarget {
                item: requirements.output.item_name.clone(),
                rate,
                recipe: format!("{} ({})", recipe.name, recipe.building.name),
            },
            requirements,
            dependencies,
            raw_materials,
            building_summary,
            byproducts,
        })))
    }

    fn cycle_error(&self, path: &[ItemId], item_id: ItemId) -> CalcError {
        let start = path.iter().position(|&id| id == item_id).unwrap_or(0);
        let name = |id: ItemId| {
            self.provider
                .get_item(id)
                .map(|item| item.name)
                .unwrap_or_else(|_| format!("#{id}"))
        };

        let mut names: Vec<String> = path[start..].iter().map(|&id| name(id)).collect();
        names.push(name(item_id));
        CalcError::CyclicRecipe { path: names }
    }
}

fn merge_totals(into: &mut BTreeMap<String, f64>, from: &BTreeMap<String, f64>) {
    for (name, amount) in from {
        *into.entry(name.clone()).or_default() += amount;
    }
}

/// Sum of every recipe's building count in a chain, found by walking the tree
pub fn total_buildings(node: &ProductionChainNode) -> f64 {
    match node {
        ProductionChainNode::RawMaterial(_) => 0.0,
        ProductionChainNode::Step(step) => {
            step.requirements.num_buildings
                + step.dependencies.values().map(total_buildings).sum::<f64>()
        }
    }
}

/// Format a production chain as a readable string
pub fn format_production_chain(node: &ProductionChainNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    match node {
        ProductionChainNode::RawMaterial(raw) => {
            output.push_str(&format!(
                "{}→ {} @ {:.2}/min (raw material)\n",
                prefix, raw.item_name, raw.required_rate
            ));
        }
        ProductionChainNode::Step(step) => {
            let req = &step.requirements;
            output.push_str(&format!(
                "{}{:.2}x {} making {} @ {:.2}/min [{}]\n",
                prefix,
                req.num_buildings,
                req.building_name,
                step.target.item,
                step.target.rate,
                req.recipe_name
            ));

            for byproduct in &req.byproducts {
                output.push_str(&format!(
                    "{}  also yields {} @ {:.2}/min\n",
                    prefix, byproduct.item_name, byproduct.rate
                ));
            }

            for input in &req.inputs {
                output.push_str(&format!(
                    "{}  needs {} @ {:.2}/min\n",
                    prefix, input.item_name, input.rate
                ));
                if let Some(upstream) = step.dependencies.get(&input.item_name) {
                    if !upstream.is_raw_material() {
                        output.push_str(&format_production_chain(upstream, indent + 2));
                    }
                }
            }
        }
    }

    output
}

/// Summary of a production chain calculation
#[derive(Debug)]
pub struct ChainSummary {
    pub target_item: String,
    pub target_rate: f64,
    pub total_buildings: f64,
    pub building_counts: Vec<(String, f64)>,
    pub raw_materials: Vec<(String, f64)>,
    pub byproducts: Vec<(String, f64)>,
}

/// Generate a summary of the production chain by walking every node
pub fn summarize_chain(node: &ProductionChainNode) -> ChainSummary {
    let mut building_counts = BTreeMap::new();
    let mut raw_materials = BTreeMap::new();
    let mut byproducts = BTreeMap::new();

    collect_summary(node, &mut building_counts, &mut raw_materials, &mut byproducts);

    let (target_item, target_rate) = match node {
        ProductionChainNode::RawMaterial(raw) => (raw.item_name.clone(), raw.required_rate),
        ProductionChainNode::Step(step) => (step.target.item.clone(), step.target.rate),
    };

    ChainSummary {
        target_item,
        target_rate,
        total_buildings: total_buildings(node),
        building_counts: building_counts.into_iter().collect(),
        raw_materials: raw_materials.into_iter().collect(),
        byproducts: byproducts.into_iter().collect(),
    }
}

fn collect_summary(
    node: &ProductionChainNode,
    buildings: &mut BTreeMap<String, f64>,
    raw_materials: &mut BTreeMap<String, f64>,
    byproducts: &mut BTreeMap<String, f64>,
) {
    match node {
        ProductionChainNode::RawMaterial(raw) => {
            *raw_materials.entry(raw.item_name.clone()).or_default() += raw.required_rate;
        }
        ProductionChainNode::Step(step) => {
            let req = &step.requirements;
            *buildings.entry(req.building_name.clone()).or_default() += req.num_buildings;
            for byproduct in &req.byproducts {
                *byproducts.entry(byproduct.item_name.clone()).or_default() += byproduct.rate;
            }
            for upstream in step.dependencies.values() {
                collect_summary(upstream, buildings, raw_materials, byproducts);
            }
        }
    }
}

impl fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} @ {:.2}/min", self.target_item, self.target_rate)?;
        writeln!(f)?;

        writeln!(f, "Buildings required ({:.2} total):", self.total_buildings)?;
        for (name, count) in &self.building_counts {
            writeln!(f, "  {:.2}x {}", count, name)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw materials required:")?;
        for (name, rate) in &self.raw_materials {
            writeln!(f, "  {} @ {:.2}/min", name, rate)?;
        }

        if !self.byproducts.is_empty() {
            writeln!(f)?;
            writeln!(f, "Byproducts:")?;
            for (name, rate) in &self.byproducts {
                writeln!(f, "  {} @ {:.2}/min", name, rate)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, SqliteProvider};
    use crate::provider::RecipeBook;
    use crate::sample::sample_book;
    use proptest::prelude::*;
    use rusqlite::Connection;

    fn assert_approx(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn item_id(book: &RecipeBook, name: &str) -> ItemId {
        book.find_item(name).expect("sample item").id
    }

    fn step(node: &ProductionChainNode) -> &ChainStep {
        node.as_step().expect("internal node")
    }

    /// Iron Plate from Iron Ingot with nothing producing the ingots
    fn plate_only_book() -> (RecipeBook, ItemId, ItemId, RecipeId) {
        let mut book = RecipeBook::new();
        let ingot = book.add_item("Iron Ingot");
        let plate = book.add_item("Iron Plate");
        let constructor = book.add_building("Constructor");
        let recipe = book.add_recipe("Iron Plate", 6.0, constructor, &[(ingot, 3)], &[(plate, 2)]);
        (book, ingot, plate, recipe)
    }

    #[test]
    fn iron_plate_requirements() {
        let (book, ingot, plate, recipe) = plate_only_book();
        let resolver = Resolver::new(&book);

        let req = resolver
            .calculate_recipe_requirements(recipe, plate, 60.0)
            .unwrap();

        assert_eq!(req.recipe_name, "Iron Plate");
        assert_eq!(req.building_name, "Constructor");
        assert_approx(req.num_buildings, 3.0);
        assert_eq!(req.output.item_id, plate);
        assert_eq!(req.output.item_name, "Iron Plate");
        assert_approx(req.output.rate, 60.0);
        assert_eq!(req.inputs.len(), 1);
        assert_eq!(req.inputs[0].item_id, ingot);
        assert_approx(req.inputs[0].rate, 90.0);
        assert!(req.byproducts.is_empty());
    }

    #[test]
    fn iron_plate_chain_with_raw_ingots() {
        let (book, _, plate, _) = plate_only_book();
        let resolver = Resolver::new(&book);

        let chain = resolver.get_production_chain(plate, 60.0).unwrap();
        let root = step(&chain);

        assert_eq!(root.target.item, "Iron Plate");
        assert_eq!(root.target.recipe, "Iron Plate (Constructor)");
        let ingots = root.dependencies["Iron Ingot"]
            .as_raw_material()
            .expect("raw ingots");
        assert!(ingots.is_raw_material);
        assert_approx(ingots.required_rate, 90.0);
        assert_eq!(root.raw_materials.len(), 1);
        assert_approx(root.raw_materials["Iron Ingot"], 90.0);
        assert_eq!(root.building_summary.len(), 1);
        assert_approx(root.building_summary["Constructor"], 3.0);
    }

    #[test]
    fn raw_material_is_returned_as_leaf() {
        let book = sample_book();
        let ore = item_id(&book, "Iron Ore");

        let chain = Resolver::new(&book).get_production_chain(ore, 42.5).unwrap();

        assert_eq!(
            chain,
            ProductionChainNode::RawMaterial(RawMaterialNode {
                item_id: ore,
                item_name: "Iron Ore".to_string(),
                required_rate: 42.5,
                is_raw_material: true,
            })
        );
    }

    #[test]
    fn reinforced_plate_chain_aggregates_transitively() {
        let book = sample_book();
        let resolver = Resolver::new(&book);

        let chain = resolver
            .get_production_chain(item_id(&book, "Reinforced Iron Plate"), 5.0)
            .unwrap();
        let root = step(&chain);

        assert_approx(root.requirements.num_buildings, 1.0);
        assert_approx(root.building_summary["Assembler"], 1.0);
        assert_approx(root.building_summary["Constructor"], 4.0);
        assert_approx(root.building_summary["Smelter"], 2.0);
        assert_eq!(root.raw_materials.len(), 1);
        assert_approx(root.raw_materials["Iron Ore"], 60.0);

        let screws = step(&root.dependencies["Screw"]);
        assert_approx(screws.requirements.num_buildings, 1.5);
        assert_approx(screws.requirements.inputs[0].rate, 15.0);

        // intermediates stay in the tree, never in raw_materials
        assert!(!root.raw_materials.contains_key("Iron Ingot"));
        assert!(!root.raw_materials.contains_key("Iron Plate"));
    }

    #[test]
    fn byproducts_are_ledgered_not_netted() {
        let book = sample_book();
        let resolver = Resolver::new(&book);

        let chain = resolver
            .get_production_chain(item_id(&book, "Plastic"), 20.0)
            .unwrap();
        let root = step(&chain);

        assert_approx(root.requirements.num_buildings, 1.0);
        assert_eq!(root.requirements.byproducts.len(), 1);
        assert_eq!(root.requirements.byproducts[0].item_name, "Heavy Oil Residue");
        assert_approx(root.requirements.byproducts[0].rate, 10.0);
        assert_approx(root.byproducts["Heavy Oil Residue"], 10.0);
        assert_approx(root.raw_materials["Crude Oil"], 30.0);
    }

    #[test]
    fn parent_picks_up_child_byproduct_ledger() {
        let mut book = RecipeBook::new();
        let crude = book.add_item("Crude Oil");
        let plastic = book.add_item("Plastic");
        let residue = book.add_item("Residue");
        let toy = book.add_item("Toy");
        let refinery = book.add_building("Refinery");
        let workshop = book.add_building("Workshop");
        book.add_recipe("Plastic", 6.0, refinery, &[(crude, 3)], &[(plastic, 2), (residue, 1)]);
        book.add_recipe("Toy", 60.0, workshop, &[(plastic, 1)], &[(toy, 1)]);

        let chain = Resolver::new(&book).get_production_chain(toy, 20.0).unwrap();
        let root = step(&chain);

        assert!(root.requirements.byproducts.is_empty());
        assert_eq!(root.byproducts.len(), 1);
        assert_approx(root.byproducts["Residue"], 10.0);
        assert!(!root.raw_materials.contains_key("Residue"));
        assert!(!root.dependencies.contains_key("Residue"));
        assert_approx(root.raw_materials["Crude Oil"], 30.0);

        let plastic_step = step(&root.dependencies["Plastic"]);
        assert_approx(plastic_step.byproducts["Residue"], 10.0);
    }

    #[test]
    fn byproduct_target_scales_from_that_output() {
        let book = sample_book();
        let residue = item_id(&book, "Heavy Oil Residue");
        let resolver = Resolver::new(&book);

        let req = resolver.calculate_recipe_requirements(10, residue, 10.0).unwrap();

        assert_eq!(req.recipe_name, "Plastic");
        assert_approx(req.num_buildings, 1.0);
        assert_eq!(req.byproducts[0].item_name, "Plastic");
        assert_approx(req.byproducts[0].rate, 20.0);
    }

    #[test]
    fn first_producer_wins() {
        let book = sample_book();
        let ingot = item_id(&book, "Iron Ingot");

        let chain = Resolver::new(&book).get_production_chain(ingot, 30.0).unwrap();

        assert_eq!(step(&chain).requirements.recipe_name, "Iron Ingot");
        assert_eq!(step(&chain).requirements.building_name, "Smelter");
    }

    #[test]
    fn explicit_recipe_overrides_root_choice() {
        let book = sample_book();
        let ingot = item_id(&book, "Iron Ingot");
        let pure = book
            .recipes()
            .iter()
            .find(|r| r.name == "Alternate: Pure Iron Ingot")
            .unwrap()
            .id;

        let chain = Resolver::new(&book)
            .get_production_chain_with_recipe(pure, ingot, 65.0)
            .unwrap();
        let root = step(&chain);

        assert_eq!(root.target.recipe, "Alternate: Pure Iron Ingot (Refinery)");
        assert_approx(root.building_summary["Refinery"], 1.0);
        assert_approx(root.raw_materials["Iron Ore"], 35.0);
        assert_approx(root.raw_materials["Water"], 20.0);
    }

    #[test]
    fn mismatched_target_scales_to_zero() {
        let book = sample_book();
        let plate = item_id(&book, "Iron Plate");
        let resolver = Resolver::new(&book);

        // recipe 1 smelts ingots, not plates
        let req = resolver.calculate_recipe_requirements(1, plate, 60.0).unwrap();

        assert_eq!(req.num_buildings, 0.0);
        assert_eq!(req.output.item_name, "Iron Plate");
        assert!(req.inputs.iter().all(|i| i.rate == 0.0));
        assert!(req.byproducts.iter().all(|b| b.rate == 0.0));
    }

    #[test]
    fn unknown_recipe_is_not_found() {
        let book = sample_book();
        let resolver = Resolver::new(&book);

        let err = resolver
            .calculate_recipe_requirements(999, 1, 10.0)
            .unwrap_err();
        assert!(matches!(err, CalcError::NotFound { id: 999, .. }));

        let err = resolver.get_production_chain(999, 10.0).unwrap_err();
        assert!(matches!(err, CalcError::NotFound { id: 999, .. }));
    }

    #[test]
    fn cycles_are_reported() {
        let mut book = RecipeBook::new();
        let a = book.add_item("Alpha");
        let b = book.add_item("Beta");
        let lab = book.add_building("Lab");
        book.add_recipe("Alpha", 1.0, lab, &[(b, 1)], &[(a, 1)]);
        book.add_recipe("Beta", 1.0, lab, &[(a, 1)], &[(b, 1)]);

        let err = Resolver::new(&book).get_production_chain(a, 1.0).unwrap_err();

        match err {
            CalcError::CyclicRecipe { path } => assert_eq!(path, ["Alpha", "Beta", "Alpha"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn recipe_consuming_its_own_output_is_a_cycle() {
        let mut book = RecipeBook::new();
        let seed = book.add_item("Seed");
        let farm = book.add_building("Farm");
        book.add_recipe("Seed", 30.0, farm, &[(seed, 1)], &[(seed, 2)]);

        let err = Resolver::new(&book).get_production_chain(seed, 4.0).unwrap_err();

        match err {
            CalcError::CyclicRecipe { path } => assert_eq!(path, ["Seed", "Seed"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn shared_raw_materials_sum_across_branches() {
        let mut book = RecipeBook::new();
        let ore = book.add_item("Ore");
        let left = book.add_item("Left");
        let right = book.add_item("Right");
        let widget = book.add_item("Widget");
        let press = book.add_building("Press");
        let bench = book.add_building("Bench");
        book.add_recipe("Left", 60.0, press, &[(ore, 2)], &[(left, 1)]);
        book.add_recipe("Right", 60.0, press, &[(ore, 3)], &[(right, 1)]);
        book.add_recipe("Widget", 60.0, bench, &[(left, 1), (right, 1), (ore, 1)], &[(widget, 1)]);

        let chain = Resolver::new(&book).get_production_chain(widget, 1.0).unwrap();
        let root = step(&chain);

        assert_approx(root.raw_materials["Ore"], 6.0);
        assert_approx(root.building_summary["Press"], 2.0);
        assert_approx(root.building_summary["Bench"], 1.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let book = sample_book();
        let target = item_id(&book, "Reinforced Iron Plate");
        let resolver = Resolver::new(&book);

        let first = resolver.get_production_chain(target, 7.5).unwrap();
        let second = resolver.get_production_chain(target, 7.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sqlite_and_memory_providers_agree() {
        let book = sample_book();
        let mut conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        db::store_book(&mut conn, &book, false).unwrap();

        let target = item_id(&book, "Reinforced Iron Plate");
        let from_db = Resolver::new(SqliteProvider::new(&conn))
            .get_production_chain(target, 10.0)
            .unwrap();
        let in_memory = Resolver::new(&book).get_production_chain(target, 10.0).unwrap();

        assert_eq!(from_db, in_memory);
    }

    #[test]
    fn summary_matches_root_aggregates() {
        let book = sample_book();
        let chain = Resolver::new(&book)
            .get_production_chain(item_id(&book, "Reinforced Iron Plate"), 5.0)
            .unwrap();
        let root = step(&chain);

        let summary = summarize_chain(&chain);
        assert_eq!(summary.target_item, "Reinforced Iron Plate");
        assert_approx(summary.total_buildings, 7.0);
        assert_approx(total_buildings(&chain), 7.0);
        for (name, count) in &summary.building_counts {
            assert_approx(*count, root.building_summary[name]);
        }
        for (name, rate) in &summary.raw_materials {
            assert_approx(*rate, root.raw_materials[name]);
        }

        let text = summary.to_string();
        assert!(text.contains("1.00x Assembler"));
        assert!(text.contains("Iron Ore @ 60.00/min"));
    }

    #[test]
    fn formatted_chain_lists_every_stage() {
        let book = sample_book();
        let chain = Resolver::new(&book)
            .get_production_chain(item_id(&book, "Cable"), 30.0)
            .unwrap();

        let text = format_production_chain(&chain, 0);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("1.00x Constructor making Cable"));
        assert!(text.contains("making Wire"));
        assert!(text.contains("making Copper Ingot"));
        assert!(text.contains("needs Copper Ore @ 30.00/min"));
    }

    /// Every output of every sample recipe, as (recipe id, item id)
    fn sample_targets() -> Vec<(RecipeId, ItemId)> {
        sample_book()
            .recipes()
            .iter()
            .flat_map(|r| r.outputs().map(|o| (r.id, o.item.id)).collect::<Vec<_>>())
            .collect()
    }

    fn sum_leaves(node: &ProductionChainNode, totals: &mut BTreeMap<String, f64>) {
        match node {
            ProductionChainNode::RawMaterial(raw) => {
                *totals.entry(raw.item_name.clone()).or_default() += raw.required_rate;
            }
            ProductionChainNode::Step(step) => {
                for child in step.dependencies.values() {
                    sum_leaves(child, totals);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn doubling_rate_doubles_everything(
            target in prop::sample::select(sample_targets()),
            rate in 0.1f64..1000.0,
        ) {
            let book = sample_book();
            let resolver = Resolver::new(&book);
            let (recipe, item) = target;

            let once = resolver.calculate_recipe_requirements(recipe, item, rate).unwrap();
            let twice = resolver.calculate_recipe_requirements(recipe, item, 2.0 * rate).unwrap();

            let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * b.abs().max(1.0);
            prop_assert!(close(twice.num_buildings, 2.0 * once.num_buildings));
            prop_assert!(close(twice.output.rate, 2.0 * once.output.rate));
            for (a, b) in once.inputs.iter().zip(&twice.inputs) {
                prop_assert!(close(b.rate, 2.0 * a.rate));
            }
            for (a, b) in once.byproducts.iter().zip(&twice.byproducts) {
                prop_assert!(close(b.rate, 2.0 * a.rate));
            }
        }

        #[test]
        fn summaries_account_for_whole_tree(
            target in prop::sample::select(sample_targets()),
            rate in 0.1f64..1000.0,
        ) {
            let book = sample_book();
            let (_, item) = target;
            let chain = Resolver::new(&book).get_production_chain(item, rate).unwrap();
            let root = step(&chain);

            let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * b.abs().max(1.0);
            let summary_total: f64 = root.building_summary.values().sum();
            prop_assert!(close(summary_total, total_buildings(&chain)));

            let mut leaves = BTreeMap::new();
            sum_leaves(&chain, &mut leaves);
            prop_assert_eq!(leaves.len(), root.raw_materials.len());
            for (name, rate) in &leaves {
                prop_assert!(close(root.raw_materials[name], *rate));
            }
        }
    }
}
