//! Database schema and operations

use rusqlite::{Connection, OptionalExtension};

use crate::error::{CalcError, Result};
use crate::models::{Building, BuildingId, Ingredient, Item, ItemId, Recipe, RecipeId};
use crate::provider::{RecipeBook, RecipeProvider};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS buildings (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            crafting_time REAL NOT NULL CHECK (crafting_time > 0),
            building_id INTEGER NOT NULL REFERENCES buildings(id)
        );

        -- Both consumed inputs and produced outputs, told apart by is_output
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            item_id INTEGER NOT NULL REFERENCES items(id),
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            is_output INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_ingredients_item ON recipe_ingredients(item_id, is_output);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name) VALUES (?1, ?2)",
        (item.id, &item.name),
    )?;
    Ok(())
}

/// Insert or replace a building
pub fn upsert_building(conn: &Connection, building: &Building) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO buildings (id, name) VALUES (?1, ?2)",
        (building.id, &building.name),
    )?;
    Ok(())
}

/// Insert a recipe and all of its ingredient lines
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT INTO recipes (id, name, crafting_time, building_id) VALUES (?1, ?2, ?3, ?4)",
        (recipe.id, &recipe.name, recipe.crafting_time, recipe.building.id),
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO recipe_ingredients (recipe_id, item_id, quantity, is_output)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for ingredient in &recipe.ingredients {
        stmt.execute((
            recipe.id,
            ingredient.item.id,
            ingredient.quantity,
            ingredient.is_output,
        ))?;
    }
    Ok(())
}

/// Store an in-memory recipe book, keeping its ids.
///
/// With `replace` the existing data is cleared in the same transaction, so a
/// failed load leaves the previous data in place.
pub fn store_book(conn: &mut Connection, book: &RecipeBook, replace: bool) -> Result<()> {
    let tx = conn.transaction()?;
    if replace {
        clear_data(&tx)?;
    }
    for item in book.items() {
        upsert_item(&tx, item)?;
    }
    for building in book.buildings() {
        upsert_building(&tx, building)?;
    }
    for recipe in book.recipes() {
        insert_recipe(&tx, recipe)?;
    }
    tx.commit()?;
    Ok(())
}

/// Clear all recipe data
pub fn clear_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM buildings;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// Look up an item by its display name
pub fn find_item_by_name(conn: &Connection, name: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT id, name FROM items WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
            [name],
            |row| {
                Ok(Item {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(item)
}

/// List all items in the database
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name FROM items ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List recipes, optionally only those made in the named building and whose
/// name contains `search` (case-insensitive)
pub fn list_recipes(
    conn: &Connection,
    building: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT r.id FROM recipes r
         JOIN buildings b ON b.id = r.building_id
         WHERE (?1 IS NULL OR b.name = ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR r.name LIKE '%' || ?2 || '%' COLLATE NOCASE)
         ORDER BY r.name, r.id",
    )?;
    let ids = stmt.query_map([building, search], |row| row.get::<_, RecipeId>(0))?;

    let mut results = Vec::new();
    for id in ids {
        results.push(load_recipe(conn, id?)?);
    }
    Ok(results)
}

/// Recipes that take `item_id` on the given side, ordered by recipe id
fn recipes_by_ingredient(conn: &Connection, item_id: ItemId, is_output: bool) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT recipe_id FROM recipe_ingredients
         WHERE item_id = ?1 AND is_output = ?2
         ORDER BY recipe_id",
    )?;
    let ids = stmt.query_map((item_id, is_output), |row| row.get::<_, RecipeId>(0))?;

    let mut results = Vec::new();
    for id in ids {
        results.push(load_recipe(conn, id?)?);
    }
    Ok(results)
}

/// Recipes that consume an item
pub fn get_recipes_using_item(conn: &Connection, item_id: ItemId) -> Result<Vec<Recipe>> {
    recipes_by_ingredient(conn, item_id, false)
}

fn load_recipe(conn: &Connection, recipe_id: RecipeId) -> Result<Recipe> {
    let header = conn
        .query_row(
            "SELECT r.name, r.crafting_time, b.id, b.name
             FROM recipes r
             JOIN buildings b ON b.id = r.building_id
             WHERE r.id = ?1",
            [recipe_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    Building {
                        id: row.get::<_, BuildingId>(2)?,
                        name: row.get(3)?,
                    },
                ))
            },
        )
        .optional()?;

    let Some((name, crafting_time, building)) = header else {
        return Err(CalcError::recipe_not_found(recipe_id));
    };

    let mut stmt = conn.prepare(
        "SELECT i.id, i.name, ri.quantity, ri.is_output
         FROM recipe_ingredients ri
         JOIN items i ON i.id = ri.item_id
         WHERE ri.recipe_id = ?1
         ORDER BY ri.id",
    )?;
    let rows = stmt.query_map([recipe_id], |row| {
        Ok(Ingredient {
            item: Item {
                id: row.get(0)?,
                name: row.get(1)?,
            },
            quantity: row.get(2)?,
            is_output: row.get(3)?,
        })
    })?;

    let mut ingredients = Vec::new();
    for row in rows {
        ingredients.push(row?);
    }

    Ok(Recipe {
        id: recipe_id,
        name,
        crafting_time,
        building,
        ingredients,
    })
}

/// Recipe provider backed by a SQLite connection
pub struct SqliteProvider<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteProvider<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RecipeProvider for SqliteProvider<'_> {
    fn get_recipe(&self, recipe_id: RecipeId) -> Result<Recipe> {
        load_recipe(self.conn, recipe_id)
    }

    fn get_item(&self, item_id: ItemId) -> Result<Item> {
        self.conn
            .query_row("SELECT id, name FROM items WHERE id = ?1", [item_id], |row| {
                Ok(Item {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?
            .ok_or(CalcError::item_not_found(item_id))
    }

    fn get_recipes_for_item(&self, item_id: ItemId) -> Result<Vec<Recipe>> {
        recipes_by_ingredient(self.conn, item_id, true)
    }
}
