//! Recipe chain calculator
//!
//! Works out the buildings and raw materials needed to produce an item at a
//! given rate.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use recipe_chain::db::{self, SqliteProvider};
use recipe_chain::models::{Ingredient, Item, Recipe};
use recipe_chain::{RecipeProvider, Resolver, format_production_chain, sample, summarize_chain};

#[derive(Parser)]
#[command(name = "recipe-chain")]
#[command(about = "Production chain calculator for Satisfactory-style recipes")]
struct Cli {
    /// Path to the SQLite database (a `sqlite:///path` URL is also accepted)
    #[arg(
        short,
        long,
        env = "DATABASE_URL",
        default_value = "recipes.db",
        value_parser = parse_database
    )]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the production chain for a target item
    Calc {
        /// Item name (e.g. "Iron Plate") or numeric id
        item: String,

        /// Target production rate in items per minute
        #[arg(short, long, default_value = "60.0")]
        rate: f64,

        /// Recipe id to use for the target instead of the first producer
        #[arg(long)]
        recipe: Option<i64>,

        /// Show the detailed production tree
        #[arg(short, long)]
        verbose: bool,

        /// Print the whole chain as JSON
        #[arg(long, conflicts_with = "verbose")]
        json: bool,
    },

    /// Scale a single recipe to a target output rate
    Requirements {
        /// Recipe id
        recipe: i64,

        /// Output item name or id to solve for
        item: String,

        /// Target production rate in items per minute
        #[arg(short, long, default_value = "60.0")]
        rate: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all items in the database
    ListItems,

    /// List recipes, optionally only for one building
    ListRecipes {
        /// Building name to filter by
        #[arg(short, long)]
        building: Option<String>,

        /// Only recipes whose name contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show which recipes produce and consume an item
    Item {
        /// Item name or id
        item: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample recipe data for testing
    LoadSample,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recipe_chain=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Calc {
            item,
            rate,
            recipe,
            verbose,
            json,
        } => {
            check_rate(rate)?;
            let resolver = Resolver::new(SqliteProvider::new(&conn));
            let item = find_item(&conn, resolver.provider(), &item)?;

            let chain = match recipe {
                Some(recipe_id) => {
                    let recipe = resolver.provider().get_recipe(recipe_id)?;
                    if !recipe.produces(item.id) {
                        bail!("recipe '{}' does not produce {}", recipe.name, item.name);
                    }
                    resolver.get_production_chain_with_recipe(recipe_id, item.id, rate)?
                }
                None => resolver.get_production_chain(item.id, rate)?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&chain)?);
                return Ok(());
            }

            if verbose {
                println!("Production chain:\n");
                println!("{}", format_production_chain(&chain, 0));
            }

            println!("{}", summarize_chain(&chain));
        }

        Commands::Requirements {
            recipe,
            item,
            rate,
            json,
        } => {
            check_rate(rate)?;
            let resolver = Resolver::new(SqliteProvider::new(&conn));
            let item = find_item(&conn, resolver.provider(), &item)?;

            let scaled = resolver.provider().get_recipe(recipe)?;
            if !scaled.produces(item.id) {
                bail!("recipe '{}' does not produce {}", scaled.name, item.name);
            }
            let req = resolver.calculate_recipe_requirements(recipe, item.id, rate)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&req)?);
                return Ok(());
            }

            println!("Recipe: {} ({})", req.recipe_name, req.building_name);
            println!("  Buildings: {:.2}", req.num_buildings);
            println!("  Output: {} @ {:.2}/min", req.output.item_name, req.output.rate);
            for input in &req.inputs {
                println!("  Input: {} @ {:.2}/min", input.item_name, input.rate);
            }
            for byproduct in &req.byproducts {
                println!("  Byproduct: {} @ {:.2}/min", byproduct.item_name, byproduct.rate);
            }
        }

        Commands::ListItems => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'load-sample' first.");
            } else {
                println!("{:>6}  {}", "ID", "Item");
                println!("{}", "-".repeat(40));
                for item in items {
                    println!("{:>6}  {}", item.id, item.name);
                }
            }
        }

        Commands::ListRecipes { building, search } => {
            let recipes = db::list_recipes(&conn, building.as_deref(), search.as_deref())?;
            if recipes.is_empty() {
                println!("No recipes found.");
            } else {
                println!(
                    "{:>4}  {:<30} {:<14} {:>6}  {}",
                    "ID", "Recipe", "Building", "Time", "Inputs -> Outputs"
                );
                println!("{}", "-".repeat(90));
                for recipe in recipes {
                    print_recipe_row(&recipe);
                }
            }
        }

        Commands::Item { item } => {
            let provider = SqliteProvider::new(&conn);
            let item = find_item(&conn, &provider, &item)?;
            println!("Item: {} (id {})", item.name, item.id);

            let producers = provider.get_recipes_for_item(item.id)?;
            if producers.is_empty() {
                println!("  Raw material: no recipe produces it");
            } else {
                println!("  Produced by:");
                for recipe in producers {
                    print_recipe_row(&recipe);
                }
            }

            let consumers = db::get_recipes_using_item(&conn, item.id)?;
            if !consumers.is_empty() {
                println!("  Used in:");
                for recipe in consumers {
                    print_recipe_row(&recipe);
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let book = sample::sample_book();
            db::store_book(&mut conn, &book, true)?;
            tracing::info!(
                recipes = book.recipes().len(),
                database = %cli.database.display(),
                "sample data loaded"
            );
            println!("Loaded {} sample recipes", book.recipes().len());
        }
    }

    Ok(())
}

/// Accept a plain path or a SQLAlchemy-style `sqlite:///` URL.
/// `sqlite:////abs/path.db` keeps the leading slash; a bare `sqlite://` is in-memory.
fn parse_database(value: &str) -> std::result::Result<PathBuf, String> {
    let path = match value.strip_prefix("sqlite://") {
        Some("") => ":memory:",
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => value,
    };
    if path.is_empty() {
        return Err("database path is empty".to_string());
    }
    Ok(PathBuf::from(path))
}

/// Rates are not validated by the resolver, so reject nonsense here
fn check_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        bail!("rate must be a finite, non-negative number (got {rate})");
    }
    Ok(())
}

/// Accept either a numeric id or an item name
fn find_item(conn: &Connection, provider: &SqliteProvider<'_>, query: &str) -> Result<Item> {
    if let Ok(id) = query.parse::<i64>() {
        return Ok(provider.get_item(id)?);
    }
    match db::find_item_by_name(conn, query)? {
        Some(item) => Ok(item),
        None => bail!("no item named '{query}'"),
    }
}

fn format_ingredients<'a>(ingredients: impl Iterator<Item = &'a Ingredient>) -> String {
    ingredients
        .map(|i| format!("{} x{}", i.item.name, i.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_recipe_row(recipe: &Recipe) {
    println!(
        "{:>4}  {:<30} {:<14} {:>5}s  {} -> {}",
        recipe.id,
        recipe.name,
        recipe.building.name,
        recipe.crafting_time,
        format_ingredients(recipe.inputs()),
        format_ingredients(recipe.outputs())
    );
}
