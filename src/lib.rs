//! Production chain calculator for Satisfactory-style recipe graphs.
//!
//! Given a target item and a rate in units per minute, [`Resolver`] walks the
//! recipes producing it down to raw materials and reports building counts,
//! raw-material consumption and byproducts along the way.

pub mod calculator;
pub mod db;
pub mod error;
pub mod models;
pub mod provider;
pub mod sample;

pub use calculator::{ChainSummary, Resolver, format_production_chain, summarize_chain};
pub use error::{CalcError, Result};
pub use models::{ProductionChainNode, RecipeRequirements};
pub use provider::{RecipeBook, RecipeProvider};
