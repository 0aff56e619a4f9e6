//! Error type shared by the providers and the resolver

use std::fmt;

/// Kind of record a lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Recipe,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Item => write!(f, "item"),
            EntityKind::Recipe => write!(f, "recipe"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    /// A recipe or item id does not exist in the provider.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Resolving an item's chain led back to the same item.
    #[error("cyclic recipe chain: {}", path.join(" -> "))]
    CyclicRecipe { path: Vec<String> },

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl CalcError {
    pub fn item_not_found(id: i64) -> Self {
        CalcError::NotFound {
            kind: EntityKind::Item,
            id,
        }
    }

    pub fn recipe_not_found(id: i64) -> Self {
        CalcError::NotFound {
            kind: EntityKind::Recipe,
            id,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
