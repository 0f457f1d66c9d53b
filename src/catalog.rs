use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::CATALOG_VERSION;
use crate::error::CatalogError;
use crate::puzzle::Puzzle;

const BUILTIN_CATALOG: &str = include_str!("../puzzles/catalog.json");

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CatalogEntry {
    id: u32,
    #[serde(flatten)]
    puzzle: Puzzle,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CatalogFile {
    version: u8,
    puzzles: Vec<CatalogEntry>,
}

/// Validated puzzles keyed by id.
#[derive(Clone, Debug)]
pub struct PuzzleCatalog {
    puzzles: BTreeMap<u32, Puzzle>,
}

impl PuzzleCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        if file.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion(file.version));
        }
        let entries = file.puzzles.into_iter();
        Self::from_puzzles(entries.map(|entry| (entry.id, entry.puzzle)))
    }

    pub fn from_puzzles<I>(puzzles: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (u32, Puzzle)>,
    {
        let mut out = BTreeMap::new();
        for (id, puzzle) in puzzles {
            puzzle
                .validate()
                .map_err(|source| CatalogError::InvalidPuzzle { id, source })?;
            if out.insert(id, puzzle).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }
        if out.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { puzzles: out })
    }

    pub fn get_puzzle(&self, id: u32) -> Result<Puzzle, CatalogError> {
        self.puzzles
            .get(&id)
            .cloned()
            .ok_or(CatalogError::UnknownPuzzle(id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.puzzles.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.puzzles.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn random_puzzle_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u32, CatalogError> {
        self.puzzles
            .keys()
            .copied()
            .choose(rng)
            .ok_or(CatalogError::Empty)
    }
}
