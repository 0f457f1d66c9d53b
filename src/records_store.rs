use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::RECORDS_VERSION;
use crate::engine::now_ms;
use crate::types::{RecordsResponse, SolveRecordEntry};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredSolveEntry {
    solves: u64,
    #[serde(rename = "bestMoves", alias = "best_moves")]
    best_moves: u32,
    #[serde(rename = "minimumMoves", alias = "minimum_moves")]
    minimum_moves: u32,
    #[serde(rename = "updatedAtMs", alias = "updated_at_ms")]
    updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RecordsStoreFile<'a> {
    version: u8,
    puzzles: &'a BTreeMap<u32, StoredSolveEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct RecordsStoreFileRaw {
    version: u8,
    puzzles: HashMap<String, serde_json::Value>,
}

/// Best results per puzzle, persisted as JSON after every solve.
pub struct RecordsStore {
    file_path: PathBuf,
    puzzles: BTreeMap<u32, StoredSolveEntry>,
}

impl RecordsStore {
    pub fn new(file_path: PathBuf) -> Self {
        let puzzles = load_puzzles(&file_path);
        Self { file_path, puzzles }
    }

    /// Records one solve and returns the updated view of that puzzle's record.
    pub fn record_solve(
        &mut self,
        puzzle_id: u32,
        moves: u32,
        minimum_moves: u32,
    ) -> SolveRecordEntry {
        let now_ms = now_ms();
        let current = self
            .puzzles
            .entry(puzzle_id)
            .or_insert_with(|| StoredSolveEntry {
                solves: 0,
                best_moves: moves,
                minimum_moves,
                updated_at_ms: now_ms,
            });
        let previous_best = current.best_moves;
        current.solves += 1;
        current.best_moves = current.best_moves.min(moves);
        current.minimum_moves = minimum_moves;
        current.updated_at_ms = now_ms;
        if moves < previous_best {
            info!("[records-store] puzzle {puzzle_id} new best {moves} (was {previous_best})");
        }

        let entry = to_view(puzzle_id, current);
        self.save();
        entry
    }

    pub fn best_moves(&self, puzzle_id: u32) -> Option<u32> {
        self.puzzles.get(&puzzle_id).map(|entry| entry.best_moves)
    }

    pub fn build_response(&self) -> RecordsResponse {
        RecordsResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self
                .puzzles
                .iter()
                .map(|(puzzle_id, entry)| to_view(*puzzle_id, entry))
                .collect(),
        }
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(
                    "[records-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = RecordsStoreFile {
            version: RECORDS_VERSION,
            puzzles: &self.puzzles,
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    warn!(
                        "[records-store] failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                warn!(
                    "[records-store] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

fn to_view(puzzle_id: u32, entry: &StoredSolveEntry) -> SolveRecordEntry {
    SolveRecordEntry {
        puzzle_id,
        solves: entry.solves,
        best_moves: entry.best_moves,
        minimum_moves: entry.minimum_moves,
        reached_par: entry.best_moves <= entry.minimum_moves,
        updated_at_ms: entry.updated_at_ms,
    }
}

fn load_puzzles(path: &Path) -> BTreeMap<u32, StoredSolveEntry> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("[records-store] failed to read {}: {error}", path.display());
            }
            return BTreeMap::new();
        }
    };
    let parsed = match serde_json::from_str::<RecordsStoreFileRaw>(&text) {
        Ok(value) if value.version == RECORDS_VERSION => value,
        Ok(value) => {
            warn!(
                "[records-store] unsupported version {} at {}",
                value.version,
                path.display()
            );
            return BTreeMap::new();
        }
        Err(error) => {
            warn!("[records-store] bad file {}: {error}", path.display());
            return BTreeMap::new();
        }
    };

    let mut sanitized = BTreeMap::new();
    for (raw_key, raw_value) in parsed.puzzles {
        let Ok(puzzle_id) = raw_key.trim().parse::<u32>() else {
            warn!(
                "[records-store] skipping non-numeric puzzle key '{raw_key}' in {}",
                path.display()
            );
            continue;
        };
        let value: StoredSolveEntry = match serde_json::from_value(raw_value) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(
                    "[records-store] failed to parse entry '{raw_key}' in {}: {error}",
                    path.display()
                );
                continue;
            }
        };
        // a recorded solve always has at least one move
        if value.solves == 0 || value.best_moves == 0 {
            continue;
        }
        sanitized.insert(puzzle_id, value);
    }
    sanitized
}
