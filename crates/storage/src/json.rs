//! Flat-file JSON backend.
//!
//! The whole dataset lives in one serde document guarded by an `RwLock`.
//! Mutations rewrite the file through a temp-file-then-rename so a crash
//! mid-write never leaves a truncated store behind. Cascades are manual
//! retain-filters; there is no referential machinery beyond that.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use pricelab_core::{ItemId, ProcessId, QuoteId};
use pricelab_pricing::{Item, Process, Quote};

use crate::store::{HistoryEntry, PriceStore, StoreError};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct State {
    processes: Vec<Process>,
    items: Vec<Item>,
    quotes: Vec<Quote>,
}

/// Single-file JSON store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`.
    #[instrument(err)]
    pub fn open(path: impl Into<PathBuf> + std::fmt::Debug) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            State::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &State) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Run a mutation and persist the result; the lock is held across the
    /// write so readers never observe unsaved state.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        let out = f(&mut guard)?;
        self.persist(&guard)?;
        Ok(out)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

impl PriceStore for JsonFileStore {
    async fn create_process(&self, process: Process) -> Result<Process, StoreError> {
        self.mutate(|state| {
            state.processes.push(process.clone());
            Ok(process)
        })
    }

    async fn list_processes(&self) -> Result<Vec<Process>, StoreError> {
        Ok(self.read(|state| {
            let mut out = state.processes.clone();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            out
        }))
    }

    async fn get_process(&self, id: ProcessId) -> Result<Option<Process>, StoreError> {
        Ok(self.read(|state| state.processes.iter().find(|p| p.id == id).cloned()))
    }

    async fn update_process(&self, process: Process) -> Result<Process, StoreError> {
        self.mutate(|state| {
            let slot = state
                .processes
                .iter_mut()
                .find(|p| p.id == process.id)
                .ok_or(StoreError::NotFound)?;
            *slot = process.clone();
            Ok(process)
        })
    }

    async fn delete_process(&self, id: ProcessId) -> Result<(), StoreError> {
        self.mutate(|state| {
            let before = state.processes.len();
            state.processes.retain(|p| p.id != id);
            if state.processes.len() == before {
                return Err(StoreError::NotFound);
            }

            // Manual cascade: drop the process's items, then orphaned quotes.
            let doomed: Vec<ItemId> = state
                .items
                .iter()
                .filter(|i| i.process_id == id)
                .map(|i| i.id)
                .collect();
            state.items.retain(|i| i.process_id != id);
            state.quotes.retain(|q| !doomed.contains(&q.item_id));
            Ok(())
        })
    }

    async fn create_item(&self, item: Item) -> Result<Item, StoreError> {
        self.mutate(|state| {
            ensure_process(state, item.process_id)?;
            state.items.push(item.clone());
            Ok(item)
        })
    }

    async fn create_items(&self, items: Vec<Item>) -> Result<Vec<Item>, StoreError> {
        self.mutate(|state| {
            for item in &items {
                ensure_process(state, item.process_id)?;
            }
            state.items.extend(items.iter().cloned());
            Ok(items)
        })
    }

    async fn list_items(&self, process_id: ProcessId) -> Result<Vec<Item>, StoreError> {
        Ok(self.read(|state| {
            let mut out: Vec<Item> = state
                .items
                .iter()
                .filter(|i| i.process_id == process_id)
                .cloned()
                .collect();
            out.sort_by_key(|i| i.item_number);
            out
        }))
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.read(|state| state.items.iter().find(|i| i.id == id).cloned()))
    }

    async fn update_item(&self, item: Item) -> Result<Item, StoreError> {
        self.mutate(|state| {
            let slot = state
                .items
                .iter_mut()
                .find(|i| i.id == item.id)
                .ok_or(StoreError::NotFound)?;
            *slot = item.clone();
            Ok(item)
        })
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        self.mutate(|state| {
            let before = state.items.len();
            state.items.retain(|i| i.id != id);
            if state.items.len() == before {
                return Err(StoreError::NotFound);
            }
            state.quotes.retain(|q| q.item_id != id);
            Ok(())
        })
    }

    #[instrument(skip(self, ordered), fields(process_id = %process_id, count = ordered.len()), err)]
    async fn reorder_items(
        &self,
        process_id: ProcessId,
        ordered: Vec<ItemId>,
    ) -> Result<(), StoreError> {
        self.mutate(|state| {
            ensure_process(state, process_id)?;
            validate_reorder(
                state
                    .items
                    .iter()
                    .filter(|i| i.process_id == process_id)
                    .map(|i| i.id),
                &ordered,
            )?;

            for (pos, id) in ordered.iter().enumerate() {
                if let Some(item) = state.items.iter_mut().find(|i| i.id == *id) {
                    item.item_number = (pos + 1) as u32;
                }
            }
            Ok(())
        })
    }

    async fn create_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        self.mutate(|state| {
            ensure_item(state, quote.item_id)?;
            state.quotes.push(quote.clone());
            Ok(quote)
        })
    }

    async fn create_quotes(&self, quotes: Vec<Quote>) -> Result<Vec<Quote>, StoreError> {
        self.mutate(|state| {
            for quote in &quotes {
                ensure_item(state, quote.item_id)?;
            }
            state.quotes.extend(quotes.iter().cloned());
            Ok(quotes)
        })
    }

    async fn list_quotes(&self, item_id: ItemId) -> Result<Vec<Quote>, StoreError> {
        Ok(self.read(|state| {
            let mut out: Vec<Quote> = state
                .quotes
                .iter()
                .filter(|q| q.item_id == item_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.quote_date.cmp(&a.quote_date));
            out
        }))
    }

    async fn get_quote(&self, id: QuoteId) -> Result<Option<Quote>, StoreError> {
        Ok(self.read(|state| state.quotes.iter().find(|q| q.id == id).cloned()))
    }

    async fn update_quote(&self, quote: Quote) -> Result<Quote, StoreError> {
        self.mutate(|state| {
            let slot = state
                .quotes
                .iter_mut()
                .find(|q| q.id == quote.id)
                .ok_or(StoreError::NotFound)?;
            *slot = quote.clone();
            Ok(quote)
        })
    }

    async fn delete_quote(&self, id: QuoteId) -> Result<(), StoreError> {
        self.mutate(|state| {
            let before = state.quotes.len();
            state.quotes.retain(|q| q.id != id);
            if state.quotes.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.read(|state| {
            let mut out: Vec<HistoryEntry> = state
                .quotes
                .iter()
                .filter_map(|q| {
                    let item = state.items.iter().find(|i| i.id == q.item_id)?;
                    let process = state.processes.iter().find(|p| p.id == item.process_id)?;
                    Some(HistoryEntry {
                        quote: q.clone(),
                        item_number: item.item_number,
                        specification: item.specification.clone(),
                        unit: item.unit.clone(),
                        process_id: process.id,
                        process_number: process.process_number.clone(),
                        object: process.object.clone(),
                    })
                })
                .collect();
            out.sort_by(|a, b| b.quote.quote_date.cmp(&a.quote.quote_date));
            out
        }))
    }
}

fn ensure_process(state: &State, id: ProcessId) -> Result<(), StoreError> {
    if state.processes.iter().any(|p| p.id == id) {
        Ok(())
    } else {
        Err(StoreError::NotFound)
    }
}

fn ensure_item(state: &State, id: ItemId) -> Result<(), StoreError> {
    if state.items.iter().any(|i| i.id == id) {
        Ok(())
    } else {
        Err(StoreError::NotFound)
    }
}

/// A reorder must name exactly the process's items (a full permutation).
pub(crate) fn validate_reorder(
    existing: impl Iterator<Item = ItemId>,
    ordered: &[ItemId],
) -> Result<(), StoreError> {
    let existing: Vec<ItemId> = existing.collect();
    if existing.len() != ordered.len() {
        return Err(StoreError::InvalidReorder(format!(
            "expected {} item id(s), got {}",
            existing.len(),
            ordered.len()
        )));
    }
    for id in ordered {
        if !existing.contains(id) {
            return Err(StoreError::InvalidReorder(format!(
                "item {id} does not belong to the process"
            )));
        }
    }
    let mut seen = Vec::with_capacity(ordered.len());
    for id in ordered {
        if seen.contains(id) {
            return Err(StoreError::InvalidReorder(format!("item {id} listed twice")));
        }
        seen.push(*id);
    }
    Ok(())
}
