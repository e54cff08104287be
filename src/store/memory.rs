//! In-memory vector store reference implementation with optional disk
//! persistence.

use super::{cosine_similarity, matches_filters, MetadataFilter, StoreStats, VectorStoreProvider};
use crate::config::StorageConfig;
use crate::document::Metadata;
use crate::error::Result;
use crate::fragment::{Fragment, FragmentId, RetrievalResult, Vector};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Default, Serialize, Deserialize)]
struct Indexes {
    fragments: HashMap<FragmentId, Fragment>,
    vectors: HashMap<FragmentId, Vector>,
    document_fragments: HashMap<String, Vec<FragmentId>>,
    metadata_index: HashMap<String, HashMap<String, Vec<FragmentId>>>,
}

struct State {
    indexes: Indexes,
    last_save: std::time::Instant,
}

/// Four-map in-memory store: fragments, vectors, per-document fragment ids,
/// and a metadata value index.
pub struct InMemoryVectorStore {
    state: Mutex<State>,
    config: StorageConfig,
}

impl InMemoryVectorStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            state: Mutex::new(State {
                indexes: Indexes::default(),
                last_save: std::time::Instant::now(),
            }),
            config,
        }
    }

    fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.config.persistence_path)
    }

    fn index_fragment(indexes: &mut Indexes, fragment: Fragment) {
        let id = fragment.id.clone();
        let document_id = fragment.document_id.clone();

        for (key, value) in &fragment.metadata {
            indexes
                .metadata_index
                .entry(key.clone())
                .or_default()
                .entry(value.index_key())
                .or_default()
                .push(id.clone());
        }

        if let Some(embedding) = &fragment.embedding {
            indexes.vectors.insert(id.clone(), embedding.clone());
        }
        indexes
            .document_fragments
            .entry(document_id)
            .or_default()
            .push(id.clone());
        indexes.fragments.insert(id, fragment);
    }

    /// Remove one fragment's id from every metadata-index bucket it was
    /// filed under.
    fn deindex_metadata(indexes: &mut Indexes, id: &FragmentId, metadata: &Metadata) {
        for key in metadata.keys() {
            if let Some(value_map) = indexes.metadata_index.get_mut(key) {
                for ids_for_value in value_map.values_mut() {
                    ids_for_value.retain(|existing| existing != id);
                }
            }
        }
    }

    fn remove_fragment(indexes: &mut Indexes, id: &FragmentId) -> Option<Fragment> {
        let fragment = indexes.fragments.remove(id)?;
        indexes.vectors.remove(id);
        Self::deindex_metadata(indexes, id, &fragment.metadata);
        if let Some(ids) = indexes.document_fragments.get_mut(&fragment.document_id) {
            ids.retain(|existing| existing != id);
        }
        Some(fragment)
    }

    /// Atomic write-then-rename persistence of the index files plus a
    /// last-save timestamp marker.
    fn save_to_disk(&self, indexes: &Indexes) -> Result<()> {
        let dir = self.base_path();
        std::fs::create_dir_all(&dir)?;

        write_atomic(&dir, "chunks.json", &indexes.fragments)?;
        write_atomic(&dir, "vectors.json", &indexes.vectors)?;
        write_atomic(&dir, "document_chunks.json", &indexes.document_fragments)?;
        write_atomic(&dir, "metadata_index.json", &indexes.metadata_index)?;
        std::fs::write(dir.join("timestamp.txt"), Utc::now().to_rfc3339())?;

        Ok(())
    }

    fn load_from_disk(&self) -> Result<Option<Indexes>> {
        let dir = self.base_path();
        let chunks_path = dir.join("chunks.json");
        if !chunks_path.exists() {
            return Ok(None);
        }
        let fragments: HashMap<FragmentId, Fragment> =
            serde_json::from_str(&std::fs::read_to_string(&chunks_path)?)?;
        let vectors: HashMap<FragmentId, Vector> = match std::fs::read_to_string(dir.join("vectors.json")) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(_) => HashMap::new(),
        };
        let document_fragments: HashMap<String, Vec<FragmentId>> =
            match std::fs::read_to_string(dir.join("document_chunks.json")) {
                Ok(s) => serde_json::from_str(&s)?,
                Err(_) => HashMap::new(),
            };
        let metadata_index: HashMap<String, HashMap<String, Vec<FragmentId>>> =
            match std::fs::read_to_string(dir.join("metadata_index.json")) {
                Ok(s) => serde_json::from_str(&s)?,
                Err(_) => HashMap::new(),
            };
        Ok(Some(Indexes {
            fragments,
            vectors,
            document_fragments,
            metadata_index,
        }))
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        if !self.config.persistence_enabled {
            return Ok(());
        }
        if let Some(loaded) = self.load_from_disk()? {
            let mut state = self.state.lock().expect("store mutex poisoned");
            state.indexes = loaded;
            debug!(
                fragments = state.indexes.fragments.len(),
                "restored vector store from disk"
            );
        }
        Ok(())
    }

    async fn add_fragments(&self, fragments: Vec<Fragment>) -> Result<bool> {
        let mut state = self.state.lock().expect("store mutex poisoned");

        let current_len = state.indexes.fragments.len();
        if current_len + fragments.len() > self.config.max_chunks {
            warn!(
                current = current_len,
                incoming = fragments.len(),
                max = self.config.max_chunks,
                "rejecting add: would exceed max_chunks"
            );
            return Ok(false);
        }

        for fragment in fragments {
            if fragment.embedding.is_none() {
                warn!(fragment_id = %fragment.id, "skipping fragment with no embedding");
                continue;
            }
            Self::index_fragment(&mut state.indexes, fragment);
        }

        if self.config.auto_save
            && self.config.persistence_enabled
            && state.last_save.elapsed().as_secs() >= self.config.auto_save_interval_secs
        {
            self.save_to_disk(&state.indexes)?;
            state.last_save = std::time::Instant::now();
        }

        Ok(true)
    }

    async fn search(
        &self,
        query: &Vector,
        top_k: usize,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        let state = self.state.lock().expect("store mutex poisoned");

        let candidate_ids: Vec<FragmentId> = match filters {
            Some(f) if !f.is_empty() => state
                .indexes
                .fragments
                .values()
                .filter(|frag| matches_filters(&frag.metadata, f))
                .map(|frag| frag.id.clone())
                .collect(),
            _ => state.indexes.fragments.keys().cloned().collect(),
        };

        let mut scored: Vec<(f32, FragmentId)> = candidate_ids
            .into_iter()
            .filter_map(|id| {
                let vector = state.indexes.vectors.get(&id)?;
                Some((cosine_similarity(query, vector), id))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let results = scored
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (score, id))| {
                let fragment = state.indexes.fragments.get(&id)?.clone();
                Some(RetrievalResult { fragment, score, rank })
            })
            .collect();

        Ok(results)
    }

    async fn keyword_search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        let state = self.state.lock().expect("store mutex poisoned");

        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_ascii_lowercase())
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, FragmentId)> = state
            .indexes
            .fragments
            .values()
            .filter(|frag| filters.map(|f| matches_filters(&frag.metadata, f)).unwrap_or(true))
            .filter_map(|frag| {
                let text = frag.text.to_ascii_lowercase();
                let hits = terms.iter().filter(|term| text.contains(term.as_str())).count();
                if hits == 0 {
                    return None;
                }
                Some((hits as f32 / terms.len() as f32, frag.id.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let results = scored
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (score, id))| {
                let fragment = state.indexes.fragments.get(&id)?.clone();
                Some(RetrievalResult { fragment, score, rank })
            })
            .collect();

        Ok(results)
    }

    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.indexes.fragments.get(id).cloned())
    }

    async fn get_chunks(&self, ids: &[FragmentId]) -> Result<Vec<Fragment>> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| state.indexes.fragments.get(id).cloned())
            .collect())
    }

    async fn get_document(&self, document_id: &str) -> Result<Vec<Fragment>> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .indexes
            .document_fragments
            .get(document_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.indexes.fragments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let ids = state
            .indexes
            .document_fragments
            .remove(document_id)
            .unwrap_or_default();
        for id in &ids {
            if let Some(fragment) = state.indexes.fragments.remove(id) {
                state.indexes.vectors.remove(id);
                Self::deindex_metadata(&mut state.indexes, id, &fragment.metadata);
            }
        }
        Ok(ids.len())
    }

    async fn delete_chunks(&self, ids: &[FragmentId]) -> Result<usize> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let mut removed = 0usize;
        for id in ids {
            if Self::remove_fragment(&mut state.indexes, id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn update_metadata(&self, id: &FragmentId, updates: Metadata) -> Result<bool> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if !state.indexes.fragments.contains_key(id) {
            return Ok(false);
        }

        let stale_keys: Vec<String> = updates.keys().cloned().collect();
        for key in &stale_keys {
            if let Some(value_map) = state.indexes.metadata_index.get_mut(key) {
                for ids_for_value in value_map.values_mut() {
                    ids_for_value.retain(|existing| existing != id);
                }
            }
        }

        let fragment = state.indexes.fragments.get_mut(id).expect("checked above");
        for (key, value) in updates {
            fragment.metadata.insert(key, value);
        }

        for key in &stale_keys {
            if let Some(value) = fragment.metadata.get(key) {
                state
                    .indexes
                    .metadata_index
                    .entry(key.clone())
                    .or_default()
                    .entry(value.index_key())
                    .or_default()
                    .push(id.clone());
            }
        }

        Ok(true)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(StoreStats {
            fragment_count: state.indexes.fragments.len(),
            document_count: state.indexes.document_fragments.len(),
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.indexes = Indexes::default();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.config.persistence_enabled {
            return Ok(());
        }
        let state = self.state.lock().expect("store mutex poisoned");
        self.save_to_disk(&state.indexes)
    }
}

fn write_atomic<T: Serialize>(dir: &std::path::Path, name: &str, value: &T) -> Result<()> {
    let final_path = dir.join(name);
    let tmp_path = dir.join(format!("{name}.tmp"));
    std::fs::write(&tmp_path, serde_json::to_vec(value)?)?;
    std::fs::rename(&tmp_path, &final_path)?;
    Ok(())
}
