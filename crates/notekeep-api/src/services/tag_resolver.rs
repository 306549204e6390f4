//! Get-or-create resolution of tag names to tag ids.
//!
//! ## Resolution Order
//!
//! 1. Normalize (trim, lower-case) and validate the name
//! 2. Cache lookup
//! 3. Store lookup by normalized name
//! 4. Create the tag
//! 5. If creation lost a race to a concurrent writer, re-fetch the winner
//!
//! Only tags found as already existing are cached. Tags are never deleted, so
//! those ids stay valid; a tag created in the current unit of work is not
//! cached because the unit of work may still roll back.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use notekeep_core::{
    normalize_tag_name, validate_tag_name, CreateOutcome, Error, Result, TagId, TagStore,
};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Default number of cached name → id entries.
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Outcome of resolving one tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
    pub id: TagId,
    /// Normalized name
    pub name: String,
    /// True if this call inserted the tag
    pub created: bool,
}

/// Resolves tag names to ids, creating missing tags.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct TagResolver {
    cache: Arc<Mutex<LruCache<String, TagId>>>,
}

impl Default for TagResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TagResolver {
    /// Create a new TagResolver with a 1000-entry LRU cache.
    pub fn new() -> Self {
        Self::with_cache_size(NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn with_cache_size(size: NonZeroUsize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(size))),
        }
    }

    /// Resolve a raw tag name to a tag id, creating the tag if needed.
    ///
    /// Blank names are rejected with `InvalidInput`; callers are expected to
    /// drop them beforehand. `StoreUnavailable` propagates unchanged.
    pub async fn resolve<S>(&self, store: &mut S, raw_name: &str) -> Result<ResolvedTag>
    where
        S: TagStore + ?Sized,
    {
        let name = normalize_tag_name(raw_name)
            .ok_or_else(|| Error::InvalidInput("Tag name cannot be empty".to_string()))?;
        validate_tag_name(&name)?;

        if let Some(id) = self.cache.lock().await.get(&name).copied() {
            trace!(subsystem = "tags", component = "tag_resolver", tag_id = id, tag_name = %name, "Cache hit");
            return Ok(ResolvedTag {
                id,
                name,
                created: false,
            });
        }

        if let Some(tag) = store.find_tag_by_name(&name).await? {
            self.remember(&name, tag.id).await;
            return Ok(ResolvedTag {
                id: tag.id,
                name,
                created: false,
            });
        }

        match store.create_tag(&name).await? {
            CreateOutcome::Created(tag) => {
                debug!(
                    subsystem = "tags",
                    component = "tag_resolver",
                    op = "resolve",
                    tag_id = tag.id,
                    tag_name = %name,
                    "Created tag"
                );
                Ok(ResolvedTag {
                    id: tag.id,
                    name,
                    created: true,
                })
            }
            CreateOutcome::AlreadyExists => {
                warn!(
                    subsystem = "tags",
                    component = "tag_resolver",
                    op = "resolve",
                    tag_name = %name,
                    "Lost tag creation race, re-fetching"
                );
                let tag = store.find_tag_by_name(&name).await?.ok_or_else(|| {
                    Error::Internal(format!(
                        "tag '{}' reported as existing but could not be fetched",
                        name
                    ))
                })?;
                self.remember(&name, tag.id).await;
                Ok(ResolvedTag {
                    id: tag.id,
                    name,
                    created: false,
                })
            }
        }
    }

    /// Number of cached names.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn remember(&self, name: &str, id: TagId) {
        self.cache.lock().await.put(name.to_string(), id);
    }
}
