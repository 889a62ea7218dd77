//! Scripted session against a file-backed cache.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_core::{CacheConfig, CacheError, Entity, EntityId};
use tessera_storage::{Cache, CacheStats, JsonLinesStore, JsonSerializer, LoggingObserver, Observer};
use thiserror::Error;

/// Why a session could not run to completion.
#[derive(Debug, Error)]
pub enum WalkthroughError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Sample entity stored by the demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: EntityId,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub race: String,
}

impl Dog {
    fn new(id: EntityId, name: &str, height: i32, weight: i32, race: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            height,
            weight,
            race: race.to_string(),
        }
    }
}

impl Entity for Dog {
    fn id(&self) -> EntityId {
        self.id
    }
}

type DogCache = Cache<Dog, JsonLinesStore, JsonSerializer<Dog>>;

/// What the session observed.
#[derive(Debug, Clone)]
pub struct Report {
    pub added: bool,
    pub duplicate_rejected: bool,
    pub updated: bool,
    pub removed: bool,
    pub gone_after_remove: bool,
    pub reader_saw_update: bool,
    pub stats: CacheStats,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.added
            && self.duplicate_rejected
            && self.updated
            && self.removed
            && self.gone_after_remove
            && self.reader_saw_update
    }
}

/// Run the session described by `config`.
pub fn run(config: &CacheConfig) -> Result<Report, WalkthroughError> {
    let store = Arc::new(JsonLinesStore::from_config(config).map_err(CacheError::from)?);
    let cache: Arc<DogCache> = Arc::new(Cache::new(
        Arc::clone(&store),
        config.mode,
        Arc::new(JsonSerializer::new()),
    )?);
    let next = store
        .max_id()
        .map_err(CacheError::from)?
        .map_or(0, |id| id.get() + 1);
    tracing::info!(
        mode = %cache.mode(),
        path = %store.path().display(),
        count = cache.len(),
        "Cache attached"
    );

    let user_a: Arc<dyn Observer<Dog>> = Arc::new(LoggingObserver::new("User A"));
    let user_b: Arc<dyn Observer<Dog>> = Arc::new(LoggingObserver::new("User B"));
    cache.register(Arc::clone(&user_a));
    cache.register(Arc::clone(&user_b));

    let id = EntityId::new(next);
    let dog = Dog::new(id, "Starky", 10, 35, "Amstaf");
    let added = cache.add(dog.clone())?;
    let duplicate_rejected = !cache.add(dog.clone())?;

    let renamed = Dog::new(id, "My", 20, 40, "MyRace");
    let updated = cache.update(renamed.clone())? && cache.get(id) == Some(renamed.clone());

    let removed = cache.remove(&renamed)?;
    let gone_after_remove = cache.get(id).is_none();

    let reader_saw_update = visibility_check(&cache, EntityId::new(next + 1))?;

    cache.unregister(&user_a);
    cache.unregister(&user_b);

    let stats = cache.stats();
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        store_fetches = stats.store_fetches,
        hit_rate = stats.hit_rate(),
        "Session finished"
    );

    Ok(Report {
        added,
        duplicate_rejected,
        updated,
        removed,
        gone_after_remove,
        reader_saw_update,
        stats,
    })
}

/// One thread updates an entity shortly after start; a second reads it
/// later and must see the update.
fn visibility_check(cache: &Arc<DogCache>, id: EntityId) -> Result<bool, WalkthroughError> {
    let old = Dog::new(id, "old", 10, 20, "a");
    let new = Dog::new(id, "new", 20, 30, "b");
    cache.add(old)?;

    let writer = {
        let cache = Arc::clone(cache);
        let new = new.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            cache.update(new)
        })
    };
    let reader = {
        let cache = Arc::clone(cache);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            cache.get(id)
        })
    };

    let wrote = join(writer, "writer")??;
    let seen = join(reader, "reader")?;
    let passed = wrote && seen.as_ref() == Some(&new);

    if let Some(dog) = seen {
        cache.remove(&dog)?;
    }
    Ok(passed)
}

fn join<R>(handle: thread::JoinHandle<R>, role: &'static str) -> Result<R, WalkthroughError> {
    handle
        .join()
        .map_err(|_| WalkthroughError::WorkerPanicked(role))
}
