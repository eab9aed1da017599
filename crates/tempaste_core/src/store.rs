//! Expiring in-memory paste store.
//!
//! Every record lives for a fixed TTL measured from its most recent insertion.
//! Deadlines are kept in one min-heap and drained by a single background reaper
//! task; there is no per-record timer. Each insertion stamps the record with a
//! fresh generation number, so heap entries left behind by a replaced or
//! deleted record are recognised as stale and skipped.
//!
//! Reads never extend a record's lifetime. A record whose deadline has passed
//! is treated as absent even if the reaper has not reached it yet.

use crate::constants::{DEFAULT_MAX_PASTE_SIZE, PASTE_TTL};
use crate::error::AppError;
use crate::generator::is_valid_id;
use crate::models::PasteRecord;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Entry {
    content: Arc<str>,
    created_at: DateTime<Utc>,
    view_count: u64,
    expires_at: Instant,
    generation: u64,
}

impl Entry {
    fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    fn snapshot(&self, id: &str) -> PasteRecord {
        PasteRecord {
            id: id.to_string(),
            content: self.content.to_string(),
            created_at: self.created_at,
            view_count: self.view_count,
        }
    }
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    deadlines: BinaryHeap<Reverse<(Instant, u64, String)>>,
    next_generation: u64,
}

impl StoreState {
    /// Insert or replace `id` and arm its deadline.
    ///
    /// Returns `true` when the new deadline became the earliest one, meaning
    /// the reaper has to re-plan its sleep.
    fn arm(&mut self, id: &str, content: Arc<str>, ttl: Duration, now: Instant) -> bool {
        self.next_generation += 1;
        let generation = self.next_generation;
        let expires_at = now + ttl;
        self.entries.insert(
            id.to_string(),
            Entry {
                content,
                created_at: Utc::now(),
                view_count: 0,
                expires_at,
                generation,
            },
        );
        self.deadlines
            .push(Reverse((expires_at, generation, id.to_string())));
        matches!(self.deadlines.peek(), Some(Reverse((_, g, _))) if *g == generation)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(Reverse((deadline, _, _))) = self.deadlines.peek() {
            if *deadline > now {
                break;
            }
            let Some(Reverse((_, generation, id))) = self.deadlines.pop() else {
                break;
            };
            // Only the generation that armed this deadline may remove the record.
            let current = self
                .entries
                .get(&id)
                .is_some_and(|entry| entry.generation == generation);
            if current {
                self.entries.remove(&id);
                removed += 1;
                tracing::debug!("Paste {} expired", id);
            }
        }
        removed
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.peek().map(|Reverse((deadline, _, _))| *deadline)
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    ttl: Duration,
    max_content_size: usize,
    wake: Arc<Notify>,
    reaper: OnceLock<JoinHandle<()>>,
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        // Every mutation completes before the guard drops, so a poisoned
        // state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn validate(&self, id: &str, size: usize) -> Result<(), AppError> {
        if !is_valid_id(id) {
            return Err(AppError::InvalidId(id.to_string()));
        }
        if size > self.max_content_size {
            return Err(AppError::PayloadTooLarge {
                limit: self.max_content_size,
            });
        }
        Ok(())
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
    }
}

/// Concurrent paste map with per-record expiry.
///
/// Cloning is cheap and every clone shares the same records. The background
/// reaper stops once the last clone is dropped.
#[derive(Clone)]
pub struct PasteStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for PasteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasteStore")
            .field("ttl", &self.inner.ttl)
            .field("max_content_size", &self.inner.max_content_size)
            .field("live", &self.len())
            .finish()
    }
}

impl Default for PasteStore {
    fn default() -> Self {
        Self::new(PASTE_TTL)
    }
}

impl PasteStore {
    /// Create a store with the default content size limit.
    ///
    /// Must be called inside a tokio runtime for records to be reaped in the
    /// background. Without one, expired records are dropped on the next write.
    pub fn new(ttl: Duration) -> Self {
        Self::with_limits(ttl, DEFAULT_MAX_PASTE_SIZE)
    }

    /// Create a store with an explicit TTL and maximum content size in bytes.
    pub fn with_limits(ttl: Duration, max_content_size: usize) -> Self {
        let inner = Arc::new(StoreInner {
            state: Mutex::new(StoreState::default()),
            ttl,
            max_content_size,
            wake: Arc::new(Notify::new()),
            reaper: OnceLock::new(),
        });

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(reap_expired(
                    Arc::downgrade(&inner),
                    Arc::clone(&inner.wake),
                ));
                let _ = inner.reaper.set(task);
            }
            Err(_) => {
                tracing::warn!("No tokio runtime available; expired pastes are purged on write");
            }
        }

        Self { inner }
    }

    /// Lifetime applied to every insertion.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Largest accepted content size in bytes.
    pub fn max_content_size(&self) -> usize {
        self.inner.max_content_size
    }

    /// Insert or replace the paste stored under `id`.
    ///
    /// A replaced paste starts over: fresh creation time, zero views and a
    /// full TTL. The previous deadline is cancelled.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidId`] for malformed ids and
    /// [`AppError::PayloadTooLarge`] when `content` exceeds the size limit.
    pub fn put(&self, id: &str, content: impl Into<Arc<str>>) -> Result<(), AppError> {
        let content = content.into();
        self.inner.validate(id, content.len())?;
        let rearm = {
            let mut state = self.inner.lock_state();
            let now = Instant::now();
            self.purge_without_reaper(&mut state, now);
            state.arm(id, content, self.inner.ttl, now)
        };
        if rearm {
            self.inner.wake.notify_one();
        }
        Ok(())
    }

    /// Insert a paste only if no live paste holds `id`.
    ///
    /// # Errors
    /// Returns [`AppError::IdentifierCollision`] when `id` is live, plus the
    /// validation errors of [`PasteStore::put`].
    pub fn insert_new(&self, id: &str, content: impl Into<Arc<str>>) -> Result<(), AppError> {
        let content = content.into();
        let size = content.len();
        self.insert_received(id, content, size)
    }

    /// [`PasteStore::insert_new`] for content decoded from a client payload.
    ///
    /// The size limit applies to `received_len`, the payload length as it
    /// arrived, since lossy decoding can grow the stored text.
    pub(crate) fn insert_received(
        &self,
        id: &str,
        content: Arc<str>,
        received_len: usize,
    ) -> Result<(), AppError> {
        self.inner.validate(id, received_len)?;
        let rearm = {
            let mut state = self.inner.lock_state();
            let now = Instant::now();
            self.purge_without_reaper(&mut state, now);
            if state
                .entries
                .get(id)
                .is_some_and(|entry| entry.is_live_at(now))
            {
                return Err(AppError::IdentifierCollision(id.to_string()));
            }
            state.arm(id, content, self.inner.ttl, now)
        };
        if rearm {
            self.inner.wake.notify_one();
        }
        Ok(())
    }

    /// Fetch a live paste and count the read as one view.
    ///
    /// Returns `None` both for ids that never existed and for expired ones.
    pub fn get(&self, id: &str) -> Option<PasteRecord> {
        let mut state = self.inner.lock_state();
        let now = Instant::now();
        match state.entries.get_mut(id) {
            Some(entry) if entry.is_live_at(now) => {
                entry.view_count += 1;
                return Some(entry.snapshot(id));
            }
            Some(_) => {}
            None => return None,
        }
        // Deadline passed but the reaper has not run yet.
        state.entries.remove(id);
        tracing::debug!("Paste {} expired", id);
        None
    }

    /// Fetch a live paste without counting a view.
    pub fn peek(&self, id: &str) -> Option<PasteRecord> {
        let state = self.inner.lock_state();
        let now = Instant::now();
        state
            .entries
            .get(id)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.snapshot(id))
    }

    /// Remove a paste before its deadline.
    ///
    /// # Returns
    /// `true` when a live paste was removed.
    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.inner.lock_state();
        let now = Instant::now();
        state
            .entries
            .remove(id)
            .is_some_and(|entry| entry.is_live_at(now))
    }

    /// Remove every paste whose deadline has passed.
    ///
    /// # Returns
    /// Number of pastes removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock_state().purge_expired(Instant::now())
    }

    fn purge_without_reaper(&self, state: &mut StoreState, now: Instant) {
        if self.inner.reaper.get().is_none() {
            state.purge_expired(now);
        }
    }

    /// Number of live pastes.
    pub fn len(&self) -> usize {
        let state = self.inner.lock_state();
        let now = Instant::now();
        state
            .entries
            .values()
            .filter(|entry| entry.is_live_at(now))
            .count()
    }

    /// Whether the store holds no live pastes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn reap_expired(store: Weak<StoreInner>, wake: Arc<Notify>) {
    loop {
        let next = {
            let Some(inner) = store.upgrade() else {
                return;
            };
            let mut state = inner.lock_state();
            let removed = state.purge_expired(Instant::now());
            if removed > 0 {
                tracing::info!("Expired {} paste(s)", removed);
            }
            state.next_deadline()
        };

        match next {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = wake.notified() => {}
                }
            }
            None => wake.notified().await,
        }
    }
}
