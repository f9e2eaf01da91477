//! Unique id allocation for log keys.
//!
//! Every log key ends with an id drawn from an [`Allocator`]. Ids are never
//! reused, which is what keeps keys of successfully written logs unique.

use crate::error::{AllocError, AllocResult};
use binlog_codec::UniqueId;
use parking_lot::Mutex;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A source of monotonically increasing unique ids.
pub trait Allocator: Send + Sync {
    /// Allocates one id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id space is exhausted or the allocator is
    /// unavailable.
    fn alloc_one(&self) -> AllocResult<UniqueId>;

    /// Opens a lazy sequence of exactly `count` ids.
    ///
    /// Each `next()` performs one allocation. Closing or dropping the
    /// sequence releases it; no further ids are yielded.
    fn open_sequence(&self, count: usize) -> IdSequence<'_> {
        IdSequence::new(count, move || self.alloc_one())
    }
}

impl<T: Allocator + ?Sized> Allocator for Arc<T> {
    fn alloc_one(&self) -> AllocResult<UniqueId> {
        (**self).alloc_one()
    }

    fn open_sequence(&self, count: usize) -> IdSequence<'_> {
        (**self).open_sequence(count)
    }
}

type NextId<'a> = Box<dyn FnMut() -> AllocResult<UniqueId> + Send + 'a>;
type CloseHook<'a> = Box<dyn FnOnce() + Send + 'a>;

/// A finite, forward-only sequence of freshly allocated ids.
///
/// Yields at most the requested number of ids. Iteration stops at the first
/// allocation error, after [`close`](Self::close), or when the sequence is
/// used up.
pub struct IdSequence<'a> {
    remaining: usize,
    closed: bool,
    next_id: NextId<'a>,
    on_close: Option<CloseHook<'a>>,
}

impl<'a> IdSequence<'a> {
    /// Creates a sequence that draws `count` ids from `next_id`.
    pub fn new<F>(count: usize, next_id: F) -> Self
    where
        F: FnMut() -> AllocResult<UniqueId> + Send + 'a,
    {
        Self {
            remaining: count,
            closed: false,
            next_id: Box::new(next_id),
            on_close: None,
        }
    }

    /// Registers a hook run once when the sequence is closed or dropped.
    #[must_use]
    pub fn with_close_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'a,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Returns how many ids may still be yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Returns true once the sequence has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the sequence early.
    pub fn close(&mut self) {
        self.remaining = 0;
        self.closed = true;
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }
}

impl Iterator for IdSequence<'_> {
    type Item = AllocResult<UniqueId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match (self.next_id)() {
            Ok(id) => {
                self.remaining -= 1;
                Some(Ok(id))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for IdSequence<'_> {}

impl Drop for IdSequence<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for IdSequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdSequence")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct AllocState {
    next: UniqueId,
    allocated: u64,
}

/// In-process allocator handing out consecutive ids.
///
/// Suitable for single-node deployments and tests. An optional ceiling
/// makes the allocator fail with [`AllocError::Exhausted`] once reached.
#[derive(Debug)]
pub struct LocalAllocator {
    state: Mutex<AllocState>,
    ceiling: Option<UniqueId>,
    open_sequences: Arc<AtomicUsize>,
}

impl LocalAllocator {
    /// Creates an allocator whose first id is `start`.
    pub fn new(start: UniqueId) -> Self {
        Self {
            state: Mutex::new(AllocState {
                next: start,
                allocated: 0,
            }),
            ceiling: None,
            open_sequences: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Caps the highest id this allocator may hand out.
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: UniqueId) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Returns the number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.state.lock().allocated
    }

    /// Returns the id the next allocation will yield.
    pub fn peek_next(&self) -> UniqueId {
        self.state.lock().next
    }

    /// Returns the number of sequences opened and not yet closed.
    pub fn open_sequences(&self) -> usize {
        self.open_sequences.load(Ordering::SeqCst)
    }
}

impl Default for LocalAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Allocator for LocalAllocator {
    fn alloc_one(&self) -> AllocResult<UniqueId> {
        let mut state = self.state.lock();
        let id = state.next;
        let exhausted = match self.ceiling {
            Some(ceiling) => id > ceiling,
            None => id == UniqueId::MAX,
        };
        if exhausted {
            return Err(AllocError::Exhausted {
                ceiling: self.ceiling.unwrap_or(UniqueId::MAX),
            });
        }
        state.next = id + 1;
        state.allocated += 1;
        Ok(id)
    }

    fn open_sequence(&self, count: usize) -> IdSequence<'_> {
        let open = Arc::clone(&self.open_sequences);
        open.fetch_add(1, Ordering::SeqCst);
        IdSequence::new(count, move || self.alloc_one()).with_close_hook(move || {
            open.fetch_sub(1, Ordering::SeqCst);
        })
    }
}
