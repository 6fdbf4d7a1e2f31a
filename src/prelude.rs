pub use crate::builder::BoundedCacheBuilder;
pub use crate::ds::{RecencyHandle, RecencyOrder, SlotArena, SlotId, SparseIndex};
pub use crate::error::{CacheError, ConfigError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::BoundedCacheMetricsSnapshot;
#[cfg(feature = "concurrency")]
pub use crate::policy::bounded::ConcurrentBoundedCache;
pub use crate::policy::bounded::{BoundedCache, CacheStats, Loader};
pub use crate::policy::prefetch::{NoPrefetch, Prefetch, ReadAhead};
pub use crate::source::{Change, ChangeKind, ListSource};
pub use crate::traits::{ObservableSource, Source};
