pub mod order_tree;
pub mod recency;
pub mod slot_arena;
pub mod sparse_index;

pub use order_tree::NodeId;
pub use recency::{RecencyHandle, RecencyOrder};
pub use slot_arena::{SlotArena, SlotId};
pub use sparse_index::{Cursor, FilledIter, Iter, SparseIndex};
