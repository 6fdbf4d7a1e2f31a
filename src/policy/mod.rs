//! Cache policies over a [`Source`](crate::traits::Source).

pub mod bounded;
pub mod prefetch;
