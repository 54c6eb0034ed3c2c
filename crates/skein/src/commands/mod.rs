//! CLI command implementations.

pub(crate) mod fedi;
pub(crate) mod hn;

pub(crate) use fedi::FediArgs;
pub(crate) use hn::HnArgs;
