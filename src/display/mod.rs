//! Display mode catalog and closest-mode matching
//!
//! The platform layer hands in raw [`ModeDescriptor`]s per display,
//! [`build_catalog`] turns them into an ordered [`Catalog`], and the matcher
//! picks a mode for a [`Query`]. Nothing here touches hardware.

mod catalog;
mod error;
mod matcher;
mod mode;
mod query;

pub use catalog::{Catalog, ModeDescriptor, build_catalog};
pub use error::QueryError;
pub use matcher::{MatchTier, ModeMatch, find_exact, find_highest, find_match};
pub use mode::DisplayMode;
pub use query::{HidpiPolicy, Query};
