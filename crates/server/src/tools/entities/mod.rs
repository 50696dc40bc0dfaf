//! Entity query tools.
//!
//! All three go through the sync coordinator, so a stale table is resynced
//! before it is read.

pub mod get;
pub mod refresh;
pub mod values;

pub use get::{EntitiesGetParams, get_impl};
pub use refresh::{EntitiesRefreshParams, refresh_impl};
pub use values::{EntitiesValuesParams, values_impl};
