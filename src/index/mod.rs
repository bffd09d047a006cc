//! Index construction and the query facade.
//!
//! [`builder`] walks parsed translation units into the schema store;
//! [`IndexEngine`] owns the store connection and the in-memory unit map and
//! exposes construction, incremental update and the query surface.

pub mod builder;
pub mod engine;
pub mod error;
pub mod progress;

pub use engine::{EngineOptions, IncludeEntry, IndexEngine, IndexedFile, ReferenceSite};
pub use error::IndexError;
pub use progress::{ProgressEvent, ProgressObserver};
