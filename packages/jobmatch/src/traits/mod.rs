//! Collaborator seams consumed by the engine.
//!
//! The engine owns no browser, model, or database of its own; the host
//! process supplies implementations of these traits.

pub mod ai;
pub mod browser;
pub mod sink;
pub mod store;

pub use ai::{Embedder, Generator};
pub use browser::{BrowserDriver, PageLink, ScrollState};
pub use sink::{ActivitySink, TracingSink};
pub use store::{
    ApplicationStore, CompanyStore, EmbeddingCacheStore, EngineStore, InsertOutcome,
};
