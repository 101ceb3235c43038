//! SealCalc Core - Seal Configuration to Layered Preview
//!
//! # Data flow
//! 1. Option Catalog seeds the Selection
//! 2. Selection is the single source of truth
//! 3. Preview and Save each read a snapshot of it
//! 4. Previews are replaced whole, never merged
//! 5. Layers stack in list order, first at the bottom
//! 6. Network failures are absorbed where they happen

pub mod catalog;
pub mod selection;
pub mod validation;
pub mod hashing;
pub mod compositor;
pub mod config;
pub mod client;
pub mod session;

pub use catalog::{Attribute, CatalogState, OptionCatalog, NO_HAIR};
pub use selection::{SealSubmission, Selection};
pub use validation::{is_legal, DomainViolation, ValidationResult, ValidationRule, Validator};
pub use hashing::{canonical_json, selection_fingerprint};
pub use compositor::{Composition, LayerCanvas, PreviewResult, Surface};
pub use config::{ClientConfig, ConfigError};
pub use client::{ApiError, HttpSealApi, PersistedSeal, SealApi, SealId};
pub use session::{Clock, PreviewOutcome, Session, SessionError, SystemClock};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
