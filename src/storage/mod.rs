//! Content-Addressed File Storage
//!
//! Files are ingested into one flat root under a fresh UUID. Byte-identical
//! content is detected before copying and resolves to the entry already
//! stored, so each distinct content is kept once.
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/Data/Files/
//! ├── 0b7c...e1.png            # <uuid><ext>
//! ├── 9f12...4a.pdf
//! └── .ingest-<uuid>.part      # in-flight copy, never listed
//! ```

pub mod dedup;
pub mod hasher;
pub mod ingest;
pub mod manager;
pub mod retrieval;
pub mod root;

pub use dedup::{DuplicateResolver, DUPLICATE_COUNT};
pub use hasher::ContentHasher;
pub use ingest::{IngestOptions, IngestionPipeline};
pub use manager::FileManager;
pub use retrieval::Retrieval;
pub use root::{StorageRoot, StoredEntry};
