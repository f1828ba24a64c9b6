pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::{split, Chunker, ChunkingConfig};
pub use error::{Error, Result};
pub use loader::{load_markdown, DocumentLoader};
pub use traits::{Completer, CompletionRequest, Embedder};
pub use types::{Chunk, QueryResult, RawDocument, SearchHit};
