//! Chunk boundary validation and text preparation.
//!
//! - **Pre-chunking**: splits long documents into bounded segments
//! - **Gap classification**: decides whether uncovered text is tolerable
//! - **Boundary validation**: verifies a model's claimed chunking
//! - **Cleaning**: applies model-suggested text removals

pub mod cleaning;
pub mod gap;
pub mod prechunk;
pub mod validator;

pub use cleaning::{CleaningOutcome, TextRemoval, apply_removals};
pub use gap::{GapClassification, GapClassifier};
pub use prechunk::{PreChunker, PreChunks, Segment, pre_chunk, should_use_simplified_prompt};
pub use validator::{ChunkBoundaryValidator, ValidationReport};

/// Default longest tolerated gap in characters.
pub const DEFAULT_GAP_TOLERANCE: usize = 1;

/// Default pre-chunk segment size in characters.
pub const DEFAULT_PRE_CHUNK_SIZE: usize = 1500;

/// Default longest accepted chunk in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 2000;

/// Default distance, in characters, a removal may drift from its claimed
/// position.
pub const DEFAULT_TEXT_REMOVAL_TOLERANCE: usize = 35;
