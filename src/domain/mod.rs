// ============================================================
// Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//
//   error.rs     — CrnnError, every construction-time failure
//   mode.rs      — Mode (training / inference) and the
//                  per-pass ForwardOptions
//   embedding.rs — EmbeddingType and the PretrainedEmbedding
//                  matrix handed in by a collaborator
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - Only structs, enums and validation

/// Construction-time error type
pub mod error;

/// Training / inference switch and per-pass options
pub mod mode;

/// Embedding initialisation modes and pretrained matrices
pub mod embedding;
