// ============================================================
// Infrastructure Layer
// ============================================================
//   config_store.rs — Persists TextCrnnConfig as JSON so the
//                     same topology can be rebuilt later.
//
// File-system code returns anyhow::Result with context; the
// model layers keep their typed CrnnError.

/// TextCrnnConfig JSON persistence
pub mod config_store;
