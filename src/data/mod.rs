// ============================================================
// Data Layer
// ============================================================
// Turns already-tokenised, already-padded examples into the
// tensor pair a TextCrnn pass consumes:
//
//   ClassificationSample   → token ids + multi-hot labels,
//       │                    checked against TextCrnnConfig
//       ▼
//   ClassificationBatcher  → burn Batcher, stacks samples into
//                            input_x [N, seq] / input_y [N, C]
//
// Reading corpora, building vocabularies and padding live with
// the caller.

/// Sample type and burn Batcher implementation
pub mod batcher;
