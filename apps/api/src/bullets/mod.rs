// Bullet post-processing applied to LLM-tailored résumé lines before rendering.
// Pure string transforms: safe to call from any number of handlers concurrently.

pub mod handlers;
pub mod normalizer;

pub use normalizer::{normalize, normalize_with_report, NormalizationReason, NormalizedBullet};
