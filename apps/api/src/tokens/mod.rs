// Design-token translation: one JSON document drives the SCSS/CSS variables, the
// spacing rules for screen and print, and the DOCX paragraph spacing.
// Also hosts the CI lint suite (orphans, import lockfile, generated drift).

pub mod checks;
pub mod document;
pub mod emit;
pub mod flatten;
pub mod handlers;
pub mod lockfile;
pub mod manifest;
pub mod orphans;
pub mod spacing;
pub mod units;

pub use document::{TokenDocument, TokenLeaf};
pub use emit::{render_artifacts, write_artifacts, Translation};
pub use spacing::{build_rule_set, RuleMap, SpacingRuleSet};
