// Anonymization: name/pattern database and the redactor built on top of it.
// Nothing downstream of `redactor::anonymize` ever sees unredacted text.

pub mod names;
pub mod patterns;
pub mod redactor;

pub use patterns::PatternSet;
pub use redactor::anonymize;
