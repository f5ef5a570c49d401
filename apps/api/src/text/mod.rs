// Text signals computed locally, before any LLM call.
// normalize: Arabic normalization. dialect: dialect markers and complexity.

pub mod dialect;
pub mod normalize;

pub use dialect::{detect_dialect, estimate_complexity, Dialect, DialectProfile};
pub use normalize::{arabic_ratio, normalize_arabic};
