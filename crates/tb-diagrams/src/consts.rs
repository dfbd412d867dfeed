//! Internal constants for diagram rendering.

/// Default DPI for diagram rendering (192 = 2x for retina displays).
pub const DEFAULT_DPI: u32 = 192;

/// Standard display DPI. SVG dimensions are scaled by `STANDARD_DPI / dpi`.
pub const STANDARD_DPI: u32 = 96;

/// Default HTTP timeout for Kroki requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Kroki endpoint for Mermaid source.
pub const MERMAID_ENDPOINT: &str = "mermaid";

/// Version string of the on-disk cache layout.
pub const CACHE_VERSION: &str = "tb-diagrams-2";
