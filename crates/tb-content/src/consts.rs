//! Class names and defaults shared by the content passes.

/// Marker class the post editor puts on every line of a code block.
pub const CODE_LINE_CLASS: &str = "ql-code-block";

/// Class of the container that replaces a rendered diagram block.
pub const DIAGRAM_CLASS: &str = "mermaid-diagram";

/// Class added to every node of a block whose diagram failed to render.
pub const DIAGRAM_ERROR_CLASS: &str = "mermaid-error";

/// Prefix of diagram render ids.
pub const RENDER_ID_PREFIX: &str = "mermaid";

/// Class of the container wrapping a loading image.
pub const PLACEHOLDER_CLASS: &str = "image-placeholder";

/// Skeleton styling class, removed once the image settles.
pub const SKELETON_CLASS: &str = "skeleton";

/// Attribute holding the placeholder id on the wrapper.
pub const PLACEHOLDER_ID_ATTR: &str = "data-placeholder-id";

/// Attribute marking an image that is already complete.
pub const LOADED_ATTR: &str = "data-loaded";

/// Default minimum height of an image placeholder, in CSS pixels.
pub const DEFAULT_IMAGE_MIN_HEIGHT: u32 = 200;

/// Opacity transition applied to images while they load.
pub const IMAGE_TRANSITION: &str = "opacity 0.3s";
