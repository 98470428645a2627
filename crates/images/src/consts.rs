/// Default bounding box for converted source images.
///
/// Downloads are resized to fit within this box (never upscaled). Large
/// enough that renditions generated from the copy stay sharp, small enough
/// that a 100MP original doesn't land in the media store as-is.
pub const DEFAULT_MAX_SOURCE_WIDTH: u32 = 3500;
pub const DEFAULT_MAX_SOURCE_HEIGHT: u32 = 3500;

/// JPEG quality used when re-encoding a source copy.
///
/// Higher than the usual rendition quality: the output is the canonical
/// stored file, not a thumbnail.
pub(crate) const SOURCE_JPEG_QUALITY: u8 = 90;
