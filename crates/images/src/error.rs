pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("error while loading the image (via the `image` crate): {0}")]
	Image(#[from] image::ImageError),
	#[error("focus point ({x}, {y}) lies outside the source image bounds ({width}x{height})")]
	FocusPointOutOfBounds {
		x: u32,
		y: u32,
		width: u32,
		height: u32,
	},
	#[error("cannot compute a focal area for an image with a zero dimension")]
	EmptyImage,
}
