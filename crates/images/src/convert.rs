//! Source-copy conversion: normalise a downloaded image into a format and
//! size the CMS can serve renditions from.

use crate::consts::SOURCE_JPEG_QUALITY;
use crate::error::{Error, Result};
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::warn;

/// Intrinsic properties of an encoded image, measured without a full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
	pub width: u32,
	pub height: u32,
	pub format: ImageFormat,
	pub is_animated: bool,
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
	/// Bounding box the converted image must fit within. Images already
	/// inside the box are left at their original size.
	pub max_width: u32,
	pub max_height: u32,
	/// Deployment overrides for the format conversion table, keyed by
	/// canonical source extension, e.g. `"tiff" => "png"`. Overrides take
	/// precedence over the built-in table.
	pub format_overrides: HashMap<String, String>,
}

impl Default for ConvertOptions {
	fn default() -> Self {
		Self {
			max_width: crate::consts::DEFAULT_MAX_SOURCE_WIDTH,
			max_height: crate::consts::DEFAULT_MAX_SOURCE_HEIGHT,
			format_overrides: HashMap::new(),
		}
	}
}

/// A converted image plus everything the caller needs to persist it without
/// re-opening the bytes.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
	pub data: Vec<u8>,
	pub width: u32,
	pub height: u32,
	pub format: ImageFormat,
	pub mime_type: String,
}

impl ConvertedImage {
	#[must_use]
	pub fn byte_size(&self) -> usize {
		self.data.len()
	}

	/// Canonical file extension for the converted format, without the dot.
	#[must_use]
	pub fn extension(&self) -> &'static str {
		self.format.extensions_str().first().map_or("img", |e| *e)
	}
}

/// Determine width, height, encoded format and animation flag of `data`.
pub fn probe(data: &[u8]) -> Result<ImageInfo> {
	let format = image::guess_format(data)?;
	let (width, height) = ImageReader::with_format(Cursor::new(data), format).into_dimensions()?;
	let is_animated = format == ImageFormat::Gif && gif_is_animated(data)?;
	Ok(ImageInfo {
		width,
		height,
		format,
		is_animated,
	})
}

/// Convert `data` into its target format, resized to fit the configured
/// bounding box. Animated GIFs are passed through untouched so the animation
/// survives.
pub fn convert(data: &[u8], options: &ConvertOptions) -> Result<ConvertedImage> {
	let info = probe(data)?;
	let target = output_format(info.format, info.is_animated, &options.format_overrides);

	if info.is_animated && target == ImageFormat::Gif {
		return Ok(ConvertedImage {
			data: data.to_vec(),
			width: info.width,
			height: info.height,
			format: ImageFormat::Gif,
			mime_type: ImageFormat::Gif.to_mime_type().to_owned(),
		});
	}

	let decoded = image::load_from_memory_with_format(data, info.format)?;
	let resized = if decoded.width() > options.max_width || decoded.height() > options.max_height {
		decoded.resize(options.max_width, options.max_height, FilterType::Lanczos3)
	} else {
		decoded
	};

	let mut out = Cursor::new(Vec::new());
	if target == ImageFormat::Jpeg {
		// JPEG has no alpha channel, and the copy is a source image rather
		// than a thumbnail, so encode from RGB at an elevated quality.
		let encoder = JpegEncoder::new_with_quality(&mut out, SOURCE_JPEG_QUALITY);
		DynamicImage::ImageRgb8(resized.to_rgb8()).write_with_encoder(encoder)?;
	} else {
		resized.write_to(&mut out, target)?;
	}

	Ok(ConvertedImage {
		width: resized.width(),
		height: resized.height(),
		data: out.into_inner(),
		format: target,
		mime_type: target.to_mime_type().to_owned(),
	})
}

/// The format conversion table. AVIF, BMP and WebP lack broad enough support
/// to serve as stored source copies; still GIFs gain nothing from staying
/// GIF. Animated GIFs keep their format so frames are preserved.
fn output_format(
	source: ImageFormat,
	is_animated: bool,
	overrides: &HashMap<String, String>,
) -> ImageFormat {
	if let Some(ext) = source.extensions_str().first() {
		if let Some(target) = overrides.get(*ext) {
			match ImageFormat::from_extension(target) {
				Some(format) => return format,
				None => {
					warn!(source = *ext, target, "ignoring unrecognised format override");
				}
			}
		}
	}

	match source {
		ImageFormat::Avif | ImageFormat::Bmp | ImageFormat::WebP => ImageFormat::Png,
		ImageFormat::Gif if !is_animated => ImageFormat::Png,
		other => other,
	}
}

fn gif_is_animated(data: &[u8]) -> Result<bool> {
	let decoder = GifDecoder::new(Cursor::new(data))?;
	let mut frames = decoder.into_frames();
	frames.next();
	Ok(matches!(frames.next(), Some(Ok(_))))
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::codecs::gif::GifEncoder;
	use image::{Frame, RgbImage, RgbaImage};
	use pretty_assertions::assert_eq;

	fn png_bytes(width: u32, height: u32) -> Vec<u8> {
		let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
			width,
			height,
			image::Rgb([120, 30, 200]),
		));
		let mut out = Cursor::new(Vec::new());
		img.write_to(&mut out, ImageFormat::Png).unwrap();
		out.into_inner()
	}

	fn encoded_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
		let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
			width,
			height,
			image::Rgb([10, 160, 90]),
		));
		let mut out = Cursor::new(Vec::new());
		img.write_to(&mut out, format).unwrap();
		out.into_inner()
	}

	fn gif_bytes(frames: usize) -> Vec<u8> {
		let mut out = Vec::new();
		{
			let mut encoder = GifEncoder::new(&mut out);
			encoder
				.encode_frames((0..frames).map(|i| {
					#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
					let shade = (i * 40) as u8;
					Frame::new(RgbaImage::from_pixel(8, 6, image::Rgba([shade, 0, 0, 255])))
				}))
				.unwrap();
		}
		out
	}

	#[test]
	fn probe_reports_dimensions_and_format() {
		let info = probe(&png_bytes(14, 9)).unwrap();
		assert_eq!(info.width, 14);
		assert_eq!(info.height, 9);
		assert_eq!(info.format, ImageFormat::Png);
		assert!(!info.is_animated);
	}

	#[test]
	fn probe_rejects_garbage() {
		assert!(matches!(probe(b"<html>not an image</html>"), Err(Error::Image(_))));
	}

	#[test]
	fn bmp_converts_to_png() {
		let converted =
			convert(&encoded_bytes(10, 10, ImageFormat::Bmp), &ConvertOptions::default()).unwrap();
		assert_eq!(converted.format, ImageFormat::Png);
		assert_eq!(converted.mime_type, "image/png");
		assert_eq!(converted.extension(), "png");
	}

	#[test]
	fn webp_converts_to_png() {
		let converted =
			convert(&encoded_bytes(10, 10, ImageFormat::WebP), &ConvertOptions::default()).unwrap();
		assert_eq!(converted.format, ImageFormat::Png);
	}

	#[test]
	fn still_gif_converts_to_png() {
		let converted = convert(&gif_bytes(1), &ConvertOptions::default()).unwrap();
		assert_eq!(converted.format, ImageFormat::Png);
	}

	#[test]
	fn animated_gif_is_preserved() {
		let source = gif_bytes(3);
		let converted = convert(&source, &ConvertOptions::default()).unwrap();
		assert_eq!(converted.format, ImageFormat::Gif);
		assert_eq!(converted.data, source);
		assert_eq!(converted.width, 8);
		assert_eq!(converted.height, 6);
	}

	#[test]
	fn jpeg_stays_jpeg() {
		let converted =
			convert(&encoded_bytes(12, 8, ImageFormat::Jpeg), &ConvertOptions::default()).unwrap();
		assert_eq!(converted.format, ImageFormat::Jpeg);
		assert_eq!(converted.mime_type, "image/jpeg");
	}

	#[test]
	fn oversized_images_fit_within_bounds() {
		let options = ConvertOptions {
			max_width: 10,
			max_height: 10,
			..ConvertOptions::default()
		};
		let converted = convert(&png_bytes(40, 20), &options).unwrap();
		assert_eq!((converted.width, converted.height), (10, 5));
	}

	#[test]
	fn small_images_are_not_upscaled() {
		let converted = convert(&png_bytes(4, 3), &ConvertOptions::default()).unwrap();
		assert_eq!((converted.width, converted.height), (4, 3));
	}

	#[test]
	fn metadata_matches_output_bytes() {
		let converted =
			convert(&encoded_bytes(6, 6, ImageFormat::Bmp), &ConvertOptions::default()).unwrap();
		assert_eq!(converted.byte_size(), converted.data.len());
		let reread = probe(&converted.data).unwrap();
		assert_eq!(reread.format, converted.format);
		assert_eq!((reread.width, reread.height), (converted.width, converted.height));
	}

	#[test]
	fn override_takes_precedence_over_table() {
		let mut overrides = HashMap::new();
		overrides.insert("png".to_owned(), "jpeg".to_owned());
		assert_eq!(output_format(ImageFormat::Png, false, &overrides), ImageFormat::Jpeg);
	}

	#[test]
	fn unknown_override_target_falls_back() {
		let mut overrides = HashMap::new();
		overrides.insert("bmp".to_owned(), "sprocket".to_owned());
		assert_eq!(output_format(ImageFormat::Bmp, false, &overrides), ImageFormat::Png);
	}

	#[test]
	fn conversion_table_defaults() {
		let none = HashMap::new();
		assert_eq!(output_format(ImageFormat::Avif, false, &none), ImageFormat::Png);
		assert_eq!(output_format(ImageFormat::Bmp, false, &none), ImageFormat::Png);
		assert_eq!(output_format(ImageFormat::WebP, false, &none), ImageFormat::Png);
		assert_eq!(output_format(ImageFormat::Gif, false, &none), ImageFormat::Png);
		assert_eq!(output_format(ImageFormat::Gif, true, &none), ImageFormat::Gif);
		assert_eq!(output_format(ImageFormat::Tiff, false, &none), ImageFormat::Tiff);
	}
}
