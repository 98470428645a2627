//! Focal area geometry.
//!
//! Bynder supplies a single focus *point* against the original upload; the
//! CMS wants a rectangular focal *area* against the (possibly resized)
//! stored copy. This module does the translation: scale the point onto the
//! stored raster, then grow a square around it, bounded by the image edges
//! and capped at 40% of each stored dimension.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPoint {
	pub x: u32,
	pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
	pub width: u32,
	pub height: u32,
}

impl Dimensions {
	#[must_use]
	pub const fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}
}

/// A square focal region, expressed as a centre point plus side lengths.
/// `width == height` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocalRect {
	pub x: u32,
	pub y: u32,
	pub width: u32,
	pub height: u32,
}

/// Translate a focus point on the `source` image into a focal rect on the
/// `stored` image.
///
/// Fails when the point lies outside the source bounds (the boundaries
/// themselves are valid) or when either image has a zero dimension. Both
/// failures are recoverable: a caller can keep the rest of a sync and just
/// skip the focal area.
pub fn focal_rect_from_point(
	point: FocusPoint,
	source: Dimensions,
	stored: Dimensions,
) -> Result<FocalRect> {
	if source.width == 0 || source.height == 0 || stored.width == 0 || stored.height == 0 {
		return Err(Error::EmptyImage);
	}
	if point.x > source.width || point.y > source.height {
		return Err(Error::FocusPointOutOfBounds {
			x: point.x,
			y: point.y,
			width: source.width,
			height: source.height,
		});
	}

	// Scale the point onto the stored raster. Integer multiply-then-divide
	// is exactly the floor-rounded division the downstream cropper expects.
	let (mut x, mut y) = (point.x, point.y);
	if stored.height != source.height {
		x = scale(x, stored.height, source.height);
		y = scale(y, stored.height, source.height);
	}
	// The scale factor comes from the heights, so a conversion that changed
	// the aspect ratio can push x past the stored width. Pin it back inside.
	x = x.min(stored.width);
	y = y.min(stored.height);

	// Span outwards from the centre until an edge is hit, independently per
	// axis, capping each candidate at 40% of the stored dimension.
	let width_candidate = (2 * x.min(stored.width - x)).min(stored.width * 2 / 5);
	let height_candidate = (2 * y.min(stored.height - y)).min(stored.height * 2 / 5);

	// The shorter span wins so the region stays square.
	let side = width_candidate.min(height_candidate);
	Ok(FocalRect {
		x,
		y,
		width: side,
		height: side,
	})
}

const fn scale(value: u32, stored_extent: u32, source_extent: u32) -> u32 {
	#[allow(clippy::as_conversions)]
	let scaled = (value as u64) * (stored_extent as u64) / (source_extent as u64);
	#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
	{
		scaled as u32
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn scales_and_squares_a_resized_focus_point() {
		// 3000x2008 original resized down to a 50x33 stored copy.
		let rect = focal_rect_from_point(
			FocusPoint { x: 541, y: 550 },
			Dimensions::new(3000, 2008),
			Dimensions::new(50, 33),
		)
		.unwrap();
		assert_eq!(rect, FocalRect { x: 8, y: 9, width: 13, height: 13 });
	}

	#[test]
	fn unresized_image_keeps_the_point() {
		let rect = focal_rect_from_point(
			FocusPoint { x: 50, y: 50 },
			Dimensions::new(100, 100),
			Dimensions::new(100, 100),
		)
		.unwrap();
		assert_eq!((rect.x, rect.y), (50, 50));
		// Centred point spans 100 in both directions, capped at 40%.
		assert_eq!(rect.width, 40);
		assert_eq!(rect.height, 40);
	}

	#[test]
	fn edge_points_produce_an_empty_region() {
		let rect = focal_rect_from_point(
			FocusPoint { x: 0, y: 40 },
			Dimensions::new(100, 80),
			Dimensions::new(100, 80),
		)
		.unwrap();
		assert_eq!(rect.width, 0);
	}

	#[test]
	fn boundary_coordinates_are_accepted() {
		let source = Dimensions::new(100, 80);
		assert!(focal_rect_from_point(FocusPoint { x: 0, y: 0 }, source, source).is_ok());
		assert!(focal_rect_from_point(FocusPoint { x: 100, y: 80 }, source, source).is_ok());
	}

	#[test]
	fn out_of_bounds_coordinates_are_rejected() {
		let source = Dimensions::new(100, 80);
		let result = focal_rect_from_point(FocusPoint { x: 101, y: 10 }, source, source);
		assert!(matches!(result, Err(Error::FocusPointOutOfBounds { .. })));
		let result = focal_rect_from_point(FocusPoint { x: 10, y: 81 }, source, source);
		assert!(matches!(result, Err(Error::FocusPointOutOfBounds { .. })));
	}

	#[test]
	fn zero_dimensions_are_rejected() {
		let result = focal_rect_from_point(
			FocusPoint { x: 0, y: 0 },
			Dimensions::new(0, 80),
			Dimensions::new(10, 10),
		);
		assert!(matches!(result, Err(Error::EmptyImage)));
	}
}
