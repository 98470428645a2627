//! Property tests for the focal area calculator: for any valid focus point
//! the resulting region must be square, sit inside the stored image, and
//! respect the 40% cap on both stored dimensions.

use bynder_sync_images::{focal_rect_from_point, Dimensions, FocusPoint};
use proptest::prelude::*;

proptest! {
	#[test]
	fn focal_rect_is_square_and_contained(
		source_w in 1u32..6000,
		source_h in 1u32..6000,
		stored_w in 1u32..4000,
		stored_h in 1u32..4000,
		x_frac in 0.0f64..=1.0,
		y_frac in 0.0f64..=1.0,
	) {
		let x = (f64::from(source_w) * x_frac).floor() as u32;
		let y = (f64::from(source_h) * y_frac).floor() as u32;

		let rect = focal_rect_from_point(
			FocusPoint { x, y },
			Dimensions::new(source_w, source_h),
			Dimensions::new(stored_w, stored_h),
		)
		.unwrap();

		prop_assert_eq!(rect.width, rect.height);
		prop_assert!(rect.x <= stored_w);
		prop_assert!(rect.y <= stored_h);
		prop_assert!(rect.width <= stored_w * 2 / 5);
		prop_assert!(rect.height <= stored_h * 2 / 5);
		// The span never exceeds the distance to the nearest edge per axis.
		prop_assert!(rect.width <= 2 * rect.x.min(stored_w - rect.x));
		prop_assert!(rect.height <= 2 * rect.y.min(stored_h - rect.y));
	}

	#[test]
	fn out_of_bounds_x_is_rejected(
		source_w in 1u32..6000,
		source_h in 1u32..6000,
		excess in 1u32..1000,
	) {
		let result = focal_rect_from_point(
			FocusPoint { x: source_w + excess, y: 0 },
			Dimensions::new(source_w, source_h),
			Dimensions::new(source_w, source_h),
		);
		prop_assert!(result.is_err());
	}
}
