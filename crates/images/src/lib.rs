#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Pure image processing for the Bynder sync engine: probing, source-copy
//! conversion and focal area geometry. No I/O happens in this crate.

mod consts;
mod convert;
mod error;
mod focal;

pub use consts::{DEFAULT_MAX_SOURCE_HEIGHT, DEFAULT_MAX_SOURCE_WIDTH};
pub use convert::{convert, probe, ConvertOptions, ConvertedImage, ImageInfo};
pub use error::{Error, Result};
pub use focal::{focal_rect_from_point, Dimensions, FocalRect, FocusPoint};
pub use image::ImageFormat;
