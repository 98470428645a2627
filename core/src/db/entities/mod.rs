//! Library database entities.

pub mod collection;
pub mod document;
pub mod image;
pub mod video;
