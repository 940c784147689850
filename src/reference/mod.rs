//! Reference parsing
//!
//! Turns raw reference strings into structured identifiers:
//! - [`ActionRef`]: `owner/repo[/path]@ref` step references
//! - [`ImageRef`]: `[docker://][host/][namespace/]name[:tag][@digest]` image references

pub mod action;
pub mod image;

pub use action::ActionRef;
pub use image::ImageRef;
