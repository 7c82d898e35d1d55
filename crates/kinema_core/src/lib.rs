//! Kinema Core
//!
//! Plain value types animated by the Kinema engine:
//!
//! - **Offset**: 2D displacement, interpolated per axis
//! - **Color**: linear RGBA in the 0.0–1.0 float range
//! - **Rgba8**: packed RGBA in the 0–255 byte range
//!
//! Both color types clamp after interpolation so eased curves that overshoot
//! (elastic, back) never produce channels outside their legal range.
//!
//! # Example
//!
//! ```rust
//! use kinema_core::{Color, Offset};
//!
//! let mid = Offset::new(0.0, 0.0).lerp(Offset::new(10.0, 20.0), 0.5);
//! assert_eq!(mid, Offset::new(5.0, 10.0));
//!
//! let c = Color::BLACK.lerp(Color::WHITE, 1.5);
//! assert_eq!(c, Color::WHITE);
//! ```

pub mod color;
pub mod geometry;
pub mod math;

pub use color::{Color, Rgba8};
pub use geometry::Offset;
pub use math::{lerp_f32, lerp_f64};
