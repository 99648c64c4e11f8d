//! Domain model: the records exchanged with the UI and storage layers.

mod capture;
mod profile;

pub use capture::{CapturePayload, CaptureSource, ImageData};
pub use profile::{DatabaseMetadata, Profile};
