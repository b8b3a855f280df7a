//! Object store and image inspection adapters.

mod inspect;
mod memory;

#[cfg(feature = "cloudinary")]
mod cloudinary;

pub use inspect::ImageCrateInspector;
pub use memory::InMemoryObjectStore;

#[cfg(feature = "cloudinary")]
pub use cloudinary::{CloudinaryConfig, CloudinaryObjectStore};
