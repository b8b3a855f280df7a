//! Domain entities - the core business objects.

mod image;
mod post;
mod slug;
mod tags;
mod user;

pub use image::{ImageRules, ImageUpload};
pub use post::{Post, PostDetails, PostImage, PostStatus};
pub use slug::derive_slug;
pub use tags::TagInput;
pub use user::{AuthorSummary, Requester, Role, User};
