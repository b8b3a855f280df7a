//! Application services built on the ports.

mod input;
mod posts;

pub use input::{NewPost, PostPatch};
pub use posts::{PostService, PublicPostQuery};
