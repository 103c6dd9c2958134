//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{
    NewPost, Post, PostChanges, PostPatch, PostStatus, PostType, Schedule, Visibility,
    normalize_tags,
};
pub use user::{Role, User, UserChanges, normalize_email};
