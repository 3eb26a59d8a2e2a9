mod document;
mod follow;
mod user;

pub use document::*;
pub use follow::*;
pub use user::*;
