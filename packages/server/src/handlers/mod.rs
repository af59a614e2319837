pub mod admin;
mod attribute;
pub mod fallback;
pub mod health;
pub mod ingredient;
pub mod media;
pub mod recipe;
pub mod tag;
pub mod user;
