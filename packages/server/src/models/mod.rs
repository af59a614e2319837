pub mod admin;
pub mod attribute;
pub mod recipe;
pub mod shared;
pub mod user;
