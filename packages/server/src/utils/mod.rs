pub mod filename;
pub mod hash;
pub mod image;
pub mod jwt;
