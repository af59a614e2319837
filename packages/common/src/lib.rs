pub mod storage;
pub mod wait;
