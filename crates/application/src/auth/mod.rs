pub mod dtos;
pub mod verify;

pub use verify::{decode_token, subject_id};
