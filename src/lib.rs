//! PSX battle scene decoding and PC battle location export.

pub mod export;
pub mod scene;
