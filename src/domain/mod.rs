pub mod entity;
pub mod position;
