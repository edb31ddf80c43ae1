pub mod alert;
pub mod domain;
pub mod error;
