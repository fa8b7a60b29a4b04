//! Shared helpers.

pub mod id_generator;

pub use id_generator::{IdGenerator, OPERATION_ID_LEN};
