//! External service providers backing the relay stages.

pub mod openai;
