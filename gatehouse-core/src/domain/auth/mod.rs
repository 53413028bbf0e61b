//! Identity domain: users, credentials and their failure modes

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;
