pub mod prelude;

pub mod admins;
pub mod members;
pub mod projects;
pub mod questions;
pub mod records;
