pub mod admin;
pub mod member;
pub mod project;
pub mod record;
