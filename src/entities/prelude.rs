pub use super::admins::Entity as Admins;
pub use super::members::Entity as Members;
pub use super::projects::Entity as Projects;
pub use super::questions::Entity as Questions;
pub use super::records::Entity as Records;
