pub mod admin_users;
pub mod documents;

pub use admin_users::Entity as AdminUsers;
pub use documents::Entity as Documents;
