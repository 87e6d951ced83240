pub use super::difficulties::Entity as Difficulties;
pub use super::maps::Entity as Maps;
pub use super::mod_log::Entity as ModLog;
pub use super::users::Entity as Users;
