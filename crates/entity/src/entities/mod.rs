pub mod prelude;

pub mod difficulties;
pub mod maps;
pub mod mod_log;
pub mod users;
