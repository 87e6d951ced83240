mod entities;
pub use entities::*;

pub mod types;

pub mod prelude {
    pub use super::entities::prelude::*;
}
