pub mod model;
pub mod routes;

pub use model::{LoginFC, Token, User, UserFC, UserPublic};
pub use routes::router;
