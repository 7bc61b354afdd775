pub mod model;
pub mod routes;

pub use model::{Note, NoteDeleted, NoteFC};
pub use routes::router;
