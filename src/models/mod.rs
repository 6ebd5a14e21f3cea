// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{BoundingBox, Coordinate, Reservation, SearchQuery, SearchResult, Stashpoint, StashpointQuery, TimeInterval};
pub use requests::{FieldError, FieldErrorKind, StashpointSearchParams};
pub use responses::{ErrorResponse, HealthResponse, HealthStatus};
