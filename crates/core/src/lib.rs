pub mod error;
pub mod models;
pub mod parser;
pub mod render;
pub mod synthesis;

pub use error::PlanningError;
pub use models::*;
pub use parser::{normalize_text, parse_trip_request};
pub use render::{render_failure, render_report};
pub use synthesis::{assemble_itineraries, default_schedule};
