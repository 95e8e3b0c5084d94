//! mini-catalog/crates/mc-services/src/lib.rs
//!
//! Application services. Each one is built from the ports in `mc-core` and
//! knows nothing about HTTP or SQL.

pub mod catalog;
pub mod engine;
pub mod fanout;
pub mod interactions;
pub mod users;

pub use catalog::CatalogService;
pub use engine::{average_rating, AggregationEngine, RecommendationPolicy};
pub use fanout::{FanOutReport, NotificationFanOut};
pub use interactions::{InteractionService, Subscriptions};
pub use users::UserService;
