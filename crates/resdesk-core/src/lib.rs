pub mod app_config;
pub mod config;
pub mod error;
pub mod filter;
pub mod insights;
pub mod normalize;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RecordError};
pub use filter::{filter_reservations, DateScope, FilterCriteria};
pub use insights::{compute_insights, DishPopularity, InsightSummary, SpecialOccasion};
pub use normalize::{normalize, normalize_batch, normalize_metadata, Normalized};
pub use types::{FoodOrder, Metadata, OriginalData, ProcessedData, Reservation};
