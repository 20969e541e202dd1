// Service exports
pub mod cache;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod store;

pub use cache::{CacheKey, MapCache};
pub use memory::InMemoryGeoStore;
pub use notifier::{LogNotifier, Notifier, NotifierError, WebhookNotifier};
pub use postgres::PostgresGeoStore;
pub use store::{GeoStore, StoreError};
