//! Services for data access, aggregation and transaction composition

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod gateway;
pub mod register;
pub mod report;
pub mod session;

pub use aggregator::Aggregator;
pub use catalog::{CatalogLoad, CatalogService};
pub use config::{AppConfig, AuthMode, ConfigOverrides};
pub use gateway::{Gateway, HttpGateway};
pub use register::Register;
pub use report::{ServiceRow, StatsReport};
pub use session::SessionStore;
