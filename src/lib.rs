pub mod aggregate;
pub mod cli;
pub mod debt;
pub mod error;
pub mod export;
pub mod labels;
pub mod model;
pub mod period;
pub mod persist;
pub mod report;
pub mod session;
pub mod settings;
pub mod stock;
pub mod store;

mod version;
