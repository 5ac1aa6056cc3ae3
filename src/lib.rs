pub mod config;
pub mod contract;
pub mod intake;
pub mod notifications;
pub mod operation_log;
pub mod page;
pub mod query;
pub mod recipients;
pub mod report;
pub mod staging;
pub mod tokens;
pub mod totals;
pub mod units;
pub mod user_settings;
pub mod vip;
pub mod wallet;
