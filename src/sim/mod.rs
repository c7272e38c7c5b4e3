pub mod engine;
pub mod event;
pub mod integrator;
pub mod kpi;
pub mod policy;
pub mod power_balance;
pub mod quantile;
pub mod sizing;
pub mod types;
pub mod window;
