//! Cost center domain

pub mod actions;
pub mod data;
pub mod models;

pub use data::{CostCenterData, CreateCostCenterInput};
pub use models::CostCenter;
