// Business domains, each exercised through the guard chain

pub mod cost_center;
pub mod organization;
pub mod user;
