//! Organization domain - buyer organizations and organization requests

pub mod actions;
pub mod data;
pub mod models;

pub use data::{
    CreateOrganizationInput, CreateOrganizationRequestInput, OrganizationData,
    OrganizationRequestData, UpdateOrganizationInput,
};
pub use models::{Organization, OrganizationRequest};
