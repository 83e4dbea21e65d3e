pub mod pricing;
pub mod query;
pub mod validation;
