pub mod filter;
pub mod repository;
pub mod validation;
