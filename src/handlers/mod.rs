pub mod catalog;
pub mod health;
pub mod provider_config;
pub mod requests;
