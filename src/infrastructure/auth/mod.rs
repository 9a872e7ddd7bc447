//! Token provider implementations

mod static_provider;

pub use static_provider::StaticTokenProvider;
