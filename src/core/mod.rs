pub mod admin;
pub mod codec;
pub mod github;
pub mod literal;
#[cfg(test)]
pub mod memory_store;
pub mod repository;
pub mod store;
