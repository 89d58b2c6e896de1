use async_trait::async_trait;
use thiserror::Error;

use membership_core::domain::customer::{Customer, CustomerId};

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Persistence port for customer records.
///
/// Records are stored without a tier. Name and email lookups return an
/// arbitrary record when several share the key.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn insert(&self, customer: Customer) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;

    /// Returns `false` when no record with `customer.id` exists.
    async fn update(&self, customer: Customer) -> Result<bool, RepositoryError>;

    /// Returns `false` when no record with `id` exists.
    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError>;
}
