use std::collections::HashMap;

use tokio::sync::RwLock;

use membership_core::domain::customer::{Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};

/// Map-backed repository; name and email lookups follow hash-map iteration
/// order, so duplicates come back in no particular order.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerRepository {
    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn insert(&self, mut customer: Customer) -> Result<(), RepositoryError> {
        customer.tier = None;
        let mut customers = self.customers.write().await;
        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.values().find(|customer| customer.name == name).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.values().find(|customer| customer.email == email).cloned())
    }

    async fn update(&self, mut customer: Customer) -> Result<bool, RepositoryError> {
        customer.tier = None;
        let mut customers = self.customers.write().await;
        match customers.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let mut customers = self.customers.write().await;
        Ok(customers.remove(id).is_some())
    }
}
