use std::sync::Arc;

use membership_core::domain::customer::{Customer, CustomerDraft, CustomerId, CustomerLookup};
use membership_core::errors::{ApplicationError, DomainError};
use membership_core::tier::Clock;
use membership_core::validation::validate_customer;
use membership_db::{CustomerRepository, RepositoryError};
use tracing::info;

/// Customer use cases over a repository.
///
/// Tiers are derived on reads only, from the injected clock's current date.
/// Records returned by `create` and `update` carry no tier.
#[derive(Clone)]
pub struct CustomerStore {
    repository: Arc<dyn CustomerRepository>,
    clock: Arc<dyn Clock>,
}

impl CustomerStore {
    pub fn new(repository: Arc<dyn CustomerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn create(&self, draft: CustomerDraft) -> Result<Customer, ApplicationError> {
        let data = validate_customer(draft)?;
        let customer = Customer::new(CustomerId::generate(), data);
        self.repository.insert(customer.clone()).await.map_err(persistence)?;

        info!(
            event_name = "customer.created",
            customer_id = %customer.id,
            "customer created"
        );
        Ok(customer)
    }

    pub async fn get_by_id(&self, id: CustomerId) -> Result<Customer, ApplicationError> {
        let customer = self
            .repository
            .find_by_id(&id)
            .await
            .map_err(persistence)?
            .ok_or(DomainError::CustomerNotFound(CustomerLookup::Id(id)))?;
        Ok(self.classified("customer.fetched_by_id", customer))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Customer, ApplicationError> {
        let customer = self
            .repository
            .find_by_name(name)
            .await
            .map_err(persistence)?
            .ok_or_else(|| DomainError::CustomerNotFound(CustomerLookup::Name(name.to_owned())))?;
        Ok(self.classified("customer.fetched_by_name", customer))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Customer, ApplicationError> {
        let customer = self
            .repository
            .find_by_email(email)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                DomainError::CustomerNotFound(CustomerLookup::Email(email.to_owned()))
            })?;
        Ok(self.classified("customer.fetched_by_email", customer))
    }

    /// Overwrites the stored fields of `id`. Validation runs before the lookup,
    /// so an invalid body for an unknown id is reported as a validation error.
    pub async fn update(
        &self,
        id: CustomerId,
        draft: CustomerDraft,
    ) -> Result<Customer, ApplicationError> {
        let data = validate_customer(draft)?;
        let not_found = || DomainError::CustomerNotFound(CustomerLookup::Id(id));

        let mut customer =
            self.repository.find_by_id(&id).await.map_err(persistence)?.ok_or_else(not_found)?;
        customer.apply(data);

        // Last write wins; a concurrent delete between the read and the write
        // surfaces as not found.
        if !self.repository.update(customer.clone()).await.map_err(persistence)? {
            return Err(not_found().into());
        }

        info!(
            event_name = "customer.updated",
            customer_id = %customer.id,
            "customer updated"
        );
        Ok(customer)
    }

    pub async fn delete(&self, id: CustomerId) -> Result<(), ApplicationError> {
        if !self.repository.delete(&id).await.map_err(persistence)? {
            return Err(DomainError::CustomerNotFound(CustomerLookup::Id(id)).into());
        }

        info!(
            event_name = "customer.deleted",
            customer_id = %id,
            "customer deleted"
        );
        Ok(())
    }

    fn classified(&self, event_name: &'static str, customer: Customer) -> Customer {
        let customer = customer.with_tier(self.clock.today());
        info!(
            event_name,
            customer_id = %customer.id,
            tier = customer.tier.map(|tier| tier.as_str()).unwrap_or("none"),
            "customer fetched"
        );
        customer
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Months, NaiveDate};
    use rust_decimal::Decimal;

    use membership_core::domain::customer::{CustomerDraft, CustomerId};
    use membership_core::errors::{ApplicationError, DomainError, FieldError, FieldErrors};
    use membership_core::tier::{FixedClock, Tier};
    use membership_core::validation::{EMAIL_INVALID, NAME_REQUIRED};
    use membership_db::InMemoryCustomerRepository;

    use super::CustomerStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    fn store() -> (Arc<InMemoryCustomerRepository>, CustomerStore) {
        let repository = Arc::new(InMemoryCustomerRepository::default());
        let store = CustomerStore::new(repository.clone(), Arc::new(FixedClock(today())));
        (repository, store)
    }

    fn draft(name: &str, email: &str, spend: i64, months_ago: u32) -> CustomerDraft {
        CustomerDraft {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            annual_spend: Some(Decimal::from(spend)),
            last_purchase_date: today().checked_sub_months(Months::new(months_ago)),
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_leaves_tier_absent() {
        let (_, store) = store();

        let first = store.create(draft("Alice", "alice@example.com", 12_000, 3)).await;
        let second = store.create(draft("Alice", "alice@example.com", 12_000, 3)).await;
        let (first, second) = (first.expect("first"), second.expect("second"));

        assert_ne!(first.id, second.id);
        assert_eq!(first.tier, None);
    }

    #[tokio::test]
    async fn reads_classify_against_the_clock() {
        let (_, store) = store();
        let alice = store.create(draft("Alice", "alice@example.com", 12_000, 3)).await;
        let alice = alice.expect("alice");
        let gold = store.create(draft("Bob", "bob@example.com", 5_000, 6)).await.expect("bob");
        let silver = store.create(draft("Carol", "carol@example.com", 500, 24)).await;
        let silver = silver.expect("carol");

        assert_eq!(store.get_by_id(alice.id).await.expect("alice").tier, Some(Tier::Platinum));
        assert_eq!(store.get_by_name("Bob").await.expect("bob").id, gold.id);
        assert_eq!(store.get_by_name("Bob").await.expect("bob").tier, Some(Tier::Gold));
        let carol = store.get_by_email("carol@example.com").await.expect("carol");
        assert_eq!(carol.id, silver.id);
        assert_eq!(carol.tier, Some(Tier::Silver));
    }

    #[tokio::test]
    async fn customers_without_spend_have_no_tier() {
        let (_, store) = store();
        let created = store
            .create(CustomerDraft {
                name: Some("Dana".to_string()),
                email: Some("dana@example.com".to_string()),
                ..CustomerDraft::default()
            })
            .await
            .expect("create");

        assert_eq!(store.get_by_id(created.id).await.expect("get").tier, None);
    }

    #[tokio::test]
    async fn invalid_create_persists_nothing() {
        let (repository, store) = store();

        let error = store
            .create(draft("Alice", "invalid-email", 12_000, 3))
            .await
            .expect_err("invalid email");

        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::Validation(FieldErrors::single(
                "email",
                EMAIL_INVALID
            )))
        );
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_is_visible_to_reads() {
        let (_, store) = store();
        let created =
            store.create(draft("Alice", "alice@example.com", 12_000, 3)).await.expect("create");

        let updated = store
            .update(created.id, draft("Alice", "alice@new.example.com", 12_000, 3))
            .await
            .expect("update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.tier, None);

        let fetched = store.get_by_id(created.id).await.expect("get");
        assert_eq!(fetched.email, "alice@new.example.com");
        assert_eq!(fetched.tier, Some(Tier::Platinum));
    }

    #[tokio::test]
    async fn update_validates_before_looking_up() {
        let (_, store) = store();
        let mut invalid = draft("Ghost", "ghost@example.com", 1, 1);
        invalid.name = None;

        let error = store.update(CustomerId::generate(), invalid).await.expect_err("invalid");
        let mut expected = FieldErrors::default();
        expected.push(FieldError::new("name", NAME_REQUIRED));
        assert_eq!(error, ApplicationError::Domain(DomainError::Validation(expected)));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (_, store) = store();
        let id = CustomerId::generate();

        let update = store.update(id, draft("Ghost", "ghost@example.com", 1, 1)).await;
        assert!(matches!(update, Err(ApplicationError::Domain(DomainError::CustomerNotFound(_)))));

        let delete = store.delete(id).await.expect_err("missing delete");
        assert_eq!(delete.to_string(), format!("Customer not found with ID: {id}"));

        let by_name = store.get_by_name("Nobody").await.expect_err("missing name");
        assert_eq!(by_name.to_string(), "Customer not found: Nobody");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (repository, store) = store();
        let created = store.create(draft("Eve", "eve@example.com", 50, 1)).await.expect("create");

        store.delete(created.id).await.expect("delete");

        assert!(repository.is_empty().await);
        assert!(matches!(
            store.get_by_id(created.id).await,
            Err(ApplicationError::Domain(DomainError::CustomerNotFound(_)))
        ));
    }
}
