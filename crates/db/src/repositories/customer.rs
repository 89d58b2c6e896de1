use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use membership_core::domain::customer::{Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str =
    "SELECT id, name, email, annual_spend, last_purchase_date FROM customer";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        // No ORDER BY: which duplicate comes back is left to SQLite.
        let statement = format!("{SELECT_COLUMNS} WHERE {column} = ? LIMIT 1");
        let row = sqlx::query(&statement).bind(value).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String = row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let annual_spend: Option<String> =
        row.try_get("annual_spend").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_purchase_date: Option<String> =
        row.try_get("last_purchase_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let id = CustomerId::from_str(&id)
        .map_err(|e| RepositoryError::Decode(format!("invalid customer id `{id}`: {e}")))?;
    let annual_spend = annual_spend
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|e| RepositoryError::Decode(format!("invalid annual_spend `{raw}`: {e}")))
        })
        .transpose()?;
    let last_purchase_date = last_purchase_date
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
                RepositoryError::Decode(format!("invalid last_purchase_date `{raw}`: {e}"))
            })
        })
        .transpose()?;

    Ok(Customer { id, name, email, annual_spend, last_purchase_date, tier: None })
}

fn spend_to_text(spend: Option<Decimal>) -> Option<String> {
    spend.map(|value| value.to_string())
}

fn date_to_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|value| value.format(DATE_FORMAT).to_string())
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn insert(&self, customer: Customer) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO customer (id, name, email, annual_spend, last_purchase_date,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(spend_to_text(customer.annual_spend))
        .bind(date_to_text(customer.last_purchase_date))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        self.find_one("name", name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        self.find_one("email", email).await
    }

    async fn update(&self, customer: Customer) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer
             SET name = ?, email = ?, annual_spend = ?, last_purchase_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(spend_to_text(customer.annual_spend))
        .bind(date_to_text(customer.last_purchase_date))
        .bind(Utc::now().to_rfc3339())
        .bind(customer.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use membership_core::domain::customer::{Customer, CustomerId};

    use super::SqlCustomerRepository;
    use crate::repositories::{CustomerRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> (DbPool, SqlCustomerRepository) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        (pool.clone(), SqlCustomerRepository::new(pool))
    }

    fn customer(name: &str, email: &str) -> Customer {
        Customer {
            id: CustomerId::generate(),
            name: name.to_string(),
            email: email.to_string(),
            annual_spend: Some(Decimal::new(500_000, 2)),
            last_purchase_date: NaiveDate::from_ymd_opt(2026, 4, 18),
            tier: None,
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_each_key() {
        let (pool, repo) = setup().await;
        let alice = customer("Alice", "alice@example.com");
        repo.insert(alice.clone()).await.expect("insert");

        assert_eq!(repo.find_by_id(&alice.id).await.expect("by id"), Some(alice.clone()));
        assert_eq!(repo.find_by_name("Alice").await.expect("by name"), Some(alice.clone()));
        assert_eq!(
            repo.find_by_email("alice@example.com").await.expect("by email"),
            Some(alice.clone())
        );
        assert_eq!(repo.find_by_name("alice").await.expect("case sensitive"), None);

        pool.close().await;
    }

    #[tokio::test]
    async fn decimal_scale_and_missing_fields_survive_storage() {
        let (pool, repo) = setup().await;
        let mut record = customer("Dana", "dana@example.com");
        record.annual_spend = Some(Decimal::new(1_234_567, 3));
        repo.insert(record.clone()).await.expect("insert");

        let found = repo.find_by_id(&record.id).await.expect("find").expect("present");
        assert_eq!(found.annual_spend.map(|spend| spend.to_string()), Some("1234.567".to_string()));

        let mut bare = customer("Eve", "eve@example.com");
        bare.annual_spend = None;
        bare.last_purchase_date = None;
        repo.insert(bare.clone()).await.expect("insert bare");
        assert_eq!(repo.find_by_id(&bare.id).await.expect("find"), Some(bare));

        pool.close().await;
    }

    #[tokio::test]
    async fn duplicate_names_are_permitted() {
        let (pool, repo) = setup().await;
        let first = customer("Sam", "sam1@example.com");
        let second = customer("Sam", "sam2@example.com");
        repo.insert(first.clone()).await.expect("insert first");
        repo.insert(second.clone()).await.expect("insert second");

        let found = repo.find_by_name("Sam").await.expect("by name").expect("present");
        assert!(found == first || found == second);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_reports_missing_rows() {
        let (pool, repo) = setup().await;
        let mut record = customer("Frank", "frank@example.com");
        repo.insert(record.clone()).await.expect("insert");

        record.email = "frank@new.example.com".to_string();
        record.annual_spend = None;
        assert!(repo.update(record.clone()).await.expect("update"));
        assert_eq!(repo.find_by_id(&record.id).await.expect("find"), Some(record));

        let stranger = customer("Ghost", "ghost@example.com");
        assert!(!repo.update(stranger).await.expect("update missing"));

        pool.close().await;
    }

    #[tokio::test]
    async fn delete_removes_row_once() {
        let (pool, repo) = setup().await;
        let record = customer("Hank", "hank@example.com");
        repo.insert(record.clone()).await.expect("insert");

        assert!(repo.delete(&record.id).await.expect("delete"));
        assert!(!repo.delete(&record.id).await.expect("second delete"));
        assert_eq!(repo.find_by_id(&record.id).await.expect("find"), None);

        pool.close().await;
    }

    #[tokio::test]
    async fn corrupt_rows_surface_decode_errors() {
        let (pool, repo) = setup().await;
        let id = CustomerId::generate();
        sqlx::query(
            "INSERT INTO customer
                 (id, name, email, annual_spend, last_purchase_date, created_at, updated_at)
             VALUES (?, 'Ivy', 'ivy@example.com', 'lots', NULL, '', '')",
        )
        .bind(id.to_string())
        .execute(&pool)
        .await
        .expect("seed corrupt row");

        let result = repo.find_by_id(&id).await;
        assert!(matches!(
            result,
            Err(RepositoryError::Decode(ref message)) if message.contains("annual_spend")
        ));

        pool.close().await;
    }
}
