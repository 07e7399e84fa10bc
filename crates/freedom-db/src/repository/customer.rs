//! # Customer Repository
//!
//! Just enough customer storage for `sales.customer_id` and the customer
//! name on invoices.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use freedom_core::validation::validate_new_customer;
use freedom_core::{Customer, NewCustomer};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(customer)?;
        debug!(name = %customer.name, "Inserting customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (name, email, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(customer.name.trim())
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, name, email, phone, address, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use freedom_core::NewCustomer;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = repo
            .insert(&NewCustomer {
                name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Jane Doe");
        assert_eq!(fetched.email.as_deref(), Some("jane@example.com"));
        assert!(fetched.phone.is_none());

        assert!(repo.get_by_id(customer.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_name_is_required() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.customers().insert(&NewCustomer::default()).await.is_err());
    }
}
