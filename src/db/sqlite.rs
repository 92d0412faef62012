use crate::db::models::{DbCustomer, NewCustomer};
use crate::db::schema::{ADMIN_EMAIL, ADMIN_NAME, ADMIN_PASSWORD, SQLITE_INIT};
use crate::error::{SchemaError, StoreError};
use crate::password::{self, PasswordScheme};
use crate::session::Identity;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

pub type SqlitePool = Pool<Sqlite>;

/// Owner of the connection pool and of schema setup.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool whose every connection has `foreign_keys=ON`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SchemaError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_opts)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self, scheme: PasswordScheme) -> CustomerStore {
        CustomerStore::new(self.pool.clone(), scheme)
    }

    /// Create any missing tables and make sure the administrator exists.
    /// Safe to repeat; every failure is fatal to startup.
    pub async fn initialize(&self, scheme: PasswordScheme) -> Result<(), SchemaError> {
        self.ensure_foreign_keys().await?;

        let mut tx = self.pool.begin().await?;
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&mut *tx).await?;
        }

        let admin_hash = password::hash_for_storage(ADMIN_PASSWORD, scheme)?;
        let seeded = sqlx::query(
            r#"
            INSERT INTO Customer (full_name, email, password_hash, contact_number, address, is_admin)
            VALUES (?, ?, ?, '', '', 1)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(ADMIN_NAME)
        .bind(ADMIN_EMAIL)
        .bind(admin_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if seeded > 0 {
            info!(email = ADMIN_EMAIL, "seeded default administrator");
        } else {
            debug!(email = ADMIN_EMAIL, "administrator already present");
        }
        info!("database schema ready");
        Ok(())
    }

    async fn ensure_foreign_keys(&self) -> Result<(), SchemaError> {
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await?;
        if enabled != 1 {
            return Err(SchemaError::ForeignKeysDisabled);
        }
        Ok(())
    }
}

/// Sole reader and writer of password material.
#[derive(Clone)]
pub struct CustomerStore {
    pool: SqlitePool,
    scheme: PasswordScheme,
}

impl CustomerStore {
    pub fn new(pool: SqlitePool, scheme: PasswordScheme) -> Self {
        Self { pool, scheme }
    }

    /// Insert a non-admin customer and return its id. Email uniqueness is left
    /// to the UNIQUE constraint so concurrent registrations cannot both win.
    pub async fn create_customer(&self, new: &NewCustomer) -> Result<i64, StoreError> {
        let password_hash = password::hash_for_storage(&new.password, self.scheme)?;
        let result = sqlx::query(
            r#"
            INSERT INTO Customer (full_name, email, password_hash, contact_number, address, is_admin)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(password_hash)
        .bind(&new.contact_number)
        .bind(&new.address)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                info!(customer_id = id, email = %new.email, "customer created");
                Ok(id)
            }
            Err(e) => {
                let err = StoreError::from_insert(e, &new.email);
                warn!(email = %new.email, error = %err, "failed to create customer");
                Err(err)
            }
        }
    }

    /// Returns the identity only when both email and password match. Unknown
    /// email, wrong password and store failures all come back as `None`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Option<Identity> {
        self.try_authenticate(email, password)
            .await
            .inspect_err(|e| error!(error = %e, "login failed against the store"))
            .ok()
            .flatten()
    }

    /// Like [`CustomerStore::authenticate`] but lets store failures through.
    pub async fn try_authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(customer) = self.find_by_email(email).await? else {
            // same hashing cost as a wrong password for a known email
            password::verify_dummy(password, self.scheme);
            debug!("login rejected");
            return Ok(None);
        };
        if !password::verify(password, &customer.password_hash) {
            debug!("login rejected");
            return Ok(None);
        }

        if password::needs_rehash(&customer.password_hash, self.scheme) {
            self.upgrade_hash(customer.customer_id, password).await;
        }
        Ok(Some(customer.into()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<DbCustomer>, StoreError> {
        // rows written outside this crate may hold NULL in is_admin
        let row = sqlx::query_as::<_, DbCustomer>(
            r#"SELECT customer_id, full_name, email, password_hash, contact_number, address,
                      COALESCE(is_admin, 0) = 1 AS is_admin
               FROM Customer WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_customers(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Customer")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Rehash-on-login. A failure here is logged and never fails the login.
    async fn upgrade_hash(&self, customer_id: i64, password: &str) {
        let new_hash = match password::hash_for_storage(password, self.scheme) {
            Ok(h) => h,
            Err(e) => {
                warn!(customer_id, error = %e, "could not rehash legacy password");
                return;
            }
        };
        match sqlx::query("UPDATE Customer SET password_hash = ? WHERE customer_id = ?")
            .bind(new_hash)
            .bind(customer_id)
            .execute(&self.pool)
            .await
        {
            Ok(_) => info!(customer_id, "upgraded legacy password hash"),
            Err(e) => warn!(customer_id, error = %e, "failed to store upgraded password hash"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::schema::TABLES;

    pub(crate) async fn memory_db() -> Database {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        // one connection: every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .unwrap();
        Database::new(pool)
    }

    async fn ready_store(scheme: PasswordScheme) -> (Database, CustomerStore) {
        let db = memory_db().await;
        db.initialize(scheme).await.unwrap();
        let store = db.customers(scheme);
        (db, store)
    }

    fn jane() -> NewCustomer {
        NewCustomer {
            full_name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            password: "secret1".to_string(),
            contact_number: Some("555-1234".to_string()),
            address: Some("1 Main St".to_string()),
        }
    }

    async fn admin_rows(db: &Database) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Customer WHERE email = ?")
            .bind(ADMIN_EMAIL)
            .fetch_one(db.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn initialize_creates_all_tables() {
        let db = memory_db().await;
        db.initialize(PasswordScheme::Argon2id).await.unwrap();

        let names: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(db.pool())
                .await
                .unwrap();
        for table in TABLES {
            assert!(
                names.iter().any(|(n,)| n == table),
                "missing table {table}"
            );
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let db = memory_db().await;
        db.initialize(PasswordScheme::Argon2id).await.unwrap();
        db.initialize(PasswordScheme::Argon2id).await.unwrap();
        db.initialize(PasswordScheme::LegacySha256).await.unwrap();
        assert_eq!(admin_rows(&db).await, 1);
        assert_eq!(db.customers(PasswordScheme::Argon2id).count_customers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn seeded_admin_can_log_in() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        let identity = store
            .authenticate(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("admin must authenticate");
        assert!(identity.is_admin);
        assert_eq!(identity.full_name, ADMIN_NAME);
        assert_eq!(identity.email, ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn legacy_seed_stores_sha256_hex() {
        let (_db, store) = ready_store(PasswordScheme::LegacySha256).await;
        let admin = store.find_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.password_hash, password::hash(ADMIN_PASSWORD));
        assert_eq!(admin.contact_number.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let (db, _store) = ready_store(PasswordScheme::LegacySha256).await;
        let res = sqlx::query("INSERT INTO Cart (customer_id, created_at) VALUES (9999, 'now')")
            .execute(db.pool())
            .await;
        assert!(res.is_err(), "orphan cart row must be rejected");
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        let id = store.create_customer(&jane()).await.unwrap();

        let identity = store.authenticate("jane@x.com", "secret1").await.unwrap();
        assert_eq!(identity.customer_id, id);
        assert_eq!(identity.full_name, "Jane Doe");
        assert!(!identity.is_admin);

        assert_eq!(store.authenticate("jane@x.com", "wrong").await, None);

        let stored = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert_eq!(stored.address.as_deref(), Some("1 Main St"));
        assert_eq!(Identity::from(stored), identity);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_mutation() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        store.create_customer(&jane()).await.unwrap();
        let before = store.count_customers().await.unwrap();

        let mut again = jane();
        again.full_name = "Someone Else".to_string();
        let err = store.create_customer(&again).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(ref e) if e == "jane@x.com"));
        assert_eq!(store.count_customers().await.unwrap(), before);

        let mut admin_clash = jane();
        admin_clash.email = ADMIN_EMAIL.to_string();
        assert!(matches!(
            store.create_customer(&admin_clash).await,
            Err(StoreError::DuplicateEmail(_))
        ));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        store.create_customer(&jane()).await.unwrap();
        let wrong_password = store.try_authenticate("jane@x.com", "nope").await.unwrap();
        let unknown_email = store.try_authenticate("ghost@x.com", "secret1").await.unwrap();
        assert_eq!(wrong_password, None);
        assert_eq!(wrong_password, unknown_email);
    }

    async fn mean_login_micros(store: &CustomerStore, email: &str, rounds: u32) -> u128 {
        let mut total = 0;
        for _ in 0..rounds {
            let started = std::time::Instant::now();
            assert_eq!(store.try_authenticate(email, "wrong").await.unwrap(), None);
            total += started.elapsed().as_micros();
        }
        total / u128::from(rounds)
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_hash_verify() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        // warm the dummy hash so its one-time construction is not measured
        store.try_authenticate("ghost@x.com", "wrong").await.unwrap();

        let known = mean_login_micros(&store, ADMIN_EMAIL, 4).await;
        let unknown = mean_login_micros(&store, "ghost@x.com", 4).await;
        assert!(
            unknown * 4 >= known,
            "unknown email took {unknown}us, known email with wrong password {known}us"
        );
    }

    #[tokio::test]
    async fn null_admin_flag_reads_as_not_admin() {
        let (db, store) = ready_store(PasswordScheme::Argon2id).await;
        sqlx::query(
            "INSERT INTO Customer (full_name, email, password_hash, is_admin) VALUES (?, ?, ?, NULL)",
        )
        .bind("Old Row")
        .bind("old@x.com")
        .bind(password::hash("secret1"))
        .execute(db.pool())
        .await
        .unwrap();

        let row = store.find_by_email("old@x.com").await.unwrap().unwrap();
        assert!(!row.is_admin);
        let identity = store.authenticate("old@x.com", "secret1").await.unwrap();
        assert!(!identity.is_admin);
        assert!(store.authenticate(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn email_match_is_exact() {
        let (_db, store) = ready_store(PasswordScheme::Argon2id).await;
        store.create_customer(&jane()).await.unwrap();
        assert_eq!(store.authenticate("JANE@x.com", "secret1").await, None);
        assert_eq!(store.authenticate(" jane@x.com", "secret1").await, None);
    }

    #[tokio::test]
    async fn legacy_hash_is_upgraded_on_login() {
        let db = memory_db().await;
        db.initialize(PasswordScheme::LegacySha256).await.unwrap();
        let legacy = db.customers(PasswordScheme::LegacySha256);
        legacy.create_customer(&jane()).await.unwrap();
        let before = legacy.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert_eq!(before.password_hash, password::hash("secret1"));

        let modern = db.customers(PasswordScheme::Argon2id);
        assert!(modern.authenticate("jane@x.com", "secret1").await.is_some());
        let after = modern.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert!(after.password_hash.starts_with("$argon2id$"));
        assert!(modern.authenticate("jane@x.com", "secret1").await.is_some());
        assert!(legacy.authenticate("jane@x.com", "secret1").await.is_some());
    }

    #[tokio::test]
    async fn failed_login_does_not_upgrade() {
        let db = memory_db().await;
        db.initialize(PasswordScheme::LegacySha256).await.unwrap();
        let modern = db.customers(PasswordScheme::Argon2id);
        assert!(modern.authenticate(ADMIN_EMAIL, "wrong").await.is_none());
        let admin = modern.find_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.password_hash, password::hash(ADMIN_PASSWORD));
    }

    #[tokio::test]
    async fn closed_pool_fails_safe() {
        let (db, store) = ready_store(PasswordScheme::Argon2id).await;
        db.pool().close().await;
        assert_eq!(store.authenticate(ADMIN_EMAIL, ADMIN_PASSWORD).await, None);
        assert!(matches!(
            store.try_authenticate(ADMIN_EMAIL, ADMIN_PASSWORD).await,
            Err(StoreError::Connectivity(_))
        ));
        assert!(matches!(
            store.create_customer(&jane()).await,
            Err(StoreError::Connectivity(_))
        ));
    }
}
