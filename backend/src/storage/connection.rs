use anyhow::Result;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// The database URL for the production database
pub const DATABASE_URL: &str = "sqlite:vetcare.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// DbConnection owns the SQLite pools every service draws from.
///
/// Reads are spread over the reader pool. Write transactions all go through a
/// single-connection writer pool, so no two write transactions ever overlap.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    writer: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        Self::with_max_connections(url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Create a new database connection with an explicit reader pool size
    pub async fn with_max_connections(url: &str, max_connections: u32) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let options = SqliteConnectOptions::from_str(url)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;

        // Setup database schema
        Self::setup_schema(&writer).await?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
            writer: Arc::new(writer),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a private in-memory database with a unique name.
    ///
    /// The pool is pinned to a single connection that never expires and
    /// serves both reads and writes; the shared-cache database disappears
    /// once its last connection closes.
    pub async fn init_in_memory() -> Result<Self> {
        let db_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", db_id);

        let options = SqliteConnectOptions::from_str(&db_url)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;

        let pool = Arc::new(pool);
        Ok(Self {
            writer: Arc::clone(&pool),
            pool,
        })
    }

    /// Get a reference to the reader pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start the write transaction backing one service operation. Waits for
    /// any other write transaction to finish first.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.writer.begin().await
    }

    /// Borrow a pooled connection for read-only work
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        debug!("Database schema ready ({} statements)", SCHEMA.len());
        Ok(())
    }
}

// Foreign keys carry no ON DELETE action: dependents are removed explicitly by
// the cascade policy before their parent goes.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clinics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        working_hours TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_clinics_city
    ON clinics(city);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS owners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        document_number TEXT UNIQUE,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        address TEXT,
        city TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pet_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS specialties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS veterinarians (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        license_number TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        photo_url TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL,
        clinic_id INTEGER,
        FOREIGN KEY (clinic_id) REFERENCES clinics (id)
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_veterinarians_clinic_id
    ON veterinarians(clinic_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS veterinarian_specialties (
        veterinarian_id INTEGER NOT NULL,
        specialty_id INTEGER NOT NULL,
        PRIMARY KEY (veterinarian_id, specialty_id),
        FOREIGN KEY (veterinarian_id) REFERENCES veterinarians (id),
        FOREIGN KEY (specialty_id) REFERENCES specialties (id)
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_veterinarian_specialties_specialty_id
    ON veterinarian_specialties(specialty_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        birth_date DATE NOT NULL,
        breed TEXT,
        gender TEXT NOT NULL DEFAULT 'UNKNOWN',
        color TEXT,
        weight REAL,
        medical_notes TEXT,
        photo_url TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL,
        owner_id INTEGER NOT NULL,
        pet_type_id INTEGER NOT NULL,
        primary_clinic_id INTEGER,
        FOREIGN KEY (owner_id) REFERENCES owners (id),
        FOREIGN KEY (pet_type_id) REFERENCES pet_types (id),
        FOREIGN KEY (primary_clinic_id) REFERENCES clinics (id)
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_pets_owner_id
    ON pets(owner_id);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_pets_pet_type_id
    ON pets(pet_type_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        visit_date DATETIME NOT NULL,
        reason TEXT NOT NULL,
        diagnosis TEXT,
        treatment TEXT,
        notes TEXT,
        cost REAL,
        status TEXT NOT NULL DEFAULT 'SCHEDULED',
        created_at DATETIME NOT NULL,
        pet_id INTEGER NOT NULL,
        veterinarian_id INTEGER NOT NULL,
        clinic_id INTEGER NOT NULL,
        FOREIGN KEY (pet_id) REFERENCES pets (id),
        FOREIGN KEY (veterinarian_id) REFERENCES veterinarians (id),
        FOREIGN KEY (clinic_id) REFERENCES clinics (id)
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_visits_pet_id
    ON visits(pet_id);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_visits_veterinarian_id
    ON visits(veterinarian_id);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_visits_clinic_id
    ON visits(clinic_id);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_visits_visit_date
    ON visits(visit_date);
    "#,
];
