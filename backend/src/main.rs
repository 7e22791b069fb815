use tracing::info;
use vetcare_backend::logging::init_tracing;
use vetcare_backend::storage::{count_rows, EntityKind};
use vetcare_backend::{initialize_backend, BackendConfig};

const KINDS: [EntityKind; 7] = [
    EntityKind::Clinic,
    EntityKind::Owner,
    EntityKind::PetType,
    EntityKind::Pet,
    EntityKind::Specialty,
    EntityKind::Veterinarian,
    EntityKind::Visit,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackendConfig::from_env()?;
    init_tracing(&config.log_filter);

    let state = initialize_backend(&config).await?;

    let mut conn = state.db.acquire().await?;
    for kind in KINDS {
        let rows = count_rows(&mut conn, kind).await?;
        info!("{}: {} rows", kind.table(), rows);
    }

    info!("Database ready at {}", config.database_url);
    Ok(())
}
