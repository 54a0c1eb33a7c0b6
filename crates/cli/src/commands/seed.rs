//! Seed the database with demo farmers and their items.
//!
//! The seed file is YAML:
//!
//! ```yaml
//! farmers:
//!   - email: ada@example.com
//!     password: correct-horse-battery
//!     first_name: Ada
//!     last_name: Greenfield
//!     items:
//!       - name: Strawberries
//!         price: "4.50"
//!         quantity: 40
//!         category: Fruit
//! ```
//!
//! Farmers whose email already exists are skipped along with their items, so
//! the command can be re-run safely.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use farmers_place_core::Email;
use farmers_place_storefront::db::{self, ItemRepository, RepositoryError};
use farmers_place_storefront::models::ItemInput;
use farmers_place_storefront::services::auth::{AuthError, AuthService, SignUp};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to create farmer: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to create item: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub farmers: Vec<SeedFarmer>,
}

/// A farmer account and the items it lists.
#[derive(Debug, Deserialize)]
pub struct SeedFarmer {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_num: String,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

impl SeedFarmer {
    fn sign_up(&self) -> SignUp {
        SignUp {
            email: self.email.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_farmer: true,
            phone_num: self.phone_num.clone(),
        }
    }
}

/// What a seeding run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub farmers_created: usize,
    pub farmers_skipped: usize,
    pub items_created: usize,
}

/// Problems in a seed file that would fail at insert time.
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    for farmer in &seed.farmers {
        if let Err(e) = Email::parse(&farmer.email) {
            errors.push(format!("{}: {e}", farmer.email));
        }
        for item in &farmer.items {
            if let Err(msg) = item.validate() {
                errors.push(format!("{} / {}: {msg}", farmer.email, item.name));
            }
        }
    }

    errors
}

/// Seed demo data from a YAML file.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or fails validation, or if
/// the database rejects an insert.
pub async fn demo_data(file_path: &Path) -> Result<SeedSummary, SeedError> {
    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    info!(path = %file_path.display(), "Loading seed file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(file_path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let auth = AuthService::new(&pool);
    let items = ItemRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for farmer in &seed.farmers {
        let user = match auth.sign_up(&farmer.sign_up()).await {
            Ok(user) => user,
            Err(AuthError::UserAlreadyExists) => {
                info!(email = %farmer.email, "Farmer already exists, skipping");
                summary.farmers_skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        summary.farmers_created += 1;

        for item in &farmer.items {
            items.create(user.id, item).await?;
            summary.items_created += 1;
        }
        info!(email = %farmer.email, items = farmer.items.len(), "Seeded farmer");
    }

    Ok(summary)
}
