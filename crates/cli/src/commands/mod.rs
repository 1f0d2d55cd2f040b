//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read `DATABASE_URL` for the subcommands.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    Ok(SecretString::from(std::env::var("DATABASE_URL").map_err(
        |_| "DATABASE_URL must be set",
    )?))
}
