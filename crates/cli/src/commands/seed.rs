//! Seed reference data.

use samara_storefront::db::CityRepository;
use tracing::info;

/// Cities covered by delivery out of the box.
pub const DEFAULT_CITIES: [&str; 6] = [
    "Dublin",
    "Cork",
    "Galway",
    "Limerick",
    "Waterford",
    "Kilkenny",
];

/// Insert the default delivery cities.
///
/// Existing cities (matched case-insensitively) are left untouched, so a city
/// switched off in the dashboard stays off.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn cities() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let repo = CityRepository::new(&pool);

    let mut inserted = 0;
    for name in DEFAULT_CITIES {
        if repo.insert_if_missing(name, true).await? {
            info!(city = name, "Inserted delivery city");
            inserted += 1;
        }
    }

    info!(
        inserted,
        skipped = DEFAULT_CITIES.len() - inserted,
        "City seeding complete"
    );
    Ok(())
}
