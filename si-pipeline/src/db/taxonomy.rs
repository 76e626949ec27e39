//! Taxonomy feature persistence
//!
//! Seed features are written once at bootstrap; features discovered at
//! runtime are appended. `INSERT OR IGNORE` keeps both paths idempotent and
//! guarantees a discovered code never overwrites a seed entry.

use si_common::{Result, TaxonomyCatalog};
use sqlx::SqlitePool;

use crate::services::parser::NewFeature;

/// Write the seed feature list. Safe to call on every startup.
pub async fn seed_features(pool: &SqlitePool, catalog: &TaxonomyCatalog) -> Result<u64> {
    let mut written = 0u64;
    for (code, feature) in catalog.features() {
        if !feature.is_seed {
            continue;
        }
        let result = sqlx::query(
            "INSERT OR IGNORE INTO taxonomy_features (code, display_name, suggested_module, is_seed)
             VALUES (?, ?, ?, 1)",
        )
        .bind(code)
        .bind(&feature.display_name)
        .bind(&feature.suggested_module)
        .execute(pool)
        .await?;
        written += result.rows_affected();
    }
    Ok(written)
}

/// Persist a feature code discovered during a run.
pub async fn register_feature(pool: &SqlitePool, feature: &NewFeature) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO taxonomy_features (code, display_name, suggested_module, is_seed)
         VALUES (?, ?, ?, 0)",
    )
    .bind(&feature.code)
    .bind(&feature.display_name)
    .bind(&feature.suggested_module)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load previously discovered (non-seed) features into the catalog so a new
/// run validates against everything it has ever seen.
pub async fn load_discovered_features(
    pool: &SqlitePool,
    catalog: &mut TaxonomyCatalog,
) -> Result<usize> {
    let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
        "SELECT code, display_name, suggested_module FROM taxonomy_features WHERE is_seed = 0",
    )
    .fetch_all(pool)
    .await?;

    let count = rows.len();
    for (code, display_name, suggested_module) in rows {
        catalog.register_feature(&code, &display_name, suggested_module.as_deref());
    }
    Ok(count)
}
