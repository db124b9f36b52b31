//! Deterministic reference-data seed: outlets, their service areas, and the
//! per-kilogram rate catalog. Idempotent, so the seed command can be re-run
//! against an existing database.

use crate::DbPool;

/// Fixed outlet ids so repeated seeding never duplicates rows.
const OUTLETS: &[(&str, &str, bool)] = &[
    ("6a1f1f6e-1111-4a61-9f30-0aa15500a001", "FreshFold Kothrud", true),
    ("6a1f1f6e-2222-4a61-9f30-0aa15500a002", "FreshFold Baner", true),
    ("6a1f1f6e-3333-4a61-9f30-0aa15500a003", "FreshFold Viman Nagar", false),
];

const AREAS: &[(&str, &str)] = &[
    ("kothrud", "6a1f1f6e-1111-4a61-9f30-0aa15500a001"),
    ("karve road", "6a1f1f6e-1111-4a61-9f30-0aa15500a001"),
    ("deccan", "6a1f1f6e-1111-4a61-9f30-0aa15500a001"),
    ("fc road", "6a1f1f6e-1111-4a61-9f30-0aa15500a001"),
    ("sinhagad road", "6a1f1f6e-1111-4a61-9f30-0aa15500a001"),
    ("baner", "6a1f1f6e-2222-4a61-9f30-0aa15500a002"),
    ("aundh", "6a1f1f6e-2222-4a61-9f30-0aa15500a002"),
    ("wakad", "6a1f1f6e-2222-4a61-9f30-0aa15500a002"),
    ("hinjewadi", "6a1f1f6e-2222-4a61-9f30-0aa15500a002"),
    ("pimple saudagar", "6a1f1f6e-2222-4a61-9f30-0aa15500a002"),
    ("viman nagar", "6a1f1f6e-3333-4a61-9f30-0aa15500a003"),
    ("koregaon park", "6a1f1f6e-3333-4a61-9f30-0aa15500a003"),
    ("camp", "6a1f1f6e-3333-4a61-9f30-0aa15500a003"),
    ("hadapsar", "6a1f1f6e-3333-4a61-9f30-0aa15500a003"),
    ("kondhwa", "6a1f1f6e-3333-4a61-9f30-0aa15500a003"),
];

const SERVICES: &[(&str, &str, &str)] = &[
    ("wash", "Wash", "50.00"),
    ("iron", "Iron", "20.00"),
    ("dry_clean", "Dry Clean", "120.00"),
    ("shoe_clean", "Shoe Clean", "100.00"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub outlets_inserted: u64,
    pub areas_inserted: u64,
    pub services_inserted: u64,
}

pub async fn seed_reference_data(pool: &DbPool) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary::default();

    for (id, name, is_active) in OUTLETS {
        let result =
            sqlx::query("INSERT OR IGNORE INTO outlets (id, name, is_active) VALUES (?1, ?2, ?3)")
                .bind(id)
                .bind(name)
                .bind(i64::from(*is_active))
                .execute(pool)
                .await?;
        summary.outlets_inserted += result.rows_affected();
    }

    for (area_name, outlet_id) in AREAS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pune_areas (area_name, outlet_id) VALUES (?1, ?2)",
        )
        .bind(area_name)
        .bind(outlet_id)
        .execute(pool)
        .await?;
        summary.areas_inserted += result.rows_affected();
    }

    for (code, display_name, rate) in SERVICES {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO services (code, display_name, rate_per_kg) VALUES (?1, ?2, ?3)",
        )
        .bind(code)
        .bind(display_name)
        .bind(rate)
        .execute(pool)
        .await?;
        summary.services_inserted += result.rows_affected();
    }

    tracing::info!(
        event_name = "fixtures.seeded",
        outlets = summary.outlets_inserted,
        areas = summary.areas_inserted,
        services = summary.services_inserted,
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use crate::{connect_with_settings, migrations};

    use super::seed_reference_data;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let first = seed_reference_data(&pool).await.expect("first seed");
        assert_eq!(first.outlets_inserted, 3);
        assert_eq!(first.services_inserted, 4);
        assert!(first.areas_inserted > 0);

        let second = seed_reference_data(&pool).await.expect("second seed");
        assert_eq!(second.outlets_inserted, 0);
        assert_eq!(second.areas_inserted, 0);
        assert_eq!(second.services_inserted, 0);
    }
}
