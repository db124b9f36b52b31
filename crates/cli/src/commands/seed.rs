use crate::commands::CommandResult;
use laundryops_core::config::{AppConfig, LoadOptions};
use laundryops_db::{connect_with_settings, fixtures, migrations, SeedSummary};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summary = fixtures::seed_reference_data(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<SeedSummary, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success("seed", seed_message(&summary)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(summary: &SeedSummary) -> String {
    if summary.outlets_inserted == 0
        && summary.areas_inserted == 0
        && summary.services_inserted == 0
    {
        "reference data already present; nothing to insert".to_string()
    } else {
        format!(
            "seeded {} outlets, {} service areas, {} catalog services",
            summary.outlets_inserted, summary.areas_inserted, summary.services_inserted
        )
    }
}

#[cfg(test)]
mod tests {
    use laundryops_db::SeedSummary;

    use super::seed_message;

    #[test]
    fn first_run_reports_inserted_counts() {
        let summary =
            SeedSummary { outlets_inserted: 3, areas_inserted: 15, services_inserted: 4 };
        assert_eq!(seed_message(&summary), "seeded 3 outlets, 15 service areas, 4 catalog services");
    }

    #[test]
    fn rerun_reports_a_no_op() {
        let summary = SeedSummary::default();
        assert_eq!(seed_message(&summary), "reference data already present; nothing to insert");
    }
}
