//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `hr_core` linkage with a deterministic health check.
//! - With a database path argument, print the stored reviews one per line.

use hr_core::db::open_db;
use hr_core::{ReviewService, SqliteReviewRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("hr_core ping={}", hr_core::ping());
    println!("hr_core version={}", hr_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    if let Some(log_dir) = std::env::var_os("HR_LOG_DIR") {
        if let Err(err) = hr_core::init_logging(
            hr_core::default_log_level(),
            &log_dir.to_string_lossy(),
        ) {
            eprintln!("logging disabled: {err}");
        }
    }

    match print_reviews(&db_path) {
        Ok(count) => {
            println!("reviews={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_list module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_reviews(db_path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn)?);
    service.ensure_schema()?;

    let reviews = service.list_reviews()?;
    for review in &reviews {
        println!("{}", review.borrow());
    }
    Ok(reviews.len())
}
