//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `cms_core` wiring end to end: config, logging, storage, reads.
//! - Keep output deterministic for quick local sanity checks.

use cms_core::db::open_db_with_options;
use cms_core::{
    core_version, init_logging, CoreConfig, MediaFilter, MediaRepository, PageFilter,
    PageRepository, PostFilter, PostRepository, SqliteMediaRepository, SqlitePageRepository,
    SqlitePostRepository,
};
use log::error;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("cms_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let conn = open_db_with_options(&config.db_path, &config.db_options())?;
    let pages = SqlitePageRepository::try_new(&conn)?.list_pages(&PageFilter::default())?;
    let posts = SqlitePostRepository::try_new(&conn)?.list_posts(&PostFilter::default())?;
    let media = SqliteMediaRepository::try_new(&conn)?.list_media(&MediaFilter::default())?;

    println!("cms_core version={}", core_version());
    println!("db_path={}", config.db_path.display());
    println!(
        "pages={} posts={} media={}",
        pages.len(),
        posts.len(),
        media.len()
    );
    Ok(())
}
