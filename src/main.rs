mod catalog;
mod cli;
mod config;
mod config_persistence;
mod credentials;
mod genre_tagger;
mod media_file_discovery;
mod metadata;

use clap::Parser;
use log::info;

use crate::catalog::genre_resolver::GenreResolver;
use crate::catalog::spotify::SpotifyCatalog;
use crate::cli::Cli;
use crate::genre_tagger::{GenreTagger, TaggerOptions};
use crate::metadata::Id3TagStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    log::set_max_level(log::LevelFilter::Info);

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let cli = Cli::parse();
    let config = config_persistence::load_or_create_config()?;
    log::set_max_level(config.log_level_filter());

    let target = cli.target_path();
    let credentials = credentials::resolve_credentials(&config.catalog)?;
    let catalog = SpotifyCatalog::new(credentials, &config.catalog);
    let resolver = GenreResolver::new(catalog, config.catalog.max_rate_limit_retries);
    let options = TaggerOptions {
        write_genre_tag: config.tagging.write_genre_tag,
        comment_language: config.tagging.comment_language.clone(),
    };
    let mut tagger = GenreTagger::new(Id3TagStore, resolver, options);

    info!("Processing {}", target.display());
    let summary = tagger.process_path(&target)?;
    info!(
        "Done. files={} updated={} unchanged={} skipped={} failed={}",
        summary.files, summary.updated, summary.unchanged, summary.skipped, summary.failed
    );
    Ok(())
}
