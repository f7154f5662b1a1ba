/// locus-rois entry point: run one configured batch.
fn main() {
    use locus_rois::{JsonStore, PipelineConfig, run_batch};

    let Some(config_path) = std::env::args_os().nth(1).map(std::path::PathBuf::from) else {
        eprintln!("Usage: locus-rois <config.json>");
        std::process::exit(2);
    };

    let config = match PipelineConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration {:?}: {}", config_path, e);
            std::process::exit(2);
        }
    };

    // RUST_LOG, when set, takes precedence over the configured level.
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_env("RUST_LOG")
        .init();
    log::debug!("Log level {}", config.log_level.name());

    let mut store = match JsonStore::open(&config.store.catalog, &config.store.output_dir) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let report = run_batch(&mut store, &config);
    if report.has_failures() {
        eprintln!("{}", report);
        std::process::exit(1);
    }
}
