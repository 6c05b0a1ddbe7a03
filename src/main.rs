use screen_classifier::app::{self, ClassifierApp};
use screen_classifier::capture::impl_xcap::ScreenCaptureXcap;
use screen_classifier::classifier::impl_tract::TractModelLoader;
use screen_classifier::config::{Config, CONFIG_FILE};
use screen_classifier::library::logger::impl_console::LoggerConsole;
use screen_classifier::library::logger::interface::Logger;
use screen_classifier::registry::{self, LabelTable, ModelEntry, ModelSlot};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(Path::new(CONFIG_FILE));
    let logger = Arc::new(LoggerConsole::new(config.logger_timezone));

    let table = LabelTable::load_or_builtin(&config.labels_path());
    let registry = registry::scan(&config.model_dir, &table);

    let mut slot = ModelSlot::new(Arc::new(TractModelLoader::new()));
    if let Some(entry) = startup_entry(&config, &registry) {
        logger
            .info(&format!("loading model {}", entry.path.display()))
            .map_err(|e| e as Box<dyn std::error::Error>)?;
        if let Err(e) = slot.switch(&entry) {
            let message = format!("Failed to load model:\n{}", e);
            logger
                .error(&message)
                .map_err(|e| e as Box<dyn std::error::Error>)?;
            app::run_error_window(&message)?;
            return Err(e);
        }
    } else {
        logger
            .info(&format!(
                "no models found in {}, starting without a model",
                config.model_dir.display()
            ))
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    }

    let capture = Arc::new(ScreenCaptureXcap::new(logger.clone()));

    let app = ClassifierApp::new(config, logger, capture, slot, registry);
    eframe::run_native(
        "Real-time Screen Classifier",
        app::window_options(),
        Box::new(|_cc| Box::new(app)),
    )?;

    Ok(())
}

/// Preferred model from the config file if it was scanned, otherwise the
/// first model in the registry.
fn startup_entry(config: &Config, registry: &[ModelEntry]) -> Option<ModelEntry> {
    config
        .model_path
        .as_ref()
        .and_then(|path| registry.iter().find(|e| &e.path == path))
        .or_else(|| registry.first())
        .cloned()
}
