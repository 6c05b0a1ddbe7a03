use crate::capture::interface::ScreenCapture;
use crate::config::Config;
use crate::library::logger::interface::Logger;
use crate::region::{self, SharedRegion};
use crate::registry::{self, LabelTable, ModelEntry, ModelSlot};
use crate::worker::{CaptureWorker, WorkerEvent};
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Single-window UI shell. Owns all widget state; the capture worker only
/// reaches it through the event channel drained at the top of each frame.
pub struct ClassifierApp {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    capture: Arc<dyn ScreenCapture + Send + Sync>,
    slot: ModelSlot,
    registry: Vec<ModelEntry>,
    /// Registry index shown in the model combo box. `None` when the active
    /// model is not in the registry (or no model is loaded).
    selected_model: Option<usize>,
    use_custom_region: bool,
    region_x: u32,
    region_y: u32,
    region_width: u32,
    region_height: u32,
    shared_region: Arc<SharedRegion>,
    worker: Option<CaptureWorker>,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
    preview: Option<egui::TextureHandle>,
    results: String,
    status: String,
}

impl ClassifierApp {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        capture: Arc<dyn ScreenCapture + Send + Sync>,
        slot: ModelSlot,
        registry: Vec<ModelEntry>,
    ) -> Self {
        let (events_tx, events_rx) = channel();

        let selected_model = active_position(&registry, &slot);
        let status = if registry.is_empty() {
            format!("No models found in {}", config.model_dir.display())
        } else {
            "Ready".to_string()
        };

        Self {
            config,
            logger: logger.with_namespace("app"),
            capture,
            slot,
            registry,
            selected_model,
            use_custom_region: false,
            region_x: region::DEFAULT_X,
            region_y: region::DEFAULT_Y,
            region_width: region::DEFAULT_WIDTH,
            region_height: region::DEFAULT_HEIGHT,
            shared_region: Arc::new(SharedRegion::new()),
            worker: None,
            events_tx,
            events_rx,
            preview: None,
            results: "Waiting to start...".to_string(),
            status,
        }
    }

    /// Combo box label. Falls back to the active model's name when the
    /// registry no longer contains it, never to an arbitrary entry.
    fn model_selector_text(&self) -> String {
        self.selected_model
            .and_then(|i| self.registry.get(i))
            .map(|e| e.display_name.clone())
            .or_else(|| self.slot.active().map(|a| a.entry.display_name.clone()))
            .unwrap_or_else(|| "(none)".to_string())
    }

    fn region_status(&self) -> String {
        format!(
            "Custom region: X={}, Y={}, width={}, height={}",
            self.region_x, self.region_y, self.region_width, self.region_height
        )
    }

    fn start_capture(&mut self, ctx: &egui::Context) {
        if self.worker.is_some() {
            return;
        }
        let classifier = match self.slot.active() {
            Some(active) => active.classifier.clone(),
            None => {
                self.status = "No model loaded".to_string();
                return;
            }
        };

        let repaint_ctx = ctx.clone();
        let wake: Arc<dyn Fn() + Send + Sync> = Arc::new(move || repaint_ctx.request_repaint());

        self.worker = Some(CaptureWorker::spawn(
            self.config.clone(),
            self.logger.clone(),
            self.capture.clone(),
            classifier,
            self.shared_region.clone(),
            self.events_tx.clone(),
            wake,
        ));
        self.results = "Capturing, please wait...".to_string();
        self.status = "Capturing...".to_string();
    }

    fn stop_capture(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        self.preview = None;
        self.results = "Waiting to start...".to_string();
        self.status = "Stopped".to_string();
    }

    /// Stops capture, loads the newly selected model and swaps it in. On
    /// failure the previous model stays active and the selector is left
    /// pointing at it.
    fn switch_model(&mut self, index: usize) {
        let entry = match self.registry.get(index) {
            Some(entry) => entry.clone(),
            None => return,
        };
        if self.worker.is_some() {
            self.stop_capture();
        }

        match self.slot.switch(&entry) {
            Ok(()) => {
                self.selected_model = Some(index);
                self.preview = None;
                self.results = "Waiting to start...".to_string();
                self.status = format!("Model loaded: {}", entry.display_name);
                let _ = self.logger.info(&format!("switched to model {}", entry.id));
            }
            Err(e) => {
                self.status = format!("Failed to load {}: {}", entry.display_name, e);
                let _ = self
                    .logger
                    .error(&format!("model switch to {} failed: {}", entry.id, e));
            }
        }
    }

    fn refresh_models(&mut self) {
        let table = LabelTable::load_or_builtin(&self.config.labels_path());
        self.registry = registry::scan(&self.config.model_dir, &table);

        self.selected_model = active_position(&self.registry, &self.slot);
        self.status = if self.registry.is_empty() {
            format!("No models found in {}", self.config.model_dir.display())
        } else {
            format!("Found {} model(s)", self.registry.len())
        };
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                WorkerEvent::Frame { preview, predictions, captured_at } => {
                    let size = [preview.width() as usize, preview.height() as usize];
                    let rgba = preview.to_rgba8();
                    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    match &mut self.preview {
                        Some(texture) => texture.set(color, egui::TextureOptions::LINEAR),
                        None => {
                            self.preview =
                                Some(ctx.load_texture("preview", color, egui::TextureOptions::LINEAR))
                        }
                    }

                    let timestamp = captured_at.format("%H:%M:%S");
                    let mut text = format!("[{}] Classification results:\n\n", timestamp);
                    for (i, prediction) in predictions.iter().enumerate() {
                        text.push_str(&format!(
                            "{}. {}: {:.2}%\n",
                            i + 1,
                            prediction.label,
                            prediction.confidence * 100.0
                        ));
                    }
                    self.results = text;
                    self.status = format!("Last update: {}", timestamp);
                }
                WorkerEvent::Recovering { failures } => {
                    self.status =
                        format!("Capture error, recovering... (error #{})", failures);
                }
            }
        }
    }

    fn controls_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.worker.is_some();
            if ui.add_enabled(!running, egui::Button::new("Start capture")).clicked() {
                self.start_capture(ctx);
            }
            if ui.add_enabled(running, egui::Button::new("Stop capture")).clicked() {
                self.stop_capture();
            }

            ui.separator();
            ui.label("Capture area:");
            let mut custom = self.use_custom_region;
            egui::ComboBox::from_id_source("capture-area")
                .selected_text(if custom { "Custom region" } else { "Full screen" })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut custom, false, "Full screen");
                    ui.selectable_value(&mut custom, true, "Custom region");
                });
            if custom != self.use_custom_region {
                self.use_custom_region = custom;
                self.shared_region.set_custom_enabled(custom);
                self.status = if custom {
                    self.region_status()
                } else {
                    "Ready".to_string()
                };
            }
        });

        if self.use_custom_region {
            ui.horizontal(|ui| {
                ui.label("X:");
                let mut changed = ui
                    .add(egui::DragValue::new(&mut self.region_x).clamp_range(0..=1920))
                    .changed();
                ui.label("Y:");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.region_y).clamp_range(0..=1080))
                    .changed();
                ui.label("Width:");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.region_width).clamp_range(100..=800))
                    .changed();
                ui.label("Height:");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.region_height).clamp_range(100..=600))
                    .changed();
                if ui.button("Reset").clicked() {
                    self.region_x = region::DEFAULT_X;
                    self.region_y = region::DEFAULT_Y;
                    self.region_width = region::DEFAULT_WIDTH;
                    self.region_height = region::DEFAULT_HEIGHT;
                    changed = true;
                }
                if changed {
                    self.shared_region.set_rect(
                        self.region_x,
                        self.region_y,
                        self.region_width,
                        self.region_height,
                    );
                    self.status = self.region_status();
                }
            });
        }

        ui.horizontal(|ui| {
            ui.label("Model:");
            let mut choice = self.selected_model;
            egui::ComboBox::from_id_source("model")
                .selected_text(self.model_selector_text())
                .show_ui(ui, |ui| {
                    for (i, entry) in self.registry.iter().enumerate() {
                        ui.selectable_value(&mut choice, Some(i), &entry.display_name);
                    }
                });
            if choice != self.selected_model {
                if let Some(index) = choice {
                    self.switch_model(index);
                }
            }
            if ui.button("Refresh").clicked() {
                self.refresh_models();
            }
        });
    }
}

fn active_position(registry: &[ModelEntry], slot: &ModelSlot) -> Option<usize> {
    let active = slot.active()?;
    registry.iter().position(|e| e.id == active.entry.id)
}

impl eframe::App for ClassifierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls_ui(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| match &self.preview {
                Some(texture) => {
                    ui.add(egui::Image::new((texture.id(), texture.size_vec2())));
                }
                None => {
                    ui.add_space(40.0);
                    ui.label("Waiting to start...");
                    ui.add_space(40.0);
                }
            });

            ui.separator();
            ui.label("Classification results");
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.monospace(&self.results);
                });
        });
    }
}

pub fn window_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    }
}

struct ErrorWindow {
    message: String,
}

impl eframe::App for ErrorWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.label(&self.message);
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }
}

/// Blocking dialog shown when the startup model fails to load.
pub fn run_error_window(message: &str) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([400.0, 200.0])
            .with_resizable(false),
        ..Default::default()
    };
    let window = ErrorWindow { message: message.to_string() };
    eframe::run_native("Error", options, Box::new(|_cc| Box::new(window)))
}

#[cfg(test)]
mod app_test {
    use super::*;
    use crate::capture::impl_fake::ScreenCaptureFake;
    use crate::classifier::impl_fake::ModelLoaderFake;
    use crate::library::logger::impl_console::LoggerConsole;
    use std::path::PathBuf;

    fn entry(id: &str) -> ModelEntry {
        ModelEntry {
            id: id.to_string(),
            path: PathBuf::from(format!("model/{}.tflite", id)),
            display_name: id.to_string(),
            labels: vec![],
        }
    }

    fn app_with(slot: ModelSlot, registry: Vec<ModelEntry>) -> ClassifierApp {
        let config = Config::default();
        let logger = Arc::new(LoggerConsole::new(config.logger_timezone));
        let capture = Arc::new(ScreenCaptureFake::new());
        ClassifierApp::new(config, logger, capture, slot, registry)
    }

    #[test]
    fn test_selector_points_at_active_model() {
        let mut slot = ModelSlot::new(Arc::new(ModelLoaderFake::new()));
        slot.switch(&entry("animals")).unwrap();

        let app = app_with(slot, vec![entry("animals"), entry("zoo")]);
        assert_eq!(app.selected_model, Some(0));
        assert_eq!(app.model_selector_text(), "animals");
    }

    #[test]
    fn test_selector_keeps_active_name_when_rescan_drops_it() {
        let mut slot = ModelSlot::new(Arc::new(ModelLoaderFake::new()));
        slot.switch(&entry("animals")).unwrap();

        // The active model's file disappeared between scans.
        let app = app_with(slot, vec![entry("zoo")]);
        assert_eq!(app.selected_model, None);
        assert_eq!(app.model_selector_text(), "animals");
    }

    #[test]
    fn test_selector_reads_none_without_a_model() {
        let app = app_with(ModelSlot::new(Arc::new(ModelLoaderFake::new())), vec![]);
        assert_eq!(app.selected_model, None);
        assert_eq!(app.model_selector_text(), "(none)");
    }
}
