use std::time::Duration;

use arboard::Clipboard;
use capture::{SurfaceBounds, VideoFrame};
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use scanner_core::{ScanPolicy, ScannerViewModel, StatusIndicator};
use serde::{Deserialize, Serialize};
use shared::alert::AlertItem;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "barcode_scanner.settings";

const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(0xC0, 0x3A, 0x2B);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(0x2E, 0x8B, 0x57);

/// Frame handed from the backend preview task to the UI, already expanded to
/// RGBA for texture upload.
#[derive(Clone)]
pub(crate) struct PreviewImage {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) rgba: Vec<u8>,
}

impl PreviewImage {
    pub(crate) fn from_frame(frame: &VideoFrame) -> Self {
        let mut rgba = Vec::with_capacity(frame.luma.len() * 4);
        for &luma in &frame.luma {
            rgba.extend_from_slice(&[luma, luma, luma, 0xFF]);
        }
        Self {
            width: frame.width as usize,
            height: frame.height as usize,
            rgba,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanSessionStatus {
    Idle,
    Scanning,
    Stopped,
}

/// UI settings that survive restarts via eframe storage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PersistedScannerSettings {
    pub stop_after_first: bool,
}

fn status_color(indicator: StatusIndicator) -> egui::Color32 {
    match indicator {
        StatusIndicator::Empty => WARNING_COLOR,
        StatusIndicator::Populated => SUCCESS_COLOR,
    }
}

pub struct ScannerGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    view_model: ScannerViewModel,
    session_status: ScanSessionStatus,
    status_line: String,
    stop_after_first: bool,

    preview: Option<PreviewImage>,
    preview_texture: Option<egui::TextureHandle>,
    sent_bounds: Option<SurfaceBounds>,
    last_scan_at: Option<DateTime<Local>>,

    tick: u64,
}

impl ScannerGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedScannerSettings>,
    ) -> Self {
        let settings = persisted.unwrap_or_default();
        let mut app = Self {
            cmd_tx,
            ui_rx,
            view_model: ScannerViewModel::new(),
            session_status: ScanSessionStatus::Idle,
            status_line: "Starting scanner...".to_string(),
            stop_after_first: settings.stop_after_first,
            preview: None,
            preview_texture: None,
            sent_bounds: None,
            last_scan_at: None,
            tick: 0,
        };
        // Scanning begins as soon as the app is visible, like any scanner
        // view would on load.
        app.request_start();
        app
    }

    fn scan_policy(&self) -> ScanPolicy {
        if self.stop_after_first {
            ScanPolicy::StopAfterFirstMatch
        } else {
            ScanPolicy::Continuous
        }
    }

    fn request_start(&mut self) {
        self.view_model.dismiss_alert();
        let policy = self.scan_policy();
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::StartScanning { policy },
            &mut self.status_line,
        );
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::ScannerStarted => {
                    self.session_status = ScanSessionStatus::Scanning;
                    self.status_line = "Scanning for barcodes".to_string();
                }
                UiEvent::ScannerStopped => {
                    self.session_status = ScanSessionStatus::Stopped;
                    self.status_line = "Scanner stopped".to_string();
                    self.sent_bounds = None;
                }
                UiEvent::BarcodeFound(code) => {
                    self.view_model.record_scan(code);
                    self.last_scan_at = Some(Local::now());
                }
                UiEvent::ScannerError(error) => {
                    self.status_line = error.to_string();
                    self.view_model
                        .present_alert(AlertItem::for_camera_error(error));
                }
                UiEvent::PreviewFrame(image) => {
                    self.preview = Some(image);
                    self.preview_texture = None;
                }
                UiEvent::Info(message) => {
                    self.status_line = message;
                }
                UiEvent::WorkerFailed(reason) => {
                    self.session_status = ScanSessionStatus::Stopped;
                    self.status_line = format!("Scanner worker failed: {reason}");
                }
            }
        }
    }

    fn show_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls_panel").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Barcode Scanner");
                ui.separator();
                let scanning = self.session_status == ScanSessionStatus::Scanning;
                if ui
                    .add_enabled(!scanning, egui::Button::new("Start scanning"))
                    .clicked()
                {
                    self.request_start();
                }
                if ui.add_enabled(scanning, egui::Button::new("Stop")).clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::StopScanning,
                        &mut self.status_line,
                    );
                }
                ui.checkbox(&mut self.stop_after_first, "Stop after first match");
            });
            ui.add_space(6.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let indicator = self.view_model.status_indicator();
                ui.label(
                    egui::RichText::new(self.view_model.status_text())
                        .color(status_color(indicator))
                        .strong()
                        .size(20.0),
                );
                if indicator == StatusIndicator::Populated {
                    if ui.button("Copy").clicked() {
                        if let Ok(mut clipboard) = Clipboard::new() {
                            let _ = clipboard.set_text(self.view_model.scanned_code.clone());
                            self.status_line = "Scanned code copied to clipboard".to_string();
                        }
                    }
                    if let Some(at) = self.last_scan_at {
                        ui.small(
                            egui::RichText::new(format!("scanned at {}", at.format("%H:%M:%S")))
                                .weak(),
                        );
                    }
                }
            });
            ui.small(egui::RichText::new(&self.status_line).weak());
            ui.add_space(4.0);
        });
    }

    fn show_preview(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let bounds = SurfaceBounds::new(
                available.x.max(0.0) as u32,
                available.y.max(0.0) as u32,
            );
            if self.session_status == ScanSessionStatus::Scanning
                && bounds.width > 0
                && bounds.height > 0
                && self.sent_bounds != Some(bounds)
            {
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::ResizePreview { bounds },
                    &mut self.status_line,
                );
                self.sent_bounds = Some(bounds);
            }

            if self.preview_texture.is_none() {
                if let Some(image) = self.preview.take() {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    self.preview_texture = Some(ui.ctx().load_texture(
                        "camera_preview",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }

            if let Some(texture) = &self.preview_texture {
                let texture_size = texture.size_vec2();
                let scale = (available.x / texture_size.x)
                    .min(available.y / texture_size.y)
                    .min(1.0);
                let preview_size = texture_size * scale;
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(preview_size));
                });
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Camera preview unavailable").weak());
                });
            }
        });
    }

    fn show_alert_modal(&mut self, ctx: &egui::Context) {
        let Some(alert) = self.view_model.alert.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(egui::RichText::new(&alert.title).strong())
            .id(egui::Id::new("scanner_alert"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&alert.message);
                ui.add_space(8.0);
                if ui.button(&alert.dismiss_label).clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.view_model.dismiss_alert();
        }
    }
}

impl eframe::App for ScannerGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick = self.tick.wrapping_add(1);

        self.process_ui_events();
        self.show_controls(ctx);
        self.show_status_bar(ctx);
        self.show_preview(ctx);
        self.show_alert_modal(ctx);

        if self.session_status == ScanSessionStatus::Scanning {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedScannerSettings {
            stop_after_first: self.stop_after_first,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
