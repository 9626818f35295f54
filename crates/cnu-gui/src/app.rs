//! Main application struct and eframe::App implementation

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use cnu_config::load_settings;
use cnu_gui::state::{AppState, View};
use cnu_gui::worker::{self, Notify, WorkerMessage};
use eframe::egui;

use crate::views::{LoginView, ProgressOverlay, UploadAction, UploadView};

pub struct UploaderApp {
    state: AppState,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
}

impl UploaderApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let (settings, settings_error) = match load_settings(None) {
            Ok(settings) => (settings, None),
            Err(err) => {
                tracing::error!("Failed to load settings: {}", err);
                (Default::default(), Some(err.user_message()))
            }
        };
        tracing::info!(environment = %settings.environment, "settings loaded");

        let (tx, rx) = mpsc::channel();
        Self {
            state: AppState::new(settings, settings_error),
            tx,
            rx,
        }
    }

    fn notifier(ctx: &egui::Context) -> Notify {
        let ctx = ctx.clone();
        Arc::new(move || ctx.request_repaint())
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.state.apply(message);
        }
    }
}

impl eframe::App for UploaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        let mut action = None;
        let mut sign_in = false;
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Login => sign_in = LoginView::show(ui, &mut self.state),
            View::Upload => action = UploadView::show(ui, &mut self.state),
        });

        if self.state.upload.running {
            ProgressOverlay::show(ctx, &self.state);
        }

        if sign_in && let Some((email, password)) = self.state.begin_sign_in() {
            worker::spawn_sign_in(
                self.state.settings.clone(),
                email,
                password,
                self.tx.clone(),
                Self::notifier(ctx),
            );
        }

        match action {
            Some(UploadAction::Open(path)) => {
                tracing::info!("Selected workbook: {:?}", path);
                self.state.begin_parse(path.clone());
                worker::spawn_parse(
                    path,
                    self.state.parse_options(),
                    self.tx.clone(),
                    Self::notifier(ctx),
                );
            }
            Some(UploadAction::Process) => {
                if let Some(job) = self.state.begin_upload() {
                    worker::spawn_upload(job, self.tx.clone(), Self::notifier(ctx));
                }
            }
            Some(UploadAction::SignOut) => self.state.sign_out(),
            None => {}
        }
    }
}
