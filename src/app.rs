use crate::logic::report::{self, default_report_dir};
use crate::logic::{
    HttpServerApi, Notifier, Projector, SnapshotStore, ToastKind, ToastNotifier, ViewStream,
};
use crate::model::{
    AppSettings, Operation, ServerDraft, ServerRecord, ServerStatus, StatusFilter, ViewState,
};
use eframe::egui;
use eframe::egui::{Color32, RichText};
use egui_extras::{Column, TableBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tr::tr;
use tracing::info;

pub struct FleetApp {
    pub(crate) settings: AppSettings,
    pub(crate) projector: Projector,
    pub(crate) notifier: ToastNotifier,
    pub(crate) view: ViewState,
    pub(crate) stream: Option<ViewStream>,
    /// Saves replaced by a later action before they settled
    pub(crate) pending_saves: Vec<ViewStream>,
    pub(crate) status_filter: StatusFilter,
    pub draft: ServerDraft,
    pub(crate) draft_error: Option<String>,
    pub(crate) add_window_open: bool,
    pub(crate) deleting_server: Option<u64>,
    pub(crate) settings_window: Option<AppSettings>,
    /// Worker threads for remote calls, when the app created them.
    _runtime: Option<tokio::runtime::Runtime>,
}

/// What a click in the server table asks for.
enum RowAction {
    Ping(String),
    Delete(u64),
    Reload,
}

/// Status and toast colors for the current light/dark theme.
struct FleetVisuals {
    pub is_dark: bool,
}

impl FleetVisuals {
    fn from_ctx(ctx: &egui::Context) -> Self {
        Self {
            is_dark: ctx.style().visuals.dark_mode,
        }
    }

    fn error_color(&self) -> Color32 {
        Color32::from_rgb(213, 94, 0) // Vermilion
    }

    fn up_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_rgb(86, 180, 233) // Sky Blue
        } else {
            Color32::from_rgb(0, 114, 178) // Blue
        }
    }

    fn status_color(&self, status: ServerStatus) -> Color32 {
        match status {
            ServerStatus::Up => self.up_color(),
            ServerStatus::Down => self.error_color(),
        }
    }

    fn toast_color(&self, kind: ToastKind) -> Color32 {
        match kind {
            ToastKind::Success => Color32::from_rgb(0, 158, 115), // Bluish green
            ToastKind::Error => self.error_color(),
            ToastKind::Info => {
                if self.is_dark {
                    Color32::from_rgb(240, 228, 66) // Yellow
                } else {
                    Color32::from_rgb(230, 159, 0) // Orange
                }
            }
        }
    }
}

impl FleetApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        let settings = cc
            .storage
            .and_then(|storage| storage.get_string(eframe::APP_KEY))
            .and_then(|serialized| serde_json::from_str::<AppSettings>(&serialized).ok())
            .unwrap_or_default()
            .with_env_override();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let notifier = ToastNotifier::new();
        let ctx = cc.egui_ctx.clone();
        let projector = Projector::new(
            Arc::new(HttpServerApi::from_settings(&settings)),
            Arc::new(notifier.clone()),
            Arc::new(SnapshotStore::new()),
            runtime.handle().clone(),
        )
        .with_settle_hook(move || ctx.request_repaint());

        info!(api = %settings.api_address, "starting fleet monitor");
        let mut app = Self::from_parts(projector, notifier, settings);
        app._runtime = Some(runtime);
        app.reload();
        Ok(app)
    }

    /// Builds the app around an existing projector. Nothing is requested
    /// until [`FleetApp::reload`] is called.
    pub fn from_parts(projector: Projector, notifier: ToastNotifier, settings: AppSettings) -> Self {
        Self {
            settings,
            projector,
            notifier,
            view: ViewState::Loading,
            stream: None,
            pending_saves: Vec::new(),
            status_filter: StatusFilter::All,
            draft: ServerDraft::default(),
            draft_error: None,
            add_window_open: false,
            deleting_server: None,
            settings_window: None,
            _runtime: None,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        self.projector.store()
    }

    fn run(&mut self, stream: ViewStream) {
        // An unsettled save keeps being drained so its form still resets
        if let Some(previous) = self.stream.replace(stream)
            && previous.operation() == Operation::Save
            && !self.view.is_terminal()
        {
            self.pending_saves.push(previous);
        }
        self.poll_view();
    }

    /// Moves the current stream's queued values into the view.
    pub fn poll_view(&mut self) {
        let mut saved = false;
        self.pending_saves.retain_mut(|stream| {
            while let Some(state) = stream.try_next() {
                if state.is_terminal() {
                    saved |= state.envelope().is_some();
                    return false;
                }
            }
            true
        });
        if saved {
            self.finish_save();
        }

        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let operation = stream.operation();
        let states: Vec<ViewState> = std::iter::from_fn(|| stream.try_next()).collect();
        for state in states {
            if state.envelope().is_some() {
                match operation {
                    Operation::Save => {
                        self.finish_save();
                        self.status_filter = StatusFilter::All;
                    }
                    Operation::Filter => {}
                    _ => self.status_filter = StatusFilter::All,
                }
            }
            self.view = state;
        }
    }

    fn finish_save(&mut self) {
        self.draft.reset();
        self.draft_error = None;
        self.add_window_open = false;
    }

    pub fn reload(&mut self) {
        let stream = self.projector.load_all();
        self.run(stream);
    }

    pub fn ping(&mut self, address: &str) {
        let stream = self.projector.ping(address);
        self.run(stream);
    }

    pub fn apply_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        let stream = self.projector.filter_by_status(filter);
        self.run(stream);
    }

    pub fn delete(&mut self, id: u64) {
        let stream = self.projector.delete(id);
        self.run(stream);
    }

    /// Validates the form and sends it. Validation errors stay in the form.
    pub fn submit_draft(&mut self) {
        match self.draft.validate() {
            Ok(draft) => {
                self.draft_error = None;
                let stream = self.projector.save(draft);
                self.run(stream);
            }
            Err(e) => self.draft_error = Some(e.to_string()),
        }
    }

    pub fn apply_settings(&mut self, settings: AppSettings) {
        let api = HttpServerApi::from_settings(&settings);
        info!(api = api.address(), "switching server-manager API");
        self.projector = self.projector.with_api(Arc::new(api));
        self.settings = settings;
        self.reload();
    }

    fn displayed_servers(&self) -> Vec<ServerRecord> {
        match &self.view {
            ViewState::Loaded(envelope) => envelope.servers().to_vec(),
            _ => self
                .store()
                .snapshot()
                .map(|s| s.servers().to_vec())
                .unwrap_or_default(),
        }
    }

    pub fn print_report(&mut self) {
        let dir = self
            .settings
            .report_dir
            .clone()
            .unwrap_or_else(default_report_dir);
        match report::export_report(&self.displayed_servers(), &dir) {
            Ok(_) => self.notifier.notify_info(&tr!("Report downloaded")),
            Err(e) => self.notifier.notify_error(&e.to_string()),
        }
    }

    pub fn ui_layout(&mut self, ctx: &egui::Context) {
        self.poll_view();

        let visuals = FleetVisuals::from_ctx(ctx);
        let busy = self.store().is_busy();
        let highlighted = self.store().highlighted();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(tr!("Manage Servers"));
                ui.separator();

                ui.label(tr!("Filter:"));
                let mut filter = self.status_filter;
                egui::ComboBox::from_id_salt("status_filter")
                    .selected_text(filter.label())
                    .show_ui(ui, |ui| {
                        for choice in StatusFilter::CHOICES {
                            ui.selectable_value(&mut filter, choice, choice.label());
                        }
                    });
                if filter != self.status_filter {
                    self.apply_filter(filter);
                }

                if ui.button(tr!("Refresh")).clicked() {
                    self.reload();
                }
                if ui.button(tr!("New Server")).clicked() {
                    self.add_window_open = true;
                    self.draft_error = None;
                }
                if ui.button(tr!("Print Report")).clicked() {
                    self.print_report();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙").clicked() {
                        self.settings_window = Some(self.settings.clone());
                    }
                    let mut theme = ui.ctx().options(|o| o.theme_preference);
                    let old_theme = theme;
                    theme.radio_buttons(ui);
                    if theme != old_theme {
                        ui.ctx().options_mut(|o| o.theme_preference = theme);
                    }
                });
            });
        });

        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            match &self.view {
                ViewState::Loading => {
                    ui.label(RichText::new(tr!("Loading...")).strong());
                }
                ViewState::Error(reason) => {
                    ui.horizontal(|ui| {
                        ui.colored_label(
                            visuals.error_color(),
                            RichText::new(format!("{}: {}", tr!("Error"), reason)).strong(),
                        );
                        if ui.button(tr!("Retry")).clicked() {
                            action = Some(RowAction::Reload);
                        }
                    });
                }
                ViewState::Loaded(_) => {}
            }
            ui.separator();

            let servers = self.displayed_servers();
            if servers.is_empty() {
                if self.view.envelope().is_some() {
                    ui.label(tr!("No servers"));
                }
            } else {
                egui::ScrollArea::horizontal().show(ui, |ui| {
                    if let Some(clicked) =
                        server_table(ui, &servers, highlighted.as_deref(), &visuals)
                    {
                        action = Some(clicked);
                    }
                });
            }
        });

        match action {
            Some(RowAction::Ping(address)) => self.ping(&address),
            Some(RowAction::Delete(id)) => self.deleting_server = Some(id),
            Some(RowAction::Reload) => self.reload(),
            None => {}
        }

        self.delete_dialog(ctx);
        self.add_server_window(ctx, busy, &visuals);
        self.settings_dialog(ctx);
        self.toasts(ctx, &visuals);
    }

    fn delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(id) = self.deleting_server else {
            return;
        };
        let label = self
            .store()
            .snapshot()
            .and_then(|s| s.find(id).map(|r| format!("{} ({})", r.name, r.address)))
            .unwrap_or_else(|| id.to_string());

        let mut confirmed = None;
        egui::Window::new(tr!("Confirm Deletion"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{}: {}?",
                    tr!("Are you sure you want to delete this server"),
                    label
                ));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button(tr!("Delete")).clicked() {
                        confirmed = Some(true);
                    }
                    if ui.button(tr!("Cancel")).clicked() {
                        confirmed = Some(false);
                    }
                });
            });

        match confirmed {
            Some(true) => {
                self.deleting_server = None;
                self.delete(id);
            }
            Some(false) => self.deleting_server = None,
            None => {}
        }
    }

    fn add_server_window(&mut self, ctx: &egui::Context, busy: bool, visuals: &FleetVisuals) {
        if !self.add_window_open {
            return;
        }

        let mut open = true;
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new(tr!("Add Server"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("server_form")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label(tr!("IP Address"));
                        ui.text_edit_singleline(&mut self.draft.address);
                        ui.end_row();

                        ui.label(tr!("Name"));
                        ui.text_edit_singleline(&mut self.draft.name);
                        ui.end_row();

                        ui.label(tr!("Memory"));
                        ui.text_edit_singleline(&mut self.draft.memory);
                        ui.end_row();

                        ui.label(tr!("Type"));
                        ui.text_edit_singleline(&mut self.draft.server_type);
                        ui.end_row();

                        ui.label(tr!("Status"));
                        egui::ComboBox::from_id_salt("draft_status")
                            .selected_text(self.draft.status.label())
                            .show_ui(ui, |ui| {
                                for status in [ServerStatus::Up, ServerStatus::Down] {
                                    ui.selectable_value(&mut self.draft.status, status, status.label());
                                }
                            });
                        ui.end_row();
                    });

                if let Some(error) = &self.draft_error {
                    ui.colored_label(visuals.error_color(), error);
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let save_label = if busy { tr!("Saving...") } else { tr!("Save") };
                    if ui.add_enabled(!busy, egui::Button::new(save_label)).clicked() {
                        submit = true;
                    }
                    if ui.button(tr!("Cancel")).clicked() {
                        cancel = true;
                    }
                });
            });

        if submit {
            self.submit_draft();
        }
        if cancel || !open {
            self.add_window_open = false;
            self.draft_error = None;
        }
    }

    fn settings_dialog(&mut self, ctx: &egui::Context) {
        let Some(mut edited) = self.settings_window.take() else {
            return;
        };

        let mut open = true;
        let mut apply = false;
        egui::Window::new(tr!("Settings"))
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(tr!("API address:"));
                    ui.text_edit_singleline(&mut edited.api_address);
                });
                ui.horizontal(|ui| {
                    ui.label(tr!("Request timeout:"));
                    ui.add(
                        egui::DragValue::new(&mut edited.request_timeout_secs)
                            .range(1..=120)
                            .suffix(tr!(" s")),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label(tr!("Report folder:"));
                    let mut dir = edited
                        .report_dir
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    let edit = egui::TextEdit::singleline(&mut dir)
                        .hint_text(default_report_dir().display().to_string());
                    if ui.add(edit).changed() {
                        let dir = dir.trim();
                        edited.report_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
                    }
                });
                ui.add_space(8.0);
                if ui.button(tr!("Apply")).clicked() {
                    apply = true;
                }
            });

        if apply {
            self.apply_settings(edited);
        } else if open {
            self.settings_window = Some(edited);
        }
    }

    fn toasts(&self, ctx: &egui::Context, visuals: &FleetVisuals) {
        let toasts = self.notifier.active();
        if toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                let mut dismissed = false;
                for toast in &toasts {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let text = RichText::new(&toast.text)
                            .strong()
                            .color(visuals.toast_color(toast.kind));
                        if ui
                            .add(egui::Label::new(text).sense(egui::Sense::click()))
                            .on_hover_text(tr!("Click to dismiss"))
                            .clicked()
                        {
                            dismissed = true;
                        }
                    });
                }
                if dismissed {
                    self.notifier.dismiss_all();
                }
            });
    }
}

fn server_table(
    ui: &mut egui::Ui,
    servers: &[ServerRecord],
    highlighted: Option<&str>,
    visuals: &FleetVisuals,
) -> Option<RowAction> {
    let mut action = None;
    let headers = [
        tr!("ID"),
        tr!("IP Address"),
        tr!("Name"),
        tr!("Memory"),
        tr!("Type"),
        tr!("Status"),
        tr!("Last Ping"),
        tr!("Actions"),
    ];

    TableBuilder::new(ui)
        .id_salt("servers")
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(40.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(70.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::remainder().at_least(120.0))
        .header(22.0, |mut header| {
            for title in &headers {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for server in servers {
                let pinging = highlighted == Some(server.address.as_str());
                body.row(26.0, |mut row| {
                    row.col(|ui| {
                        ui.label(server.id.to_string());
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(&server.address).monospace());
                    });
                    row.col(|ui| {
                        ui.label(&server.name);
                    });
                    row.col(|ui| {
                        ui.label(&server.memory);
                    });
                    row.col(|ui| {
                        ui.label(&server.server_type);
                    });
                    row.col(|ui| {
                        ui.colored_label(
                            visuals.status_color(server.status),
                            RichText::new(server.status.label()).strong(),
                        );
                    });
                    row.col(|ui| {
                        let last_ping = server
                            .last_ping
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".to_string());
                        ui.label(last_ping);
                    });
                    row.col(|ui| {
                        if pinging {
                            ui.label(tr!("Pinging..."));
                        } else if ui.button(tr!("Ping")).clicked() {
                            action = Some(RowAction::Ping(server.address.clone()));
                        }
                        if ui
                            .button("x")
                            .on_hover_text(tr!("Delete server"))
                            .clicked()
                        {
                            action = Some(RowAction::Delete(server.id));
                        }
                    });
                });
            }
        });

    action
}

impl eframe::App for FleetApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let serialized = serde_json::to_string_pretty(&self.settings).unwrap_or_default();
        storage.set_string(eframe::APP_KEY, serialized);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_layout(ctx);
        // Toasts expire on a timer
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
