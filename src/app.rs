use crate::config::AppConfig;
use crate::services::api::{load_items, ApiClientConfig, HttpClient};
use crate::services::liveness::{self, Liveness, PollingHandle};
use crate::ui::{
    apply_theme, paint, Animator, Command, Dashboard, DashboardItem, Dialog, DialogStack,
    Document, KeyEvent, StateTracker, DASHBOARD_ELEMENT_ID,
};
use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use eframe::{egui, App, CreationContext, NativeOptions};
use serde_json::Value;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

const INITIAL_VIEWPORT: (f32, f32) = (1280.0, 800.0);
const RETRY_LABEL: &str = "Retry";
const DISMISS_LABEL: &str = "Dismiss";

pub fn run(config: AppConfig) -> Result<()> {
    let shared_config = Arc::new(config);
    let app_name = shared_config.application_name.clone();
    let native_options = NativeOptions::default();

    eframe::run_native(
        &app_name,
        native_options,
        Box::new(move |cc| Ok(IdePanelsApp::new(cc, shared_config.clone()))),
    )
    .map_err(|err| anyhow!(err.to_string()))
}

/// Loads the dashboard and probes the server once without a window, logging
/// what a windowed session would show.
pub fn run_headless(config: &AppConfig) -> Result<()> {
    let runtime = Runtime::new().context("starting tokio runtime")?;
    let client = build_client(config)?;

    let mut document = Document::new();
    let (width, height) = INITIAL_VIEWPORT;
    let mut effects = Animator::new(width, height);
    let mut dashboard = Dashboard::new(
        &mut document,
        DASHBOARD_ELEMENT_ID,
        config.application_name.clone(),
    );
    let mut tracker = StateTracker::new(&mut document, &mut effects);

    let ready = runtime.block_on(dashboard.init(
        &mut document,
        &mut effects,
        &client,
        &config.item_list_path,
    ));
    if !ready {
        bail!(
            "dashboard item list could not be loaded from {}",
            config.item_list_path
        );
    }

    for (index, item) in dashboard.model().items().iter().enumerate() {
        info!(
            index,
            id = %item.id,
            title = %item.title,
            key = ?item.key,
            bytes = item.data.len(),
            init = item.init_program().is_some(),
            "dashboard item"
        );
    }
    if let Some(item) = dashboard.model().selected_item() {
        info!(id = %item.id, "dashboard item active");
    }

    let liveness = runtime.block_on(liveness::probe(&client, &config.ping_path));
    tracker.record(&mut document, &mut effects, liveness.is_reachable());
    effects.advance(&mut document, Duration::from_secs(1));
    info!(connected = tracker.is_connected(), "server connectivity");
    Ok(())
}

pub fn build_client(config: &AppConfig) -> Result<HttpClient> {
    let base_url = config.server_url()?;
    let client_config = ApiClientConfig::new(base_url).with_timeout(config.request_timeout());
    HttpClient::new(client_config).context("building HTTP client")
}

struct IdePanelsApp {
    config: Arc<AppConfig>,
    document: Document,
    effects: Animator,
    dashboard: Dashboard,
    tracker: StateTracker,
    dialogs: DialogStack,
    open_dialogs: Vec<Dialog>,
    command_tx: Sender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    last_frame: Instant,
    worker_failed: bool,
}

impl IdePanelsApp {
    fn new(cc: &CreationContext<'_>, config: Arc<AppConfig>) -> Box<dyn App> {
        apply_theme(&cc.egui_ctx, true);

        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        spawn_background_worker(config.clone(), command_rx, event_tx);

        let mut app = Self::with_channels(config, command_tx, event_rx);
        app.send(AppCommand::LoadDashboard);
        app.send(AppCommand::StartProbing {
            interval: app.config.ping_interval(),
        });

        Box::new(app)
    }

    fn with_channels(
        config: Arc<AppConfig>,
        command_tx: Sender<AppCommand>,
        event_rx: Receiver<AppEvent>,
    ) -> Self {
        let mut document = Document::new();
        let (width, height) = INITIAL_VIEWPORT;
        let mut effects = Animator::new(width, height);
        let dashboard = Dashboard::new(
            &mut document,
            DASHBOARD_ELEMENT_ID,
            config.application_name.clone(),
        );
        let tracker = StateTracker::new(&mut document, &mut effects);

        Self {
            config,
            document,
            effects,
            dashboard,
            tracker,
            dialogs: DialogStack::new(),
            open_dialogs: Vec::new(),
            command_tx,
            event_rx,
            last_frame: Instant::now(),
            worker_failed: false,
        }
    }

    fn send(&mut self, command: AppCommand) {
        if let Err(err) = self.command_tx.send(command) {
            error!(%err, "background worker is gone");
            self.on_worker_failed("The background worker stopped unexpectedly.".into());
        }
    }

    fn consume_events(&mut self) {
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.on_worker_failed(
                        "Background worker disconnected. Restart after checking the logs.".into(),
                    );
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DashboardLoaded(items) => {
                self.dashboard
                    .mount(&mut self.document, &mut self.effects, items);
            }
            AppEvent::DashboardFailed(message) => {
                let dialog =
                    Dialog::confirm(&mut self.document, &self.dialogs, &[RETRY_LABEL, DISMISS_LABEL]);
                self.open_dialog(
                    dialog,
                    "Dashboard unavailable",
                    format!("<p>The dashboard could not be loaded.</p><p>{message}</p>"),
                );
            }
            AppEvent::Probe(liveness) => {
                if let Liveness::Unreachable { message, .. } = &liveness {
                    if self.tracker.is_connected() {
                        warn!(%message, "server unreachable");
                    }
                }
                self.tracker
                    .record(&mut self.document, &mut self.effects, liveness.is_reachable());
            }
            AppEvent::WorkerFailed(message) => self.on_worker_failed(message),
        }
    }

    fn on_worker_failed(&mut self, message: String) {
        if self.worker_failed {
            return;
        }
        self.worker_failed = true;
        error!(%message, "background worker failed");
        let dialog = Dialog::new(&mut self.document, &self.dialogs);
        self.open_dialog(dialog, "Background worker stopped", message);
    }

    fn open_dialog(&mut self, mut dialog: Dialog, title: &str, content: String) {
        dialog
            .set_title(&mut self.document, title)
            .set_content(&mut self.document, content)
            .open(&mut self.document, &mut self.effects);
        self.open_dialogs.push(dialog);
    }

    fn route_keys(&mut self, ctx: &egui::Context) {
        let events: Vec<KeyEvent> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => KeyEvent::from_egui(*key, *modifiers),
                    _ => None,
                })
                .collect()
        });

        for mut event in events {
            self.route_key(&mut event);
        }
    }

    /// The top dialog sees the key first; the dashboard gets it only if the
    /// dialog lets it through.
    fn route_key(&mut self, event: &mut KeyEvent) {
        if let Some(top) = self.dialogs.top() {
            if let Some(dialog) = self.open_dialogs.iter_mut().find(|d| d.id() == top) {
                dialog.on_key(&mut self.document, &mut self.effects, event);
            }
        }
        if event.is_propagating() {
            self.dashboard
                .on_key(&mut self.document, &mut self.effects, event);
        }
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::SelectItem(index) => {
                self.dashboard.select(&mut self.document, index);
            }
            Command::DialogButton { dialog, button } => {
                let Some(target) = self.open_dialogs.iter_mut().find(|d| d.id() == dialog) else {
                    return;
                };
                target.choose(&mut self.document, &mut self.effects, &button);
                if target.value() == Some(Value::String(RETRY_LABEL.into())) {
                    self.send(AppCommand::LoadDashboard);
                }
            }
        }
    }
}

impl App for IdePanelsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.consume_events();

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        let screen = ctx.screen_rect();
        self.effects.set_viewport(screen.width(), screen.height());
        self.effects.advance(&mut self.document, elapsed);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.weak("alt+` shows or hides the dashboard");
        });

        self.route_keys(ctx);
        for command in paint(ctx, &mut self.document) {
            self.dispatch(command);
        }
        self.open_dialogs.retain(Dialog::is_open);

        if self.effects.is_idle() {
            // Keep draining worker events while nothing moves.
            ctx.request_repaint_after(Duration::from_millis(250));
        } else {
            ctx.request_repaint();
        }
    }
}

impl Drop for IdePanelsApp {
    fn drop(&mut self) {
        let _ = self.command_tx.send(AppCommand::StopProbing);
    }
}

enum AppCommand {
    LoadDashboard,
    StartProbing { interval: Duration },
    StopProbing,
}

enum AppEvent {
    DashboardLoaded(Vec<DashboardItem>),
    DashboardFailed(String),
    Probe(Liveness),
    WorkerFailed(String),
}

fn spawn_background_worker(
    config: Arc<AppConfig>,
    command_rx: Receiver<AppCommand>,
    event_tx: Sender<AppEvent>,
) {
    thread::spawn(move || {
        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = event_tx.send(AppEvent::WorkerFailed(format!(
                    "Unable to start async runtime: {err}"
                )));
                return;
            }
        };
        let client = match build_client(&config) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                let _ = event_tx.send(AppEvent::WorkerFailed(format!("{err:#}")));
                return;
            }
        };
        let mut prober: Option<PollingHandle> = None;

        while let Ok(command) = command_rx.recv() {
            match command {
                AppCommand::LoadDashboard => {
                    let result = runtime.block_on(load_items(client.as_ref(), &config.item_list_path));
                    match result {
                        Ok(items) => {
                            let _ = event_tx.send(AppEvent::DashboardLoaded(items));
                        }
                        Err(err) => {
                            error!(
                                path = %config.item_list_path,
                                status = ?err.status(),
                                error = %err,
                                "failed to load dashboard item list"
                            );
                            let _ = event_tx.send(AppEvent::DashboardFailed(err.to_string()));
                        }
                    }
                }
                AppCommand::StartProbing { interval } => {
                    if let Some(handle) = prober.take() {
                        handle.stop();
                    }
                    let events = event_tx.clone();
                    prober = Some(liveness::spawn_prober(
                        runtime.handle(),
                        client.clone(),
                        config.ping_path.clone(),
                        interval,
                        move |liveness| {
                            let _ = events.send(AppEvent::Probe(liveness));
                        },
                    ));
                }
                AppCommand::StopProbing => {
                    if let Some(handle) = prober.take() {
                        handle.stop();
                    }
                }
            }
        }
    });
}
