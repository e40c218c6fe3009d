//! Browser front end: serves the canvas UI, streams frames over SSE and
//! turns key presses posted by the page into controller commands.

mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    controller::{Controller, StepOutcome},
    frame::Frame,
    scenario::Scenario,
};

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
}

struct AppState {
    controller: Mutex<Controller>,
    latest_frame: Mutex<Frame>,
    broadcaster: broadcast::Sender<String>,
    scenario_name: String,
}

impl AppState {
    fn new(controller: Controller, scenario_name: String) -> Self {
        let (broadcaster, _) = broadcast::channel::<String>(64);
        Self {
            latest_frame: Mutex::new(controller.frame()),
            controller: Mutex::new(controller),
            broadcaster,
            scenario_name,
        }
    }

    /// Stores and broadcasts `frame` unless a newer one is already out.
    /// Callers hold the controller lock, so frames leave in controller
    /// order; the version check keeps `latest_frame` monotonic regardless.
    fn publish(&self, frame: &Frame) -> bool {
        let mut latest = self.latest_frame.lock().expect("frame lock poisoned");
        if frame.version < latest.version {
            debug!(
                stale = frame.version,
                latest = latest.version,
                "dropping stale frame"
            );
            return false;
        }
        match serde_json::to_string(frame) {
            Ok(payload) => {
                // No subscribers is fine; the page polls /api/state on load.
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!("failed to encode frame: {err}"),
        }
        *latest = frame.clone();
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Restart,
    Faster,
    Slower,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "pause" => Some(Self::Pause),
            "restart" => Some(Self::Restart),
            "faster" => Some(Self::Faster),
            "slower" => Some(Self::Slower),
            _ => None,
        }
    }

    fn apply(self, controller: &mut Controller) {
        match self {
            Self::Pause => controller.toggle_pause(),
            Self::Restart => controller.restart(),
            Self::Faster => controller.set_speed(1),
            Self::Slower => controller.set_speed(-1),
        }
    }
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        host,
        port,
    } = config;

    let controller = Controller::new(scenario.controller_settings());
    let state = Arc::new(AppState::new(controller, scenario.name.clone()));

    tokio::spawn(drive(state.clone()));

    let router = Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/control/:command", post(control))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        scenario = %scenario.name,
        "UI live at http://{addr} (Space pause, R restart, arrows speed, Ctrl+C to stop)"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Steps the game at `speed` rounds per second. The controller lock is held
/// for one round and its publication, so commands and reads never observe
/// a half-played round and frames go out in the order they were taken.
async fn drive(state: Arc<AppState>) {
    loop {
        let delay = {
            let mut controller = state.controller.lock().expect("controller lock poisoned");
            match controller.step() {
                StepOutcome::Paused => {}
                StepOutcome::Advanced { .. } | StepOutcome::Converged { .. } => {
                    state.publish(&controller.frame());
                }
            }
            Duration::from_secs_f64(1.0 / f64::from(controller.speed()))
        };
        tokio::time::sleep(delay).await;
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web UI");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<Frame> {
    let frame = state.latest_frame.lock().expect("frame lock poisoned").clone();
    Json(frame)
}

async fn control(State(state): State<Arc<AppState>>, Path(command): Path<String>) -> Response {
    let Some(command) = Command::parse(&command) else {
        return (StatusCode::NOT_FOUND, format!("unknown command '{command}'")).into_response();
    };
    let frame = {
        let mut controller = state.controller.lock().expect("controller lock poisoned");
        command.apply(&mut controller);
        let frame = controller.frame();
        state.publish(&frame);
        frame
    };
    debug!(scenario = %state.scenario_name, ?command, "command applied");
    Json(frame).into_response()
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(err) => {
            warn!("dropping frames for slow subscriber: {err}");
            None
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerSettings;

    #[test]
    fn commands_parse_by_name() {
        assert_eq!(Command::parse("pause"), Some(Command::Pause));
        assert_eq!(Command::parse("restart"), Some(Command::Restart));
        assert_eq!(Command::parse("faster"), Some(Command::Faster));
        assert_eq!(Command::parse("slower"), Some(Command::Slower));
        assert_eq!(Command::parse("explode"), None);
    }

    #[test]
    fn commands_drive_the_controller() {
        let mut controller = Controller::new(ControllerSettings {
            height: 6,
            width: 6,
            ..ControllerSettings::default()
        });

        Command::Pause.apply(&mut controller);
        assert!(!controller.is_paused());
        Command::Faster.apply(&mut controller);
        assert_eq!(controller.speed(), 6);
        Command::Slower.apply(&mut controller);
        Command::Slower.apply(&mut controller);
        assert_eq!(controller.speed(), 4);
        Command::Restart.apply(&mut controller);
        assert!(controller.is_paused());
        assert_eq!(controller.restarts(), 1);
    }

    #[test]
    fn stale_frames_never_replace_newer_ones() {
        let mut controller = Controller::new(ControllerSettings {
            height: 6,
            width: 6,
            ..ControllerSettings::default()
        });
        controller.toggle_pause();
        controller.step();
        let stepped = controller.frame();
        controller.toggle_pause();
        let paused = controller.frame();
        assert!(!stepped.paused);
        assert!(paused.paused);

        let state = AppState::new(controller, "test".into());
        let mut rx = state.broadcaster.subscribe();

        assert!(state.publish(&paused));
        assert!(!state.publish(&stepped));

        let latest = state.latest_frame.lock().expect("frame lock poisoned").clone();
        assert_eq!(latest.version, paused.version);
        assert!(latest.paused);

        let sent: serde_json::Value =
            serde_json::from_str(&rx.try_recv().expect("paused frame broadcast"))
                .expect("frame json");
        assert_eq!(sent["paused"], true);
        assert!(rx.try_recv().is_err(), "stale frame was broadcast");
    }
}
