//! IPC listener thread: turns client requests into event-loop events

use anyhow::{Context, Result};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{read_message, write_message, ClockClient, ClockRequest, ClockResponse, ClockServer, ReplyChannel};
use crate::app::AppEvent;
use crate::capture::CaptureTarget;
use crate::constants::operation;

/// Spawn IPC listener thread; each connection gets its own thread so a client
/// waiting on a capture does not block others
pub fn spawn_ipc_listener(
    server: ClockServer,
    events: mpsc::Sender<AppEvent>,
    reply_timeout: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, &events, reply_timeout) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(server: &ClockServer, events: &mpsc::Sender<AppEvent>, reply_timeout: Duration) -> Result<()> {
    info!(socket = ?server.path(), "IPC listener started");

    loop {
        let client = server.accept().context("Failed to accept IPC connection")?;
        let events = events.clone();
        thread::spawn(move || serve_client(client, events, reply_timeout));
    }
}

fn serve_client(mut client: ClockClient, events: mpsc::Sender<AppEvent>, reply_timeout: Duration) {
    debug!("Client connected");
    loop {
        let request: ClockRequest = match read_message(&mut client.stream) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = ?e, "IPC connection closed or error");
                break;
            }
        };

        let shutdown = request == ClockRequest::Shutdown;
        let response = handle_request(request, &events, reply_timeout);
        if let Err(e) = write_message(&mut client.stream, &response) {
            warn!(error = ?e, "Failed to send IPC response");
            break;
        }
        if shutdown {
            break;
        }
    }
    debug!("Client disconnected");
}

/// Forward one request to the event loop and produce its response
pub(crate) fn handle_request(
    request: ClockRequest,
    events: &mpsc::Sender<AppEvent>,
    reply_timeout: Duration,
) -> ClockResponse {
    let event = match request {
        ClockRequest::Ping => return ClockResponse::Pong,

        ClockRequest::Shutdown => {
            info!("Received shutdown request via IPC");
            AppEvent::Shutdown
        }

        ClockRequest::DisplayState(state) => AppEvent::DisplayStateChanged(state),

        ClockRequest::AppControl { operation: op, extra } => match op.as_str() {
            operation::CAPTURE => {
                let target = match extra.get(operation::EXTRA_TARGET) {
                    Some(value) => match CaptureTarget::parse(value) {
                        Some(target) => Some(target),
                        None => return ClockResponse::Error(format!("Unknown capture target '{value}'")),
                    },
                    None => None,
                };
                return request_capture(target, events, reply_timeout);
            }
            operation::MAIN => AppEvent::MainRequested,
            operation::REMOTE_SETTINGS => match extra.get(operation::EXTRA_RESULT_XML) {
                Some(xml) => AppEvent::SettingsResult(xml.clone()),
                None => {
                    return ClockResponse::Error(format!(
                        "Missing extra '{}' for remote settings",
                        operation::EXTRA_RESULT_XML
                    ));
                }
            },
            other => {
                warn!(operation = other, "Unsupported app-control operation");
                return ClockResponse::Error(format!("Unsupported operation '{other}'"));
            }
        },
    };

    match events.send(event) {
        Ok(()) => ClockResponse::Ready,
        Err(_) => ClockResponse::Error("Clock daemon is shutting down".to_string()),
    }
}

fn request_capture(
    target: Option<CaptureTarget>,
    events: &mpsc::Sender<AppEvent>,
    reply_timeout: Duration,
) -> ClockResponse {
    let (reply, rx) = ReplyChannel::new();
    if events.send(AppEvent::CaptureRequested { target, reply }).is_err() {
        return ClockResponse::Error("Clock daemon is shutting down".to_string());
    }

    match rx.recv_timeout(reply_timeout) {
        Ok(response) => response,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = reply_timeout.as_millis() as u64, "Capture reply timed out");
            ClockResponse::Error("Capture timed out".to_string())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => ClockResponse::Error("Capture failed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn app_control(op: &str, extra: &[(&str, &str)]) -> ClockRequest {
        ClockRequest::AppControl {
            operation: op.to_string(),
            extra: extra.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_main_and_display_are_forwarded() {
        let (tx, rx) = mpsc::channel();
        assert_eq!(handle_request(app_control(operation::MAIN, &[]), &tx, TIMEOUT), ClockResponse::Ready);
        assert!(matches!(rx.try_recv().unwrap(), AppEvent::MainRequested));

        let resp = handle_request(
            ClockRequest::DisplayState(crate::platform::DisplayState::ScreenOff),
            &tx,
            TIMEOUT,
        );
        assert_eq!(resp, ClockResponse::Ready);
        assert!(matches!(
            rx.try_recv().unwrap(),
            AppEvent::DisplayStateChanged(crate::platform::DisplayState::ScreenOff)
        ));
    }

    #[test]
    fn test_settings_without_xml_is_rejected() {
        let (tx, rx) = mpsc::channel();
        let resp = handle_request(app_control(operation::REMOTE_SETTINGS, &[]), &tx, TIMEOUT);
        assert!(matches!(resp, ClockResponse::Error(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_capture_waits_for_reply() {
        let (tx, rx) = mpsc::channel();
        let loop_side = thread::spawn(move || match rx.recv().unwrap() {
            AppEvent::CaptureRequested { target, reply } => {
                assert_eq!(target, Some(CaptureTarget::Minicontrol));
                reply
                    .send(ClockResponse::Reply {
                        result: Some("/tmp/x.png".to_string()),
                        extra: HashMap::new(),
                    })
                    .unwrap();
            }
            other => panic!("unexpected event {other:?}"),
        });

        let resp = handle_request(
            app_control(operation::CAPTURE, &[(operation::EXTRA_TARGET, "minicontrol")]),
            &tx,
            TIMEOUT,
        );
        loop_side.join().unwrap();
        assert!(matches!(resp, ClockResponse::Reply { result: Some(ref p), .. } if p == "/tmp/x.png"));
    }

    #[test]
    fn test_dropped_capture_reports_failure() {
        let (tx, rx) = mpsc::channel();
        let loop_side = thread::spawn(move || drop(rx.recv().unwrap()));

        let resp = handle_request(app_control(operation::CAPTURE, &[]), &tx, TIMEOUT);
        loop_side.join().unwrap();
        assert_eq!(resp, ClockResponse::Error("Capture failed".to_string()));
    }

    #[test]
    fn test_unknown_operation_and_target() {
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            handle_request(app_control("op/unknown", &[]), &tx, TIMEOUT),
            ClockResponse::Error(_)
        ));
        assert!(matches!(
            handle_request(app_control(operation::CAPTURE, &[(operation::EXTRA_TARGET, "tv")]), &tx, TIMEOUT),
            ClockResponse::Error(_)
        ));
    }
}
