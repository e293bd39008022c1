//! Capture/snapshot coordination
//!
//! A capture request owns a drawing surface until the dump is written and the reply
//! sent. The event loop drives the transitions; this type holds the state and the
//! surface and does the flush.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::constants::{face, operation, package, paths};
use crate::ipc::{ClockResponse, ReplyChannel};
use crate::surface::{Canvas, ClockLayout, FontRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// Memory buffer of watchface size
    Offscreen,
    /// Companion surface, wider than the face
    Minicontrol,
    /// Live window; no dump is produced
    Window,
}

impl CaptureTarget {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "offscreen" => Some(Self::Offscreen),
            "minicontrol" => Some(Self::Minicontrol),
            "window" => Some(Self::Window),
            _ => None,
        }
    }

    /// Target chosen when the request names none
    pub fn default_for(window_exists: bool) -> Self {
        if window_exists { Self::Minicontrol } else { Self::Offscreen }
    }

    /// Dump file for this target under `dump_dir`
    pub fn dump_path(self, dump_dir: &Path) -> Option<PathBuf> {
        let suffix = match self {
            Self::Offscreen => paths::DUMP_SUFFIX_OFFSCREEN,
            Self::Minicontrol => paths::DUMP_SUFFIX_MINICONTROL,
            Self::Window => return None,
        };
        Some(dump_dir.join(format!("{}{}", package::NAME, suffix)))
    }

    fn surface_size(self, window_width: u32, window_height: u32) -> (u32, u32) {
        match self {
            Self::Minicontrol => (face::MINICONTROL_WIDTH, window_height),
            _ => (window_width, window_height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Requested,
    Rendering,
    Flushed,
    WindowFallback,
}

#[derive(Debug)]
pub struct CaptureRequest {
    pub target: CaptureTarget,
    pub reply: ReplyChannel,
    pub output_path: Option<PathBuf>,
}

/// Reported when a capture finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureCompletion {
    pub target: CaptureTarget,
    /// A main request arrived while the capture was in flight
    pub window_requested: bool,
}

#[derive(Debug)]
pub struct CaptureCoordinator {
    phase: CapturePhase,
    request: Option<CaptureRequest>,
    canvas: Option<Canvas>,
    window_requested: bool,
    dump_dir: PathBuf,
    window_width: u32,
    window_height: u32,
}

impl CaptureCoordinator {
    pub fn new(dump_dir: PathBuf, window_width: u32, window_height: u32) -> Self {
        Self {
            phase: CapturePhase::Idle,
            request: None,
            canvas: None,
            window_requested: false,
            dump_dir,
            window_width,
            window_height,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.request.is_some()
    }

    pub fn target(&self) -> Option<CaptureTarget> {
        self.request.as_ref().map(|r| r.target)
    }

    pub fn has_surface(&self) -> bool {
        self.canvas.is_some()
    }

    /// Accept a request and create its drawing surface
    ///
    /// A request arriving while another is in flight replaces it; the earlier
    /// client gets no reply. A window request recorded for the earlier capture
    /// moves to the new one. Surface failure drops the request unanswered and
    /// leaves any window request for `take_window_request`.
    pub fn begin(&mut self, mut request: CaptureRequest) -> Result<()> {
        if let Some(previous) = self.request.take() {
            warn!(
                target = ?previous.target,
                window_requested = self.window_requested,
                "Capture superseded by a new request"
            );
        } else {
            self.window_requested = false;
        }
        self.canvas = None;
        self.phase = CapturePhase::Requested;

        if request.target == CaptureTarget::Window {
            info!("Capture requested for the live window");
            self.phase = CapturePhase::WindowFallback;
            self.request = Some(request);
            return Ok(());
        }

        let (width, height) = request.target.surface_size(self.window_width, self.window_height);
        let canvas = match Canvas::new(width, height) {
            Ok(canvas) => canvas,
            Err(e) => {
                self.phase = CapturePhase::Idle;
                return Err(e).context("Failed to create capture surface");
            }
        };

        if request.output_path.is_none() {
            request.output_path = request.target.dump_path(&self.dump_dir);
        }
        info!(target = ?request.target, width = width, height = height, "Capture surface created");

        self.canvas = Some(canvas);
        self.request = Some(request);
        Ok(())
    }

    /// The face has been rendered; waiting for the show transition or an idle slot
    pub fn mark_rendering(&mut self) {
        if self.phase == CapturePhase::Requested {
            self.phase = CapturePhase::Rendering;
        }
    }

    /// Rasterise `layout` into the surface and write the dump file
    pub fn flush(&mut self, layout: &ClockLayout, font: Option<&FontRenderer>) -> Result<PathBuf> {
        let path = self
            .request
            .as_ref()
            .and_then(|r| r.output_path.clone())
            .context("No capture in flight")?;
        let canvas = self.canvas.as_mut().context("Capture surface already released")?;

        canvas.draw_layout(layout, font);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dump directory: {}", parent.display()))?;
        }
        canvas.write_png(&path)?;

        self.phase = CapturePhase::Flushed;
        info!(path = %path.display(), "Capture flushed");
        Ok(path)
    }

    /// Reply to the requester and return to idle
    /// `result` is the dump path; `None` replies without one
    pub fn finish(&mut self, result: Option<&Path>) -> Option<CaptureCompletion> {
        let request = self.request.take()?;
        self.canvas = None;
        self.phase = CapturePhase::Idle;

        let mut extra = HashMap::new();
        let result = result.map(|p| p.display().to_string());
        if let Some(path) = &result {
            extra.insert(operation::EXTRA_RESULT.to_string(), path.clone());
        }
        if let Err(e) = request.reply.send(ClockResponse::Reply { result, extra }) {
            error!(error = %e, "Failed to reply to capture request");
        }

        let completion = CaptureCompletion {
            target: request.target,
            window_requested: std::mem::take(&mut self.window_requested),
        };
        debug!(completion = ?completion, "Capture finished");
        Some(completion)
    }

    /// Drop the request without replying (flush failure)
    pub fn abort(&mut self) -> Option<CaptureCompletion> {
        let request = self.request.take()?;
        self.canvas = None;
        self.phase = CapturePhase::Idle;
        warn!(target = ?request.target, "Capture aborted without reply");
        Some(CaptureCompletion {
            target: request.target,
            window_requested: std::mem::take(&mut self.window_requested),
        })
    }

    /// Record a window request; true if it must wait for the capture to complete
    pub fn request_window(&mut self) -> bool {
        if self.in_flight() {
            self.window_requested = true;
            true
        } else {
            false
        }
    }

    /// Window request left behind by a capture that never started
    pub fn take_window_request(&mut self) -> bool {
        !self.in_flight() && std::mem::take(&mut self.window_requested)
    }

    /// Release the preview surface ahead of the window transition
    pub fn release_surface(&mut self) {
        if self.canvas.take().is_some() {
            debug!("Capture surface released");
        }
    }
}
