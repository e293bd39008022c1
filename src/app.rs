//! Application state and event dispatch
//!
//! `App` is owned by the event-loop thread. Every input (platform notification,
//! launch request, timer, idle slot) arrives as an `AppEvent` and goes through
//! `App::handle`.

use chrono::Timelike;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureCompletion, CapturePhase, CaptureRequest, CaptureTarget, CaptureCoordinator};
use crate::config::PreferenceStore;
use crate::constants::timing;
use crate::event_loop::{IdleQueue, IdleTask, TimerId, TimerKind, TimerQueue, WallClock};
use crate::ipc::ReplyChannel;
use crate::locale::{FormatterManager, LocaleContext, LocaleService};
use crate::platform::{DisplayState, Platform};
use crate::render::{render, RenderedFace};
use crate::scheduler::{TickAction, TickScheduler};
use crate::settings::{apply_settings_result, ClockSettings};
use crate::surface::{ClockLayout, FontRenderer};

#[derive(Debug)]
pub enum AppEvent {
    /// Wall clock was set
    TimeChanged,
    TimezoneChanged,
    /// Language changed; handled after a settle delay
    LocaleChanged,
    /// 24-hour preference changed
    TimeFormatChanged,
    DisplayStateChanged(DisplayState),
    CaptureRequested {
        /// `None` picks the default for the current window state
        target: Option<CaptureTarget>,
        reply: ReplyChannel,
    },
    MainRequested,
    /// Settings-result XML from the remote settings request
    SettingsResult(String),
    Timer(TimerId, TimerKind),
    Idle(IdleTask),
    Shutdown,
}

/// Host settings that shape the app
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub dump_dir: std::path::PathBuf,
    pub window_width: u32,
    pub window_height: u32,
    pub exit_after_offscreen_capture: bool,
}

pub struct App {
    platform: Box<dyn Platform>,
    preferences: Box<dyn PreferenceStore>,
    clock: Box<dyn WallClock>,
    font: Option<FontRenderer>,

    settings: ClockSettings,
    formatters: FormatterManager,
    scheduler: TickScheduler,
    capture: CaptureCoordinator,
    face: ClockLayout,

    window: bool,
    display: DisplayState,

    timers: TimerQueue,
    idle: IdleQueue,
    drawing_timer: Option<TimerId>,
    settle_timer: Option<TimerId>,
    close_timer: Option<TimerId>,

    exit_after_offscreen_capture: bool,
    exit_requested: bool,
}

impl App {
    pub fn new(
        platform: Box<dyn Platform>,
        preferences: Box<dyn PreferenceStore>,
        service: Box<dyn LocaleService>,
        clock: Box<dyn WallClock>,
        font: Option<FontRenderer>,
        options: AppOptions,
    ) -> Self {
        Self {
            platform,
            preferences,
            clock,
            font,
            settings: ClockSettings::default(),
            formatters: FormatterManager::new(service),
            scheduler: TickScheduler::new(),
            capture: CaptureCoordinator::new(options.dump_dir, options.window_width, options.window_height),
            face: ClockLayout::default(),
            window: false,
            display: DisplayState::Normal,
            timers: TimerQueue::new(),
            idle: IdleQueue::default(),
            drawing_timer: None,
            settle_timer: None,
            close_timer: None,
            exit_after_offscreen_capture: options.exit_after_offscreen_capture,
            exit_requested: false,
        }
    }

    /// Build formatters, load stored settings, style and render once, then arm the first tick
    pub fn start(&mut self, now: Instant) {
        let ctx = LocaleContext::resolve(&self.platform.snapshot());
        info!(locale = %ctx.locale_id, timezone = %ctx.timezone_id, is_24_hour = ctx.is_24_hour, "Starting clock");
        self.formatters.rebuild(ctx);
        self.settings.reload(self.preferences.as_ref());
        self.settings.for_render(self.preferences.as_ref()).apply_style(&mut self.face);
        self.render_face();
        let second = self.clock.now().second();
        self.scheduler.start(&mut self.timers, second, now);
    }

    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn has_idle_work(&self) -> bool {
        !self.idle.is_empty()
    }

    /// Timers due at `now`, as events
    pub fn due_timers(&mut self, now: Instant) -> Vec<AppEvent> {
        self.timers
            .pop_expired(now)
            .into_iter()
            .map(|(id, kind)| AppEvent::Timer(id, kind))
            .collect()
    }

    pub fn next_idle(&mut self) -> Option<AppEvent> {
        self.idle.pop().map(AppEvent::Idle)
    }

    pub fn handle(&mut self, event: AppEvent, now: Instant) {
        debug!(event = ?event, "Handling event");
        match event {
            AppEvent::TimeChanged | AppEvent::TimezoneChanged | AppEvent::TimeFormatChanged => {
                self.refresh_locale(now);
            }
            AppEvent::LocaleChanged => {
                // Arm (or restart) the settle delay
                if let Some(id) = self.settle_timer.take() {
                    self.timers.cancel(id);
                }
                self.settle_timer = Some(self.timers.add(TimerKind::Settle, timing::LANGUAGE_SETTLE_DELAY, now));
            }
            AppEvent::DisplayStateChanged(state) => self.on_display_state(state, now),
            AppEvent::CaptureRequested { target, reply } => self.on_capture(target, reply, now),
            AppEvent::MainRequested => self.on_main(),
            AppEvent::SettingsResult(xml) => self.on_settings_result(&xml, now),
            AppEvent::Timer(id, kind) => self.on_timer(id, kind, now),
            AppEvent::Idle(IdleTask::FlushCapture) => self.flush_capture(),
            AppEvent::Shutdown => {
                info!("Shutdown requested");
                self.exit_requested = true;
            }
        }
    }

    /// Release timers, formatters and any in-flight capture
    pub fn teardown(&mut self) {
        self.scheduler.stop(&mut self.timers);
        for id in [self.drawing_timer.take(), self.settle_timer.take(), self.close_timer.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(id);
        }
        self.idle.clear();
        if self.capture.abort().is_some() {
            warn!("Capture in flight at shutdown");
        }
        self.formatters.teardown();
        info!("Clock torn down");
    }

    fn render_face(&mut self) -> RenderedFace {
        let settings = self.settings.for_render(self.preferences.as_ref());
        let set = self.formatters.current();
        let is_24_hour = self.formatters.context().is_24_hour;
        render(&settings, set.as_deref(), is_24_hour, self.clock.now(), &mut self.face)
    }

    fn rearm_tick(&mut self, now: Instant) {
        let second = self.clock.now().second();
        self.scheduler.rearm(&mut self.timers, second, now);
    }

    /// Rebuild formatters from fresh platform values, then redraw and realign the tick
    fn refresh_locale(&mut self, now: Instant) {
        if let Some(id) = self.scheduler.pending() {
            self.timers.cancel(id);
        }
        let ctx = LocaleContext::resolve(&self.platform.snapshot());
        if ctx != *self.formatters.context() {
            info!(locale = %ctx.locale_id, timezone = %ctx.timezone_id, is_24_hour = ctx.is_24_hour, "Locale context changed");
        }
        self.formatters.rebuild(ctx);
        self.rearm_tick(now);
        self.render_face();
    }

    fn on_display_state(&mut self, state: DisplayState, now: Instant) {
        info!(state = ?state, "Display state changed");
        self.display = state;
        match state {
            DisplayState::Normal => {
                if !self.face.is_shown() {
                    self.render_face();
                    self.face.show();
                }
                self.scheduler.display_on(&mut self.timers, self.clock.now().second(), now);
            }
            DisplayState::ScreenOff => self.scheduler.display_off(),
            DisplayState::Dim => {}
        }
    }

    fn cancel_close_timer(&mut self) {
        if let Some(id) = self.close_timer.take() {
            debug!("Auto-close canceled");
            self.timers.cancel(id);
        }
    }

    fn on_capture(&mut self, target: Option<CaptureTarget>, reply: ReplyChannel, now: Instant) {
        self.cancel_close_timer();
        if let Some(id) = self.drawing_timer.take() {
            self.timers.cancel(id);
        }
        self.idle.clear();

        let target = target.unwrap_or_else(|| CaptureTarget::default_for(self.window));
        info!(target = ?target, "Capture requested");

        let request = CaptureRequest {
            target,
            reply,
            output_path: None,
        };
        if let Err(e) = self.capture.begin(request) {
            error!(error = ?e, "Capture aborted");
            if self.capture.take_window_request() {
                self.open_window();
            }
            return;
        }

        if self.capture.phase() == CapturePhase::WindowFallback {
            self.open_window();
            let completion = self.capture.finish(None);
            self.after_capture(completion);
            return;
        }

        self.render_face();
        self.capture.mark_rendering();

        if !self.display.is_on() || !self.face.is_shown() {
            self.face.show();
            self.drawing_timer = Some(self.timers.add(TimerKind::Drawing, timing::DRAWING_DELAY, now));
        } else {
            self.idle.push(IdleTask::FlushCapture);
        }
    }

    fn flush_capture(&mut self) {
        if !self.capture.in_flight() {
            debug!("No capture to flush");
            return;
        }

        let completion = match self.capture.flush(&self.face, self.font.as_ref()) {
            Ok(path) => self.capture.finish(Some(&path)),
            Err(e) => {
                error!(error = ?e, "Capture flush failed");
                self.capture.abort()
            }
        };

        if !self.display.is_on() {
            self.face.hide();
        }
        self.after_capture(completion);
    }

    fn after_capture(&mut self, completion: Option<CaptureCompletion>) {
        let Some(completion) = completion else {
            return;
        };

        if completion.window_requested {
            self.open_window();
        } else if completion.target == CaptureTarget::Offscreen
            && !self.window
            && self.exit_after_offscreen_capture
        {
            info!("Off-screen capture delivered, exiting");
            self.exit_requested = true;
        }
    }

    fn on_main(&mut self) {
        self.cancel_close_timer();
        if self.capture.request_window() {
            info!("Window requested during capture, opening after it completes");
            return;
        }
        self.open_window();
    }

    fn open_window(&mut self) {
        self.capture.release_surface();
        if !self.window {
            info!("Opening clock window");
        }
        self.window = true;
        self.render_face();
        self.face.show();
    }

    fn on_settings_result(&mut self, xml: &str, now: Instant) {
        match apply_settings_result(xml, &mut self.settings) {
            Ok(count) => info!(items = count, "Settings result applied"),
            Err(e) => error!(error = %e, "Settings result rejected"),
        }

        self.settings.persist_missing(self.preferences.as_mut());
        let effective = self.settings.for_render(self.preferences.as_ref());
        effective.apply_style(&mut self.face);
        self.render_face();

        if self.window {
            self.on_display_state(DisplayState::Normal, now);
        } else {
            self.cancel_close_timer();
            info!(delay_secs = timing::AUTO_CLOSE_DELAY.as_secs(), "No window, closing after settings update");
            self.close_timer = Some(self.timers.add(TimerKind::AutoClose, timing::AUTO_CLOSE_DELAY, now));
        }
    }

    fn on_timer(&mut self, id: TimerId, kind: TimerKind, now: Instant) {
        match kind {
            TimerKind::Tick => {
                let second = self.clock.now().second();
                match self.scheduler.on_fire(&mut self.timers, id, second, now) {
                    TickAction::Render => {
                        self.render_face();
                    }
                    TickAction::SkipRender => debug!("Display off, tick re-armed without render"),
                    TickAction::Stale => {}
                }
            }
            TimerKind::Drawing if self.drawing_timer == Some(id) => {
                self.drawing_timer = None;
                if self.face.is_shown() {
                    self.flush_capture();
                } else {
                    self.face.show();
                    self.idle.push(IdleTask::FlushCapture);
                }
            }
            TimerKind::Settle if self.settle_timer == Some(id) => {
                self.settle_timer = None;
                self.refresh_locale(now);
            }
            TimerKind::AutoClose if self.close_timer == Some(id) => {
                self.close_timer = None;
                info!("Auto-close timer fired");
                self.exit_requested = true;
            }
            _ => debug!(?id, ?kind, "Ignoring stale timer"),
        }
    }

    pub fn face(&self) -> &ClockLayout {
        &self.face
    }

    pub fn window_exists(&self) -> bool {
        self.window
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn capture(&self) -> &CaptureCoordinator {
        &self.capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preferences::MemoryPreferences;
    use crate::event_loop::FixedClock;
    use crate::ipc::ClockResponse;
    use crate::locale::ChronoLocaleService;
    use crate::platform::PlatformSnapshot;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;
    use std::sync::mpsc::Receiver;
    use std::time::Duration;

    #[derive(Clone)]
    struct TestPlatform(Rc<RefCell<PlatformSnapshot>>);

    impl Platform for TestPlatform {
        fn snapshot(&self) -> PlatformSnapshot {
            self.0.borrow().clone()
        }
    }

    struct Harness {
        app: App,
        platform: TestPlatform,
        clock: FixedClock,
        now: Instant,
        _dump: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_preferences(MemoryPreferences::default())
        }

        fn with_preferences(prefs: MemoryPreferences) -> Self {
            let dump = tempfile::tempdir().unwrap();
            let platform = TestPlatform(Rc::new(RefCell::new(PlatformSnapshot {
                locale: Some("en_US.UTF-8".to_string()),
                timezone: Some("UTC".to_string()),
                time_24h: Some(false),
            })));
            let clock = FixedClock::at(Utc.with_ymd_and_hms(2026, 10, 19, 9, 5, 0).unwrap());
            let app = App::new(
                Box::new(platform.clone()),
                Box::new(prefs),
                Box::new(ChronoLocaleService),
                Box::new(clock.clone()),
                None,
                AppOptions {
                    dump_dir: dump.path().to_path_buf(),
                    window_width: 320,
                    window_height: 320,
                    exit_after_offscreen_capture: true,
                },
            );
            let mut harness = Self {
                app,
                platform,
                clock,
                now: Instant::now(),
                _dump: dump,
            };
            harness.app.start(harness.now);
            harness
        }

        fn dump_dir(&self) -> &Path {
            self._dump.path()
        }

        fn send(&mut self, event: AppEvent) {
            self.app.handle(event, self.now);
        }

        fn pending(&self, kind: TimerKind) -> Vec<(TimerId, Duration)> {
            self.app.timers().pending(kind)
        }

        fn fire(&mut self, kind: TimerKind) {
            let (id, _) = self.pending(kind)[0];
            self.send(AppEvent::Timer(id, kind));
        }

        fn run_idle(&mut self) {
            while let Some(event) = self.app.next_idle() {
                self.app.handle(event, self.now);
            }
        }

        fn capture(&mut self, target: Option<CaptureTarget>) -> Receiver<ClockResponse> {
            let (reply, rx) = ReplyChannel::new();
            self.send(AppEvent::CaptureRequested { target, reply });
            rx
        }

        fn time_markup(&self) -> Option<String> {
            self.app.face().part_text("textblock_time").map(String::from)
        }
    }

    fn reply_path(rx: &Receiver<ClockResponse>) -> Option<String> {
        match rx.try_recv() {
            Ok(ClockResponse::Reply { result, .. }) => result,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn test_start_renders_and_arms_tick() {
        let h = Harness::new();
        let ticks = h.pending(TimerKind::Tick);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].1, Duration::from_secs(60));
        let markup = h.time_markup().unwrap();
        assert!(markup.starts_with("<color=#FFFFFFFF>9:05"), "{markup}");
        assert!(markup.contains(" AM</font>"));
        assert_eq!(h.app.face().part_text("default_text_date"), Some("Mon, Oct 19"));
    }

    #[test]
    fn test_start_applies_stored_hidden_date() {
        let mut prefs = MemoryPreferences::default();
        prefs.values.insert("showdate".into(), 0);
        prefs.values.insert("clock_font_color".into(), 3);
        let h = Harness::with_preferences(prefs);

        let signals = h.app.face().signals();
        assert!(signals.contains(&("hide,text_date".to_string(), "source_text_date".to_string())));
        assert!(signals.contains(&("change,no_data".to_string(), "source_textblock_time".to_string())));
        assert!(!h.app.face().date_visible());
        assert!(h.app.face().part_text("default_text_date").is_none());
        assert!(h.time_markup().unwrap().starts_with("<color=#FF6519FF>"));
    }

    #[test]
    fn test_start_styles_default_date() {
        let h = Harness::new();
        let signals = h.app.face().signals();
        assert_eq!(
            signals.first(),
            Some(&("show,default_text_date_8".to_string(), "source_default_text_date".to_string()))
        );
        assert!(h.app.face().date_visible());
    }

    #[test]
    fn test_tick_rerenders_and_rearms() {
        let mut h = Harness::new();
        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 9, 6, 0).unwrap());
        h.fire(TimerKind::Tick);

        assert!(h.time_markup().unwrap().contains("9:06"));
        assert_eq!(h.pending(TimerKind::Tick).len(), 1);
    }

    #[test]
    fn test_display_off_suspends_rendering() {
        let mut h = Harness::new();
        h.send(AppEvent::DisplayStateChanged(DisplayState::Normal));
        assert!(h.app.face().is_shown());

        h.send(AppEvent::DisplayStateChanged(DisplayState::ScreenOff));
        assert_eq!(h.pending(TimerKind::Tick).len(), 1);

        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 9, 6, 0).unwrap());
        h.fire(TimerKind::Tick);
        assert!(h.time_markup().unwrap().contains("9:05"));
        assert_eq!(h.pending(TimerKind::Tick).len(), 1);

        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 9, 6, 30).unwrap());
        h.send(AppEvent::DisplayStateChanged(DisplayState::Normal));
        let ticks = h.pending(TimerKind::Tick);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].1, Duration::from_secs(30));
    }

    #[test]
    fn test_display_on_renders_hidden_clock() {
        let mut h = Harness::new();
        assert!(!h.app.face().is_shown());
        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 10, 15, 0).unwrap());
        h.send(AppEvent::DisplayStateChanged(DisplayState::Normal));
        assert!(h.app.face().is_shown());
        assert!(h.time_markup().unwrap().contains("10:15"));
    }

    #[test]
    fn test_language_change_waits_for_settle() {
        let mut h = Harness::new();
        h.platform.0.borrow_mut().locale = Some("de_DE.UTF-8".to_string());

        h.send(AppEvent::LocaleChanged);
        h.send(AppEvent::LocaleChanged);
        let settle = h.pending(TimerKind::Settle);
        assert_eq!(settle.len(), 1);
        assert_eq!(settle[0].1, Duration::from_secs(1));
        assert_eq!(h.app.face().part_text("default_text_date"), Some("Mon, Oct 19"));

        h.fire(TimerKind::Settle);
        assert_eq!(h.app.face().part_text("default_text_date"), Some("Mo, 19. Okt"));
        assert_eq!(h.pending(TimerKind::Tick).len(), 1);
    }

    #[test]
    fn test_time_format_change_switches_to_24_hour() {
        let mut h = Harness::new();
        h.platform.0.borrow_mut().time_24h = Some(true);
        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 21, 30, 0).unwrap());
        h.send(AppEvent::TimeFormatChanged);
        assert_eq!(h.time_markup().as_deref(), Some("<color=#FFFFFFFF>21:30</color>"));
        assert_eq!(h.pending(TimerKind::Tick).len(), 1);
    }

    #[test]
    fn test_timezone_change_rebuilds() {
        let mut h = Harness::new();
        h.platform.0.borrow_mut().timezone = Some("Asia/Seoul".to_string());
        h.send(AppEvent::TimezoneChanged);
        assert!(h.time_markup().unwrap().contains("6:05"));
        assert!(h.time_markup().unwrap().contains(" PM"));
    }

    #[test]
    fn test_minicontrol_capture_with_hidden_clock() {
        let mut h = Harness::new();
        h.send(AppEvent::MainRequested);
        assert!(h.app.window_exists());
        h.send(AppEvent::DisplayStateChanged(DisplayState::ScreenOff));
        h.app.face.hide();

        let rx = h.capture(None);
        assert_eq!(h.app.capture().target(), Some(CaptureTarget::Minicontrol));
        assert!(h.app.face().is_shown());
        let drawing = h.pending(TimerKind::Drawing);
        assert_eq!(drawing.len(), 1);
        assert_eq!(drawing[0].1, Duration::from_millis(150));

        h.fire(TimerKind::Drawing);
        h.run_idle();

        let expected = h.dump_dir().join("org.tizen.idle-clock-digital-dump_minicontrol.png");
        assert_eq!(reply_path(&rx), Some(expected.display().to_string()));
        assert!(expected.exists());
        assert!(!h.app.face().is_shown());
        assert!(!h.app.should_exit());
    }

    #[test]
    fn test_shown_clock_flushes_on_idle() {
        let mut h = Harness::new();
        h.send(AppEvent::MainRequested);
        let rx = h.capture(None);
        assert!(h.pending(TimerKind::Drawing).is_empty());
        assert!(h.app.has_idle_work());

        h.run_idle();
        assert!(reply_path(&rx).unwrap().ends_with("-dump_minicontrol.png"));
        assert!(h.app.face().is_shown());
    }

    #[test]
    fn test_offscreen_capture_exits_without_window() {
        let mut h = Harness::new();
        let rx = h.capture(None);
        assert_eq!(h.app.capture().target(), Some(CaptureTarget::Offscreen));

        h.fire(TimerKind::Drawing);
        h.run_idle();
        assert!(reply_path(&rx).unwrap().ends_with("-dump_offscreen.png"));
        assert!(h.app.should_exit());
    }

    #[test]
    fn test_main_during_capture_opens_window_after_reply() {
        let mut h = Harness::new();
        let rx = h.capture(Some(CaptureTarget::Offscreen));
        h.send(AppEvent::MainRequested);
        assert!(!h.app.window_exists());

        h.fire(TimerKind::Drawing);
        h.run_idle();

        assert!(reply_path(&rx).is_some());
        assert!(h.app.window_exists());
        assert!(!h.app.should_exit());
        assert!(!h.app.capture().has_surface());
    }

    #[test]
    fn test_window_target_replies_without_result() {
        let mut h = Harness::new();
        let rx = h.capture(Some(CaptureTarget::Window));
        assert_eq!(reply_path(&rx), None);
        assert!(h.app.window_exists());
        assert!(!h.app.should_exit());
    }

    #[test]
    fn test_settings_without_window_auto_closes() {
        let mut h = Harness::new();
        h.send(AppEvent::SettingsResult(
            r#"<Application><SettingsResult><Item id="showdate"><Opt checked="no"/></Item></SettingsResult></Application>"#
                .to_string(),
        ));

        assert_eq!(h.app.preferences().get_int("showdate").unwrap(), 0);
        assert_eq!(h.app.preferences().get_int("clock_font_color").unwrap(), 8);
        assert!(!h.app.face().date_visible());
        assert_eq!(h.pending(TimerKind::AutoClose)[0].1, Duration::from_secs(3));

        h.fire(TimerKind::AutoClose);
        assert!(h.app.should_exit());
    }

    #[test]
    fn test_existing_preferences_win_over_settings_result() {
        let mut prefs = MemoryPreferences::default();
        prefs.values.insert("showdate".into(), 1);
        let mut h = Harness::with_preferences(prefs);

        h.send(AppEvent::SettingsResult(
            r#"<Application><SettingsResult><Item id="showdate"><Opt checked="no"/></Item></SettingsResult></Application>"#
                .to_string(),
        ));
        assert_eq!(h.app.preferences().get_int("showdate").unwrap(), 1);
        assert!(h.app.face().date_visible());
    }

    #[test]
    fn test_settings_with_window_turns_display_on() {
        let mut h = Harness::new();
        h.send(AppEvent::MainRequested);
        h.send(AppEvent::DisplayStateChanged(DisplayState::ScreenOff));
        h.send(AppEvent::SettingsResult(
            r#"<Application><SettingsResult><Item id="clock_font_color"><Opt selected="2"/></Item></SettingsResult></Application>"#
                .to_string(),
        ));

        assert!(h.pending(TimerKind::AutoClose).is_empty());
        assert!(h.time_markup().unwrap().starts_with("<color=#CEFF00FF>"));
    }

    #[test]
    fn test_capture_cancels_auto_close() {
        let mut h = Harness::new();
        h.send(AppEvent::SettingsResult("<broken".to_string()));
        assert_eq!(h.pending(TimerKind::AutoClose).len(), 1);

        let _rx = h.capture(None);
        assert!(h.pending(TimerKind::AutoClose).is_empty());
    }

    #[test]
    fn test_teardown_cancels_everything() {
        let mut h = Harness::new();
        let _rx = h.capture(None);
        h.send(AppEvent::LocaleChanged);
        h.app.teardown();
        assert!(h.app.timers().is_empty());
        assert!(!h.app.capture().in_flight());
    }
}
