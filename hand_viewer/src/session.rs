//! Session controller: one active mode, one live connection, one ingestor.
//!
//! Everything here runs on the caller's thread. [`Session::pump`] is called
//! once per window frame; it drains a bounded number of transport events in
//! arrival order, then runs the FPS tick and any due reconnect.

use std::time::Instant;

use hand_core::Surface;
use rand::thread_rng;
use tracing::{info, warn};

use crate::backoff::Backoff;
use crate::config::{Mode, ViewerConfig};
use crate::connection::{Applied, Connection, ConnectionState, Connector, TransportEvent};
use crate::ingest::{FrameIngestor, Payload};
use crate::presenter::Presenter;

pub struct Session<C: Connector> {
    config:       ViewerConfig,
    connector:    C,
    mode:         Option<Mode>,
    connection:   Connection,
    ingestor:     FrameIngestor,
    backoff:      Backoff,
    reconnect_at: Option<Instant>,
}

impl<C: Connector> Session<C> {
    pub fn new(config: ViewerConfig, connector: C, now: Instant) -> Self {
        let ingestor = FrameIngestor::new(&config, now);
        let backoff = Backoff::new(config.reconnect);
        Session {
            config,
            connector,
            mode: None,
            connection: Connection::new(),
            ingestor,
            backoff,
            reconnect_at: None,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────
    pub fn config(&self)        -> &ViewerConfig    { &self.config }
    pub fn mode(&self)          -> Option<Mode>     { self.mode }
    pub fn state(&self)         -> ConnectionState  { self.connection.state() }
    pub fn state_name(&self)    -> &'static str     { self.connection.state().as_str() }
    pub fn connection(&self)    -> &Connection      { &self.connection }
    pub fn ingestor(&self)      -> &FrameIngestor   { &self.ingestor }
    pub fn reconnect_at(&self)  -> Option<Instant>  { self.reconnect_at }
    pub fn connector(&self)     -> &C               { &self.connector }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Activate `mode` and open its stream.
    pub fn start<P: Presenter + ?Sized>(&mut self, mode: Mode, now: Instant, presenter: &mut P) {
        self.set_mode(Some(mode), presenter);
        self.backoff.reset();
        self.open(now, presenter);
    }

    /// Close the current stream and open the one for `mode`. Asking for the
    /// mode that is already streaming does nothing.
    pub fn switch_mode<P: Presenter + ?Sized>(&mut self, mode: Mode, now: Instant, presenter: &mut P) {
        if self.mode == Some(mode) && self.state().is_live() {
            return;
        }
        info!(from = ?self.mode, to = %mode, "switching mode");
        self.start(mode, now, presenter);
    }

    /// Explicit reconnect of the current mode. Returns `false` when no mode
    /// is active.
    pub fn reconnect<P: Presenter + ?Sized>(&mut self, now: Instant, presenter: &mut P) -> bool {
        if self.mode.is_none() {
            return false;
        }
        self.backoff.reset();
        self.open(now, presenter);
        true
    }

    pub fn disconnect<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.reconnect_at = None;
        let state = self.connection.disconnect();
        presenter.on_connection_state(state);
    }

    /// Disconnect and deactivate the mode.
    pub fn stop<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.disconnect(presenter);
        self.set_mode(None, presenter);
    }

    // ── per-frame work ────────────────────────────────────────────────────

    /// Process pending transport events (at most `max_events_per_pump`),
    /// then timers. Returns the number of events handled.
    pub fn pump<S, P>(&mut self, now: Instant, surface: &mut S, presenter: &mut P) -> usize
    where
        S: Surface + ?Sized,
        P: Presenter + ?Sized,
    {
        let mut handled = 0;
        while handled < self.config.max_events_per_pump {
            let Some(event) = self.connection.poll() else { break };
            handled += 1;
            self.dispatch(event, now, surface, presenter);
        }

        if self.ingestor.fps_due(now, self.config.fps_interval()) {
            self.ingestor.tick_fps(now, presenter);
        }

        if let Some(at) = self.reconnect_at {
            if now >= at && self.mode.is_some() {
                self.reconnect_at = None;
                info!(attempt = self.backoff.attempts(), "reconnecting");
                self.open(now, presenter);
            }
        }

        handled
    }

    fn dispatch<S, P>(&mut self, event: TransportEvent, now: Instant, surface: &mut S, presenter: &mut P)
    where
        S: Surface + ?Sized,
        P: Presenter + ?Sized,
    {
        match self.connection.apply(event) {
            Applied::Changed(state) => {
                presenter.on_connection_state(state);
                match state {
                    ConnectionState::Connected => self.backoff.reset(),
                    ConnectionState::Error     => self.schedule_reconnect(now),
                    _ => {}
                }
            }
            Applied::Text(text) => {
                if let Some(mode) = self.mode {
                    // errors are logged by the ingestor; the stream carries on
                    let _ = self.ingestor.ingest(Payload::Text(&text), mode, surface, presenter);
                }
            }
            Applied::Binary(len) => {
                if let Some(mode) = self.mode {
                    let _ = self.ingestor.ingest(Payload::Binary(len), mode, surface, presenter);
                }
            }
            Applied::Ignored => {}
        }
    }

    fn open<P: Presenter + ?Sized>(&mut self, now: Instant, presenter: &mut P) {
        let Some(mode) = self.mode else { return };
        let url = self.config.endpoint(mode);
        self.reconnect_at = None;
        let link = self.connector.open(&url);
        let state = self.connection.connect(url, link);
        self.ingestor.reset_counters(now);
        presenter.on_connection_state(state);
    }

    fn set_mode<P: Presenter + ?Sized>(&mut self, mode: Option<Mode>, presenter: &mut P) {
        self.mode = mode;
        presenter.on_mode(mode);
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        if !self.backoff.policy().enabled {
            return;
        }
        match self.backoff.next_delay(&mut thread_rng()) {
            Some(delay) => {
                info!(delay_ms = delay.as_millis() as u64, attempt = self.backoff.attempts(), "reconnect scheduled");
                self.reconnect_at = Some(now + delay);
            }
            None => warn!(attempts = self.backoff.attempts(), "giving up on reconnect"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::ReconnectPolicy;
    use crate::connection::{StopSignal, StreamLink, TransportError};
    use crate::presenter::recording::{Event, RecordingPresenter};
    use hand_core::RecordingSurface;
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedConnector {
        urls:    Vec<String>,
        senders: Vec<Sender<TransportEvent>>,
        stops:   Vec<StopSignal>,
    }

    impl Connector for ScriptedConnector {
        fn open(&mut self, url: &str) -> StreamLink {
            let (tx, link) = StreamLink::channel();
            self.urls.push(url.to_string());
            self.senders.push(tx);
            self.stops.push(link.stop_signal());
            link
        }
    }

    impl ScriptedConnector {
        fn send(&self, event: TransportEvent) {
            self.senders.last().unwrap().send(event).unwrap();
        }
    }

    fn failure() -> TransportEvent {
        TransportEvent::Failed(TransportError::WorkerExited { url: "ws://test".into() })
    }

    fn hand_frame() -> String {
        let pts: Vec<String> = (0..21).map(|i| format!(r#"{{"x":{},"y":0.5}}"#, i as f32 / 40.0)).collect();
        format!(r#"{{"hands":[{{"landmarks":[{}]}}]}}"#, pts.join(","))
    }

    struct Rig {
        session:   Session<ScriptedConnector>,
        surface:   RecordingSurface,
        presenter: RecordingPresenter,
        t0:        Instant,
    }

    impl Rig {
        fn new(config: ViewerConfig) -> Self {
            let t0 = Instant::now();
            Rig {
                session:   Session::new(config, ScriptedConnector::default(), t0),
                surface:   RecordingSurface::new(64, 48),
                presenter: RecordingPresenter::default(),
                t0,
            }
        }

        fn start(&mut self, mode: Mode) {
            self.session.start(mode, self.t0, &mut self.presenter);
        }

        fn pump_at(&mut self, offset: Duration) -> usize {
            self.session.pump(self.t0 + offset, &mut self.surface, &mut self.presenter)
        }

        fn pump(&mut self) -> usize {
            self.pump_at(Duration::ZERO)
        }

        fn send(&self, event: TransportEvent) {
            self.session.connector().send(event);
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────
    #[test]
    fn start_opens_the_mode_endpoint() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Coordinates);
        assert_eq!(rig.session.connector().urls, vec!["ws://127.0.0.1:8000/ws/coordinates"]);
        assert_eq!(rig.session.state_name(), "connecting");
        assert_eq!(
            rig.presenter.events,
            vec![Event::Mode(Some(Mode::Coordinates)), Event::State(ConnectionState::Connecting)],
        );
    }

    #[test]
    fn frames_flow_once_connected() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Coordinates);
        rig.send(TransportEvent::Opened);
        rig.send(TransportEvent::Text(hand_frame()));
        rig.send(TransportEvent::Text(r#"{"hands":[]}"#.into()));
        assert_eq!(rig.pump(), 3);

        assert_eq!(rig.session.state(), ConnectionState::Connected);
        assert_eq!(rig.presenter.hand_counts(), vec![1, 0]);
        assert_eq!(rig.session.ingestor().received(), 2);
        assert_eq!(rig.surface.polylines().count(), 5);
    }

    #[test]
    fn empty_frame_touches_neither_classifier_nor_renderer() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.send(TransportEvent::Opened);
        rig.send(TransportEvent::Text(r#"{"hands":[]}"#.into()));
        rig.pump();
        assert_eq!(rig.presenter.hand_counts(), vec![0]);
        assert!(!rig.presenter.events.iter().any(|e| matches!(e, Event::Gesture(_))));
        assert!(rig.surface.calls.is_empty());
    }

    #[test]
    fn transport_error_sticks() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.send(TransportEvent::Opened);
        rig.send(failure());
        rig.pump();
        assert_eq!(rig.session.state(), ConnectionState::Error);

        // no automatic retry by default
        rig.pump_at(Duration::from_secs(120));
        assert_eq!(rig.session.connector().urls.len(), 1);
        assert_eq!(rig.session.state(), ConnectionState::Error);
        assert_eq!(
            rig.presenter.states(),
            vec![ConnectionState::Connecting, ConnectionState::Connected, ConnectionState::Error],
        );
    }

    #[test]
    fn explicit_reconnect_leaves_error() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.send(failure());
        rig.pump();
        assert!(rig.session.reconnect(rig.t0, &mut rig.presenter));
        assert_eq!(rig.session.state(), ConnectionState::Connecting);
        assert_eq!(rig.session.connector().urls.len(), 2);
    }

    #[test]
    fn peer_close_is_disconnected() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Coordinates);
        rig.send(TransportEvent::Opened);
        rig.send(TransportEvent::Closed);
        rig.pump();
        assert_eq!(
            rig.presenter.states(),
            vec![ConnectionState::Connecting, ConnectionState::Connected, ConnectionState::Disconnected],
        );
    }

    // ── modes ─────────────────────────────────────────────────────────────
    #[test]
    fn switching_modes_drops_the_old_stream() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Coordinates);
        rig.send(TransportEvent::Opened);
        rig.send(TransportEvent::Text(hand_frame()));

        rig.session.switch_mode(Mode::Cursor, rig.t0, &mut rig.presenter);
        assert!(rig.session.connector().stops[0].is_triggered());
        assert_eq!(rig.session.connector().urls[1], "ws://127.0.0.1:8000/ws/cursor");

        // events queued on the old link are never seen
        assert_eq!(rig.pump(), 0);
        assert!(rig.presenter.hand_counts().is_empty());
        assert_eq!(rig.session.state(), ConnectionState::Connecting);
        assert_eq!(rig.session.mode(), Some(Mode::Cursor));
    }

    #[test]
    fn switching_to_the_live_mode_is_a_noop() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.session.switch_mode(Mode::Cursor, rig.t0, &mut rig.presenter);
        assert_eq!(rig.session.connector().urls.len(), 1);
    }

    #[test]
    fn stop_releases_everything() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.session.stop(&mut rig.presenter);
        assert_eq!(rig.session.state(), ConnectionState::Disconnected);
        assert_eq!(rig.session.mode(), None);
        assert!(rig.session.connector().stops[0].is_triggered());
        assert!(!rig.session.reconnect(rig.t0, &mut rig.presenter));
    }

    // ── pump bookkeeping ──────────────────────────────────────────────────
    #[test]
    fn pump_is_bounded() {
        let mut rig = Rig::new(ViewerConfig { max_events_per_pump: 2, ..ViewerConfig::default() });
        rig.start(Mode::Cursor);
        rig.send(TransportEvent::Opened);
        for _ in 0..3 {
            rig.send(TransportEvent::Text("{}".into()));
        }
        assert_eq!(rig.pump(), 2);
        assert_eq!(rig.pump(), 2);
        assert_eq!(rig.pump(), 0);
        assert_eq!(rig.presenter.hand_counts(), vec![0, 0, 0]);
    }

    #[test]
    fn fps_ticks_on_interval() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.start(Mode::Cursor);
        rig.send(TransportEvent::Opened);
        for _ in 0..30 {
            rig.send(TransportEvent::Text("{}".into()));
        }
        rig.pump_at(Duration::from_millis(500));
        assert!(!rig.presenter.events.contains(&Event::Fps(30)));
        rig.pump_at(Duration::from_secs(1));
        assert!(rig.presenter.events.contains(&Event::Fps(30)));
    }

    // ── backoff ───────────────────────────────────────────────────────────
    #[test]
    fn enabled_backoff_reconnects_after_delay() {
        let policy = ReconnectPolicy { enabled: true, jitter: 0.0, ..ReconnectPolicy::default() };
        let mut rig = Rig::new(ViewerConfig { reconnect: policy, ..ViewerConfig::default() });
        rig.start(Mode::Cursor);
        rig.send(failure());
        rig.pump();
        assert_eq!(rig.session.reconnect_at(), Some(rig.t0 + Duration::from_millis(500)));

        rig.pump_at(Duration::from_millis(499));
        assert_eq!(rig.session.connector().urls.len(), 1);
        rig.pump_at(Duration::from_millis(500));
        assert_eq!(rig.session.connector().urls.len(), 2);
        assert_eq!(rig.session.state(), ConnectionState::Connecting);

        // second failure waits twice as long
        rig.send(failure());
        rig.pump_at(Duration::from_millis(600));
        assert_eq!(rig.session.reconnect_at(), Some(rig.t0 + Duration::from_millis(1600)));
    }

    #[test]
    fn disconnect_cancels_pending_reconnect() {
        let policy = ReconnectPolicy { enabled: true, jitter: 0.0, ..ReconnectPolicy::default() };
        let mut rig = Rig::new(ViewerConfig { reconnect: policy, ..ViewerConfig::default() });
        rig.start(Mode::Cursor);
        rig.send(failure());
        rig.pump();
        rig.session.disconnect(&mut rig.presenter);
        assert_eq!(rig.session.reconnect_at(), None);
        rig.pump_at(Duration::from_secs(10));
        assert_eq!(rig.session.connector().urls.len(), 1);
    }
}
