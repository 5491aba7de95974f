//! Command dispatch: resolve a normalized command against the active
//! application's shortcut table and emit the resulting key sequences.
//!
//! The pipeline for each command:
//!
//! 1. Probe the foreground application (rate limited).
//! 2. Fetch its shortcut table from the cache (store-discovered entries
//!    merged over built-in defaults; the generic table when nothing is
//!    detected).
//! 3. Decompose compound commands (zoom intensity → N steps, rotate degrees
//!    → one step per five degrees) and emit each step with a pacing delay.
//! 4. Answer with exactly one acknowledgement per command, however many
//!    emissions it decomposed into.
//!
//! Dispatch failures never end the session: an unmapped action acks
//! `unknown`, an emission failure acks `error`, and the next command
//! proceeds normally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, error, warn};

use artremote_core::domain::builtin;
use artremote_core::{
    ActionName, AckStatus, AppId, Command, HostMessage, KeySequence, KeyToken, PanDirection,
    Platform, ShortcutTable, ZoomDirection,
};

use crate::application::cache::SourceCache;
use crate::infrastructure::adapters::AdapterRegistry;
use crate::infrastructure::detect::RateLimitedDetector;
use crate::infrastructure::emit::{EmitError, InputEmitter};

/// Emissions per unit of zoom intensity.
const ZOOM_STEPS_PER_INTENSITY: f64 = 3.0;
/// Degrees of canvas rotation covered by one rotate emission.
const DEGREES_PER_ROTATE_STEP: f64 = 5.0;
/// Upper bound on decomposed emissions for one command.  A full half-turn
/// of rotation at five degrees per step; anything larger is client input
/// gone wrong, not a gesture.
const MAX_STEPS_PER_COMMAND: usize = 36;

/// Outcome of resolving and emitting one action.
enum Emission {
    Done,
    Unsupported,
    Failed(EmitError),
}

/// Wall-clock accounting for one dispatch.  Intentional pacing sleeps are
/// recorded and excluded, so the slow-dispatch warning only fires on real
/// work (cache reloads, a stalled emitter), never on the pacing itself.
struct DispatchTimer {
    started: Instant,
    paced: Duration,
}

impl DispatchTimer {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            paced: Duration::ZERO,
        }
    }

    fn note_pacing(&mut self, delay: Duration) {
        self.paced += delay;
    }

    fn busy_elapsed(&self) -> Duration {
        self.started.elapsed().saturating_sub(self.paced)
    }
}

pub struct Dispatcher {
    cache: SourceCache<ShortcutTable>,
    adapters: Arc<AdapterRegistry>,
    detector: Arc<RateLimitedDetector>,
    emitter: Arc<dyn InputEmitter>,
    platform: Platform,
    step_delay: Duration,
    slow_warn: Duration,
}

impl Dispatcher {
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        detector: Arc<RateLimitedDetector>,
        emitter: Arc<dyn InputEmitter>,
        platform: Platform,
        step_delay: Duration,
        slow_warn: Duration,
    ) -> Self {
        Self {
            cache: SourceCache::new(),
            adapters,
            detector,
            emitter,
            platform,
            step_delay,
            slow_warn,
        }
    }

    /// The detected application and its current shortcut table.  Used for
    /// the `app_detected` push after authentication.
    pub async fn active_context(&self) -> (Option<AppId>, Arc<ShortcutTable>) {
        let app = self.detector.current_app();
        let table = self.table_for(app).await;
        (app, table)
    }

    /// Handles one raw `{action, value}` command and produces its single
    /// response message.
    pub async fn dispatch(&self, action: &str, value: Option<&serde_json::Value>) -> HostMessage {
        let mut timer = DispatchTimer::start();
        let command = Command::from_wire(action, value);
        debug!(action, ?command, "dispatching command");

        let response = self.run(action, command, &mut timer).await;

        let busy = timer.busy_elapsed();
        if busy > self.slow_warn {
            warn!(
                action,
                busy_ms = busy.as_millis() as u64,
                "slow command dispatch"
            );
        }
        response
    }

    async fn run(
        &self,
        action: &str,
        command: Command,
        timer: &mut DispatchTimer,
    ) -> HostMessage {
        let (_app, table) = self.active_context().await;

        match command {
            Command::Simple(name) => self.ack_single(action, &table, name).await,

            Command::Zoom {
                direction,
                intensity,
            } => {
                let steps = clamp_steps(intensity * ZOOM_STEPS_PER_INTENSITY);
                self.ack_repeated(action, &table, zoom_action(direction), steps, timer)
                    .await
            }

            Command::Rotate { degrees } => {
                let steps = clamp_steps(degrees.abs() / DEGREES_PER_ROTATE_STEP);
                let name = if degrees < 0.0 {
                    ActionName::RotateLeft
                } else {
                    ActionName::RotateRight
                };
                self.ack_repeated(action, &table, name, steps, timer).await
            }

            Command::Scroll { direction } => {
                self.ack_single(action, &table, zoom_action(direction)).await
            }

            Command::Tool { name } => match tool_action(&name) {
                Some(tool) => self.ack_single(action, &table, tool).await,
                None => {
                    debug!(action, tool = %name, "unknown tool name");
                    HostMessage::ack(AckStatus::Unknown, action)
                }
            },

            Command::BrushSize { delta } => {
                if delta == 0 {
                    return HostMessage::ack(AckStatus::Received, action);
                }
                let name = if delta > 0 {
                    ActionName::BrushSizeUp
                } else {
                    ActionName::BrushSizeDown
                };
                self.ack_single(action, &table, name).await
            }

            Command::CanvasPan { direction } => {
                // Only the hand-tool switch is a key sequence; the drag
                // itself is pointer input and stays on the device side.
                let message = match direction {
                    PanDirection::Left => "pan left",
                    PanDirection::Right => "pan right",
                };
                match self.emit_action(&table, ActionName::ToolPan).await {
                    Emission::Done => {
                        HostMessage::ack_with_message(AckStatus::Executed, action, message)
                    }
                    Emission::Unsupported => HostMessage::ack(AckStatus::Unknown, action),
                    Emission::Failed(e) => {
                        HostMessage::ack_with_message(AckStatus::Error, action, e.to_string())
                    }
                }
            }

            Command::LayerLegacy { create } => {
                let name = if create {
                    ActionName::LayerNew
                } else {
                    ActionName::LayerDelete
                };
                self.ack_single(action, &table, name).await
            }

            Command::SelectTool {
                tool,
                subtool_name,
                slot,
            } => {
                self.select_tool(action, &table, &tool, &subtool_name, slot, timer)
                    .await
            }

            Command::RefreshFavorites => self.refresh_favorites().await,

            Command::Unknown(name) => {
                debug!(action = %name, "unknown action");
                HostMessage::ack(AckStatus::Unknown, action)
            }
        }
    }

    // ── Command handlers ──────────────────────────────────────────────────────

    async fn select_tool(
        &self,
        action: &str,
        table: &ShortcutTable,
        tool: &str,
        subtool_name: &str,
        slot: Option<u8>,
        timer: &mut DispatchTimer,
    ) -> HostMessage {
        if tool.eq_ignore_ascii_case("favorites") {
            let Some(slot) = slot else {
                return HostMessage::ack_with_message(
                    AckStatus::Error,
                    action,
                    "invalid favorites slot",
                );
            };
            return match self
                .emit(KeySequence::single(KeyToken::Function(slot)))
                .await
            {
                Ok(()) => HostMessage::ack_with_message(AckStatus::Executed, action, subtool_name),
                Err(e) => HostMessage::ack_with_message(AckStatus::Error, action, e.to_string()),
            };
        }

        let Some(name) = tool_group_action(tool) else {
            debug!(action, tool, "unknown tool group");
            return HostMessage::ack(AckStatus::Unknown, action);
        };
        match self.emit_action(table, name).await {
            Emission::Done => {
                // Give the application a beat to complete the tool switch
                // before the next command lands.
                self.pace(timer).await;
                HostMessage::ack_with_message(AckStatus::Executed, action, subtool_name)
            }
            Emission::Unsupported => HostMessage::ack(AckStatus::Unknown, action),
            Emission::Failed(e) => {
                HostMessage::ack_with_message(AckStatus::Error, action, e.to_string())
            }
        }
    }

    /// Forces a store rescan and answers with the favorites snapshot.
    async fn refresh_favorites(&self) -> HostMessage {
        self.detector.force_refresh();
        let app = self.detector.current_app();
        if let Some(app) = app {
            self.cache.invalidate(&cache_key(app, self.platform));
        }
        let table = self.table_for(app).await;
        HostMessage::favorites_data(&table)
    }

    // ── Resolution and emission ───────────────────────────────────────────────

    /// Fetches the shortcut table for `app` through the cache, merging the
    /// store-discovered entries over the built-in defaults.  Unrecognized or
    /// undetected applications get the generic table.
    async fn table_for(&self, app: Option<AppId>) -> Arc<ShortcutTable> {
        let Some(app) = app else {
            return Arc::new(builtin::generic(self.platform));
        };
        let Some(adapter) = self.adapters.get(app) else {
            return Arc::new(builtin::table_for(app, self.platform));
        };

        let platform = self.platform;
        self.cache
            .get_or_load(&cache_key(app, platform), adapter.ttl(), || {
                let adapter = Arc::clone(&adapter);
                async move {
                    let paths = adapter.source_paths();
                    let loaded = tokio::task::spawn_blocking({
                        let adapter = Arc::clone(&adapter);
                        move || adapter.load(platform)
                    })
                    .await;
                    let discovered = match loaded {
                        Ok(table) => table,
                        Err(e) => {
                            error!(app = %app.as_str(), "shortcut load task failed: {e}");
                            ShortcutTable::new()
                        }
                    };
                    let table = discovered.merge_over(&builtin::table_for(app, platform));
                    (table, paths)
                }
            })
            .await
    }

    /// Resolves one action and emits its sequence once.
    async fn emit_action(&self, table: &ShortcutTable, name: ActionName) -> Emission {
        let Some(keys) = table.lookup(name) else {
            debug!(action = %name, "no shortcut mapping for action");
            return Emission::Unsupported;
        };
        match self.emit(keys.clone()).await {
            Ok(()) => Emission::Done,
            Err(e) => Emission::Failed(e),
        }
    }

    async fn ack_single(
        &self,
        action: &str,
        table: &ShortcutTable,
        name: ActionName,
    ) -> HostMessage {
        match self.emit_action(table, name).await {
            Emission::Done => HostMessage::ack(AckStatus::Executed, action),
            Emission::Unsupported => HostMessage::ack(AckStatus::Unknown, action),
            Emission::Failed(e) => {
                HostMessage::ack_with_message(AckStatus::Error, action, e.to_string())
            }
        }
    }

    /// Emits `steps` repetitions of one action with the pacing delay between
    /// them, producing a single acknowledgement.
    async fn ack_repeated(
        &self,
        action: &str,
        table: &ShortcutTable,
        name: ActionName,
        steps: usize,
        timer: &mut DispatchTimer,
    ) -> HostMessage {
        let Some(keys) = table.lookup(name) else {
            debug!(action = %name, "no shortcut mapping for action");
            return HostMessage::ack(AckStatus::Unknown, action);
        };
        let keys = keys.clone();

        for step in 0..steps {
            if let Err(e) = self.emit(keys.clone()).await {
                error!(action, step, "emission failed mid-decomposition: {e}");
                return HostMessage::ack_with_message(AckStatus::Error, action, e.to_string());
            }
            if step + 1 < steps {
                self.pace(timer).await;
            }
        }
        HostMessage::ack(AckStatus::Executed, action)
    }

    /// Sleeps the pacing delay and records it as intentional time.
    async fn pace(&self, timer: &mut DispatchTimer) {
        timer.note_pacing(self.step_delay);
        sleep(self.step_delay).await;
    }

    /// Runs the blocking emitter off the async runtime.
    async fn emit(&self, keys: KeySequence) -> Result<(), EmitError> {
        let emitter = Arc::clone(&self.emitter);
        match tokio::task::spawn_blocking(move || emitter.emit(&keys)).await {
            Ok(result) => result,
            Err(e) => Err(EmitError::Platform(format!("emission task failed: {e}"))),
        }
    }
}

fn cache_key(app: AppId, platform: Platform) -> String {
    format!("{}:{}", app.as_str(), platform.as_str())
}

/// At least one step, never more than the per-command bound.
fn clamp_steps(raw: f64) -> usize {
    if !raw.is_finite() || raw <= 1.0 {
        return 1;
    }
    (raw as usize).clamp(1, MAX_STEPS_PER_COMMAND)
}

fn zoom_action(direction: ZoomDirection) -> ActionName {
    match direction {
        ZoomDirection::In => ActionName::ZoomIn,
        ZoomDirection::Out => ActionName::ZoomOut,
    }
}

/// Short tool names from the `tool` command.
fn tool_action(name: &str) -> Option<ActionName> {
    match name {
        "brush" => Some(ActionName::ToolBrush),
        "pen" => Some(ActionName::ToolPen),
        "pencil" => Some(ActionName::ToolPencil),
        "airbrush" => Some(ActionName::ToolAirbrush),
        "decoration" => Some(ActionName::ToolDecoration),
        "blend" => Some(ActionName::ToolBlend),
        "liquify" => Some(ActionName::ToolLiquify),
        "eraser" => Some(ActionName::ToolEraser),
        "pan" => Some(ActionName::ToolPan),
        "select" => Some(ActionName::ToolSelect),
        "fill" => Some(ActionName::ToolFill),
        "eyedropper" => Some(ActionName::ToolEyedropper),
        _ => None,
    }
}

/// Tool-group identifiers from the `select_tool` family.
fn tool_group_action(group: &str) -> Option<ActionName> {
    match group {
        "pen_group" => Some(ActionName::ToolPen),
        "brush_group" => Some(ActionName::ToolBrush),
        "blend_group" => Some(ActionName::ToolBlend),
        "eraser" => Some(ActionName::ToolEraser),
        "selection" => Some(ActionName::ToolSelect),
        "fill" => Some(ActionName::ToolFill),
        "eyedropper" => Some(ActionName::ToolEyedropper),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::detect::mock::MockAppDetector;
    use crate::infrastructure::emit::mock::MockInputEmitter;
    use serde_json::json;

    /// Dispatcher wired to mocks: no adapters, so known apps resolve to
    /// their built-in tables.
    fn dispatcher(detected: Option<&str>) -> (Dispatcher, Arc<MockInputEmitter>) {
        let emitter = Arc::new(MockInputEmitter::new());
        let detector = Arc::new(RateLimitedDetector::new(
            Arc::new(MockAppDetector::new(detected)),
            Duration::ZERO,
        ));
        let dispatcher = Dispatcher::new(
            Arc::new(AdapterRegistry::new()),
            detector,
            emitter.clone(),
            Platform::Windows,
            Duration::ZERO,
            Duration::from_secs(5),
        );
        (dispatcher, emitter)
    }

    fn assert_ack(msg: &HostMessage, expected: AckStatus) {
        match msg {
            HostMessage::Ack { status, .. } => assert_eq!(*status, expected),
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_simple_action_emits_once_and_acks_executed() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));

        // Act
        let response = dispatcher.dispatch("undo", None).await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        let emitted = emitter.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].tokens(),
            &[KeyToken::Ctrl, KeyToken::Char('z')]
        );
    }

    #[tokio::test]
    async fn test_zoom_intensity_decomposes_into_steps_single_ack() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!({"direction": "in", "intensity": 1.5});

        // Act
        let response = dispatcher.dispatch("zoom", Some(&value)).await;

        // Assert: 1.5 × 3 truncates to 4 emissions, exactly one ack.
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), 4);
    }

    #[tokio::test]
    async fn test_zoom_steps_capped_for_hostile_intensity() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!({"direction": "in", "intensity": 1.0e9});

        // Act
        let response = dispatcher.dispatch("zoom", Some(&value)).await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), MAX_STEPS_PER_COMMAND);
    }

    #[tokio::test]
    async fn test_rotate_steps_capped_for_hostile_degrees() {
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!(-1.0e12);

        let response = dispatcher.dispatch("rotate", Some(&value)).await;

        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), MAX_STEPS_PER_COMMAND);
    }

    #[tokio::test]
    async fn test_zoom_minimal_intensity_still_emits_once() {
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!({"direction": "out", "intensity": 0.1});

        let response = dispatcher.dispatch("zoom", Some(&value)).await;

        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), 1);
    }

    #[tokio::test]
    async fn test_rotate_degrees_decompose_one_step_per_five() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));

        // Act: -20 degrees → 4 left steps.
        let value = json!(-20.0);
        let response = dispatcher.dispatch("rotate", Some(&value)).await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        let emitted = emitter.emitted();
        assert_eq!(emitted.len(), 4);
        // Krita built-in rotate-left is Ctrl+[.
        assert!(emitted
            .iter()
            .all(|seq| seq.tokens() == [KeyToken::Ctrl, KeyToken::Char('[')]));
    }

    #[tokio::test]
    async fn test_unknown_action_never_emits() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));

        // Act
        let response = dispatcher.dispatch("make_coffee", None).await;

        // Assert
        assert_ack(&response, AckStatus::Unknown);
        assert_eq!(emitter.emitted_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_action_for_app_acks_unknown() {
        // Arrange: the generic fallback table has no layer_merge mapping.
        let (dispatcher, emitter) = dispatcher(None);

        // Act
        let response = dispatcher.dispatch("layer_merge", None).await;

        // Assert
        assert_ack(&response, AckStatus::Unknown);
        assert_eq!(emitter.emitted_count(), 0);
    }

    #[tokio::test]
    async fn test_undetected_app_falls_back_to_generic_table() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(None);

        // Act: undo is in the generic table.
        let response = dispatcher.dispatch("undo", None).await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), 1);
    }

    #[tokio::test]
    async fn test_emission_failure_acks_error_session_continues() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        emitter.fail_from_now();

        // Act
        let failed = dispatcher.dispatch("undo", None).await;

        // Assert: error ack, then the dispatcher still works afterwards.
        assert_ack(&failed, AckStatus::Error);
        match &failed {
            HostMessage::Ack { message, .. } => assert!(message.is_some()),
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_favorites_selection_presses_function_key() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("CLIP STUDIO PAINT"));
        let value = json!({"tool": "favorites", "tool_name": "Wet Oil", "subtool_uuid": "F5"});

        // Act
        let response = dispatcher.dispatch("select_tool", Some(&value)).await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        let emitted = emitter.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].tokens(), &[KeyToken::Function(5)]);
    }

    #[tokio::test]
    async fn test_favorites_selection_with_bad_slot_acks_error() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("CLIP STUDIO PAINT"));
        let value = json!({"tool": "favorites", "subtool_uuid": "F13"});

        // Act
        let response = dispatcher.dispatch("select_tool", Some(&value)).await;

        // Assert
        assert_ack(&response, AckStatus::Error);
        assert_eq!(emitter.emitted_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_group_selection_switches_tool() {
        // Arrange
        let (dispatcher, emitter) = dispatcher(Some("CLIP STUDIO PAINT"));
        let value = json!({"tool": "pen_group", "subtool_name": "G-Pen"});

        // Act
        let response = dispatcher.dispatch("select_subtool", Some(&value)).await;

        // Assert: CSP built-in pen key.
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted()[0].tokens(), &[KeyToken::Char('p')]);
    }

    #[tokio::test]
    async fn test_legacy_string_zoom_payload_dispatches() {
        // Arrange: older remotes stringify the payload map.
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!("{direction=in, intensity=1.5}");

        // Act
        let response = dispatcher.dispatch("zoom", Some(&value)).await;

        // Assert: identical to the structured form.
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), 4);
    }

    #[tokio::test]
    async fn test_get_favorites_returns_snapshot() {
        // Arrange
        let (dispatcher, _emitter) = dispatcher(Some("Krita"));

        // Act
        let response = dispatcher.dispatch("get_favorites", None).await;

        // Assert: all twelve slots reported (none assigned without stores).
        match response {
            HostMessage::FavoritesData {
                favorites,
                total_assigned,
                ..
            } => {
                assert_eq!(favorites.len(), 12);
                assert_eq!(total_assigned, 0);
            }
            other => panic!("expected favorites_data, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_timer_excludes_recorded_pacing() {
        // Arrange
        let mut timer = DispatchTimer::start();
        std::thread::sleep(Duration::from_millis(10));

        // Act: record more pacing than the elapsed wall time.
        timer.note_pacing(Duration::from_secs(1));

        // Assert: the busy measurement saturates instead of going negative.
        assert_eq!(timer.busy_elapsed(), Duration::ZERO);
    }

    /// A stock paced zoom sleeps longer than the slow-dispatch threshold;
    /// that pacing must not register as busy time.
    #[tokio::test]
    async fn test_ordinary_paced_zoom_not_measured_as_slow() {
        // Arrange: pacing alone is 60 ms across three steps.
        let emitter = Arc::new(MockInputEmitter::new());
        let detector = Arc::new(RateLimitedDetector::new(
            Arc::new(MockAppDetector::new(Some("Krita"))),
            Duration::ZERO,
        ));
        let dispatcher = Dispatcher::new(
            Arc::new(AdapterRegistry::new()),
            detector,
            emitter.clone(),
            Platform::Windows,
            Duration::from_millis(30),
            Duration::from_millis(50),
        );
        let table = builtin::table_for(AppId::Krita, Platform::Windows);
        let mut timer = DispatchTimer::start();

        // Act
        let response = dispatcher
            .ack_repeated("zoom", &table, ActionName::ZoomIn, 3, &mut timer)
            .await;

        // Assert
        assert_ack(&response, AckStatus::Executed);
        assert_eq!(emitter.emitted_count(), 3);
        assert_eq!(timer.paced, Duration::from_millis(60));
        assert!(
            timer.busy_elapsed() < Duration::from_millis(50),
            "pacing sleeps leaked into the busy measurement"
        );
    }

    #[tokio::test]
    async fn test_brush_size_zero_delta_acks_received() {
        let (dispatcher, emitter) = dispatcher(Some("Krita"));
        let value = json!({"delta": 0});

        let response = dispatcher.dispatch("brush_size", Some(&value)).await;

        assert_ack(&response, AckStatus::Received);
        assert_eq!(emitter.emitted_count(), 0);
    }

    #[tokio::test]
    async fn test_active_context_reports_detected_app() {
        let (dispatcher, _emitter) = dispatcher(Some("Clip Studio Paint EX"));
        let (app, table) = dispatcher.active_context().await;
        assert_eq!(app, Some(AppId::ClipStudioPaint));
        assert!(table.lookup(ActionName::ToolPen).is_some());
    }
}
