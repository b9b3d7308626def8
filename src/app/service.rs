//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the evaluator, actuator controller, connection
//! supervisor, telemetry publisher, and command channel.  All I/O flows
//! through port traits injected at call sites, so the whole loop is
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ StatusSink
//!                 │          ControlLoop          │ ──▶ EventSink
//! ActuatorPort ◀──│ Evaluator · Actuators · Supv  │
//!                 └──────────────────────────────┘
//!                     ▲  │                 │
//!         PubSubPort ─┘  └──▶ PubSubPort   └──▶ HttpPort
//!          (commands)        (telemetry)        (telemetry)
//! ```
//!
//! One cycle runs these steps in a fixed order:
//! ensure connected → read → evaluate → apply verdict → render → publish.
//! Remote commands are drained by [`ControlLoop::service_commands`]
//! between cycles on the same thread, so the two writers of actuator
//! state never interleave.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::safety::{DangerEvaluator, DangerVerdict};

use super::actuators::{ActuatorController, ActuatorState};
use super::command_channel::CommandChannel;
use super::commands::Decoded;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, HttpPort, PubSubPort, SensorPort, StatusSink};
use super::snapshot::SensorSnapshot;
use super::status::render_lines;
use super::supervisor::{ConnectionState, ConnectionSupervisor};
use super::telemetry::{DeliveryReport, TelemetryPublisher, TelemetryRecord};

/// Upper bound on messages handled per [`ControlLoop::service_commands`] call.
pub const MAX_COMMANDS_PER_POLL: usize = 8;

/// Everything one cycle produced, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub snapshot: SensorSnapshot,
    pub verdict: DangerVerdict,
    pub actuators: ActuatorState,
    pub connection: ConnectionState,
    pub delivery: DeliveryReport,
}

pub struct ControlLoop {
    config: SystemConfig,
    evaluator: DangerEvaluator,
    actuators: ActuatorController,
    supervisor: ConnectionSupervisor,
    publisher: TelemetryPublisher,
    commands: CommandChannel,
    /// Previous verdict, only for change events.
    last_verdict: Option<DangerVerdict>,
    cycle_count: u64,
}

impl ControlLoop {
    /// Build the loop from a validated configuration.
    ///
    /// Does **not** touch hardware. Call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let evaluator = DangerEvaluator::new(config.thresholds);
        let supervisor = ConnectionSupervisor::new(&config.timing);
        let publisher = TelemetryPublisher::new(config.topics.telemetry.clone());
        let commands = CommandChannel::new(config.topics.clone(), config.malformed_command);
        Self {
            config,
            evaluator,
            actuators: ActuatorController::new(),
            supervisor,
            publisher,
            commands,
            last_verdict: None,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put every output into its safe state and show the boot splash.
    pub fn start(
        &mut self,
        hw: &mut impl ActuatorPort,
        display: &mut impl StatusSink,
        sink: &mut impl EventSink,
    ) {
        self.actuators.force_safe_outputs(hw);
        display.render("Smart Kitchen", "Starting...");
        sink.emit(&AppEvent::Started);
        info!(
            "ControlLoop started (period {} ms, flame sensor {:?})",
            self.config.timing.control_period_ms, self.config.thresholds.flame_sensor
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn run_cycle(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        display: &mut impl StatusSink,
        link: &mut impl PubSubPort,
        http: &mut impl HttpPort,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        self.cycle_count += 1;

        // 1. Connection health
        let before = self.supervisor.state();
        let connection = self.supervisor.ensure_connected(link, &self.config.topics, now_ms);
        Self::emit_connection_change(before, connection, sink);

        // 2. Sense
        let snapshot = hw.read_all(now_ms);

        // 3. Evaluate
        let verdict = self.evaluator.evaluate(&snapshot);
        self.emit_verdict_change(&verdict, sink);

        // 4. Actuate
        let actuators = self.actuators.apply_verdict(&verdict, hw);

        // 5. Render
        let (line1, line2) = render_lines(&snapshot, &verdict);
        display.render(&line1, &line2);

        // 6. Publish (captures the state produced in step 4)
        let record = TelemetryRecord::from_cycle(&snapshot, &verdict, actuators);
        let before = self.supervisor.state();
        let delivery = self.publisher.publish(&record, link, http, &mut self.supervisor);
        Self::emit_connection_change(before, self.supervisor.state(), sink);
        sink.emit(&AppEvent::Telemetry(delivery));

        CycleReport {
            snapshot,
            verdict,
            actuators,
            connection: self.supervisor.state(),
            delivery,
        }
    }

    /// Drain pending remote commands. Returns how many messages were handled.
    pub fn service_commands(
        &mut self,
        hw: &mut impl ActuatorPort,
        link: &mut impl PubSubPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut handled = 0;
        while handled < MAX_COMMANDS_PER_POLL {
            let Some(msg) = link.poll_inbound() else {
                break;
            };
            handled += 1;

            let before = self.supervisor.state();
            let decoded =
                self.commands
                    .on_message(&msg, &mut self.actuators, hw, link, &mut self.supervisor);
            match decoded {
                Decoded::Command(command) => {
                    sink.emit(&AppEvent::CommandApplied { command, defaulted: false });
                }
                Decoded::Defaulted(command) => {
                    sink.emit(&AppEvent::CommandApplied { command, defaulted: true });
                }
                Decoded::Rejected => sink.emit(&AppEvent::CommandRejected),
                Decoded::UnknownTopic => {}
            }
            Self::emit_connection_change(before, self.supervisor.state(), sink);
        }
        handled
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn actuator_state(&self) -> ActuatorState {
        self.actuators.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Cycles executed since construction.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_verdict_change(&mut self, verdict: &DangerVerdict, sink: &mut impl EventSink) {
        let prev = self.last_verdict.replace(*verdict);
        match (prev, verdict.is_danger()) {
            (Some(p), true) if p == *verdict => {}
            (_, true) => {
                warn!("DANGER: {}", verdict.causes().summary());
                sink.emit(&AppEvent::DangerRaised(verdict.causes()));
            }
            (Some(p), false) if p.is_danger() => {
                info!("Danger cleared");
                sink.emit(&AppEvent::DangerCleared);
            }
            (_, false) => {}
        }
    }

    fn emit_connection_change(
        from: ConnectionState,
        to: ConnectionState,
        sink: &mut impl EventSink,
    ) {
        if from != to {
            sink.emit(&AppEvent::ConnectionChanged { from, to });
        }
    }
}
