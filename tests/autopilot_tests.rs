//! Motion controller tests against the mock vehicle: dwell timing with
//! irregular ticks and disengaging from every phase

use rs_metro::{
    hal::{DoorCommand, MockClock, MockVehicle},
    traits::Clock,
    AutopilotConfig, ClosePhase, JourneyEvent, JourneyState, MotionController, StopPhase,
};

/// Deterministic tick spacing between 1 and 400 ms.
struct Jitter(u32);

impl Jitter {
    fn next_ms(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        u64::from(self.0 % 400) + 1
    }
}

fn stopped_on_mark(clock: &MockClock) -> MotionController<MockVehicle> {
    let vehicle = MockVehicle::new().moving(20.0).with_distance(10.0);
    let mut autopilot = MotionController::new(vehicle);
    autopilot.activate(clock.now_ms()).unwrap();

    autopilot.vehicle_mut().speed = 0.0;
    autopilot.vehicle_mut().distance = Some(0.5);
    let event = autopilot.update(clock.now_ms()).unwrap();
    assert_eq!(event, Some(JourneyEvent::Arrived { distance: 0.5 }));
    autopilot
}

// ============================================================================
// Dwell timing
// ============================================================================

#[test]
fn dwell_respects_delays_with_irregular_ticks() {
    for seed in [1, 7, 42, 1234, 0xdead_beef] {
        let config = AutopilotConfig::default();
        let mut clock = MockClock::new();
        clock.set(10_000);
        let mut jitter = Jitter(seed);
        let mut autopilot = stopped_on_mark(&clock);

        let mut at_rest_ms = None;
        let mut opened_ms = None;
        let mut closing_ms = None;
        let mut waiting_ms = None;
        let mut last_state = autopilot.state();

        while autopilot.state() != JourneyState::Accelerating {
            let step = jitter.next_ms();
            clock.advance(step);
            let now = clock.now_ms();
            let event = autopilot.update(now).unwrap();
            let state = autopilot.state();

            match (last_state, state) {
                (
                    JourneyState::StationStop(StopPhase::Verifying),
                    JourneyState::StationStop(StopPhase::Dwelling),
                ) => at_rest_ms = Some(now),
                (_, JourneyState::DoorsOpen) if last_state != state => {
                    let rest = at_rest_ms.unwrap();
                    assert!(now - rest >= config.door_open_delay_ms);
                    assert!(now - rest < config.door_open_delay_ms + step);
                    assert_eq!(event, Some(JourneyEvent::DoorsOpening));
                    opened_ms = Some(now);
                }
                (JourneyState::DoorsOpen, JourneyState::DoorsClosing(_)) => {
                    let opened = opened_ms.unwrap();
                    assert!(now - opened >= config.door_open_time_ms);
                    assert!(now - opened < config.door_open_time_ms + step);
                    closing_ms = Some(now);
                }
                (_, JourneyState::WaitingDeparture) if last_state != state => {
                    waiting_ms = Some(now);
                }
                (JourneyState::WaitingDeparture, JourneyState::Accelerating) => {
                    let waiting = waiting_ms.unwrap();
                    assert!(now - waiting >= config.door_close_delay_ms);
                    assert!(now - waiting < config.door_close_delay_ms + step);
                    assert_eq!(event, Some(JourneyEvent::Departed));
                }
                _ => {}
            }
            last_state = state;
            assert!(clock.now_ms() < 60_000, "dwell never finished (seed {seed})");
        }

        assert!(closing_ms.is_some());
        assert_eq!(
            autopilot.vehicle().door_commands,
            [DoorCommand::Open, DoorCommand::Close]
        );
    }
}

#[test]
fn movement_during_dwell_reissues_braking() {
    let clock = MockClock::new();
    let mut autopilot = stopped_on_mark(&clock);
    autopilot.update(20).unwrap();
    assert_eq!(
        autopilot.state(),
        JourneyState::StationStop(StopPhase::Dwelling)
    );

    // Physics nudges the vehicle
    autopilot.vehicle_mut().speed = 0.3;
    autopilot.vehicle_mut().commanded_acceleration = Some(0.0);
    autopilot.update(1500).unwrap();
    assert_eq!(autopilot.vehicle().commanded_acceleration, Some(-5.0));
    assert!(autopilot.vehicle().door_commands.is_empty());

    // Back at rest: timer kept running from the original stop
    autopilot.vehicle_mut().speed = 0.0;
    assert_eq!(
        autopilot.update(1520).unwrap(),
        Some(JourneyEvent::DoorsOpening)
    );
}

#[test]
fn custom_dwell_timings() {
    let config = AutopilotConfig::default()
        .with_door_open_delay_ms(200)
        .with_door_open_time_ms(300)
        .with_door_close_delay_ms(400);
    let vehicle = MockVehicle::new().moving(20.0).with_distance(1.0);
    let mut autopilot = MotionController::with_config(vehicle, config);
    autopilot.activate(0).unwrap();
    autopilot.vehicle_mut().speed = 0.0;

    let mut events = Vec::new();
    for now in (0..=2000).step_by(100) {
        if let Some(event) = autopilot.update(now).unwrap() {
            events.push((now, event));
        }
    }
    assert_eq!(
        events,
        [
            (0, JourneyEvent::Arrived { distance: 1.0 }),
            (300, JourneyEvent::DoorsOpening),
            (600, JourneyEvent::DoorsClosing),
            (1100, JourneyEvent::Departed),
        ]
    );
}

// ============================================================================
// Disengaging
// ============================================================================

/// Drives a mock vehicle into `target` and returns the engaged controller.
fn engaged_in(target: JourneyState) -> MotionController<MockVehicle> {
    let mut autopilot;
    match target {
        JourneyState::Accelerating => {
            autopilot = MotionController::new(MockVehicle::new().with_distance(900.0));
            autopilot.activate(0).unwrap();
        }
        JourneyState::Cruising => {
            autopilot = MotionController::new(MockVehicle::new().moving(80.0));
            autopilot.activate(0).unwrap();
        }
        JourneyState::Braking => {
            autopilot = MotionController::new(MockVehicle::new().moving(20.0).with_distance(10.0));
            autopilot.activate(0).unwrap();
        }
        JourneyState::StationMissed => {
            autopilot = engaged_in(JourneyState::Braking);
            autopilot.vehicle_mut().speed = 0.0;
            autopilot.update(20).unwrap();
        }
        JourneyState::Idle => {
            autopilot = engaged_in(JourneyState::Braking);
            autopilot.vehicle_mut().speed = 0.0;
            autopilot.vehicle_mut().distance = None;
            autopilot.update(20).unwrap();
        }
        JourneyState::StationStop(StopPhase::Verifying) => {
            autopilot = stopped_on_mark(&MockClock::new());
        }
        JourneyState::StationStop(StopPhase::Dwelling) => {
            autopilot = engaged_in(JourneyState::StationStop(StopPhase::Verifying));
            autopilot.update(20).unwrap();
        }
        JourneyState::DoorsOpen => {
            autopilot = engaged_in(JourneyState::StationStop(StopPhase::Dwelling));
            autopilot.update(1020).unwrap();
        }
        JourneyState::DoorsClosing(ClosePhase::AwaitingConfirmation) => {
            autopilot = engaged_in(JourneyState::DoorsOpen);
            autopilot.update(6020).unwrap();
        }
        JourneyState::DoorsClosing(ClosePhase::Confirmed) => {
            autopilot = engaged_in(JourneyState::DoorsClosing(
                ClosePhase::AwaitingConfirmation,
            ));
            autopilot.vehicle_mut().doors.animating = true;
            autopilot.update(6040).unwrap();
        }
        JourneyState::WaitingDeparture => {
            autopilot = engaged_in(JourneyState::DoorsClosing(ClosePhase::Confirmed));
            autopilot.vehicle_mut().doors.animating = false;
            autopilot.update(6060).unwrap();
        }
    }
    assert_eq!(autopilot.state(), target);
    assert!(autopilot.is_active());
    autopilot
}

const EVERY_STATE: [JourneyState; 11] = [
    JourneyState::Idle,
    JourneyState::Accelerating,
    JourneyState::Cruising,
    JourneyState::Braking,
    JourneyState::StationStop(StopPhase::Verifying),
    JourneyState::StationStop(StopPhase::Dwelling),
    JourneyState::DoorsOpen,
    JourneyState::DoorsClosing(ClosePhase::AwaitingConfirmation),
    JourneyState::DoorsClosing(ClosePhase::Confirmed),
    JourneyState::WaitingDeparture,
    JourneyState::StationMissed,
];

#[test]
fn deactivate_from_every_state() {
    for state in EVERY_STATE {
        let mut autopilot = engaged_in(state);
        let stops_before = autopilot.vehicle().emergency_stops;

        autopilot.deactivate().unwrap();

        assert!(!autopilot.is_active(), "{state:?}");
        assert_eq!(autopilot.state(), JourneyState::Idle, "{state:?}");
        assert_eq!(
            autopilot.vehicle().emergency_stops,
            stops_before + 1,
            "{state:?}"
        );

        // Nothing happens until re-activated
        let commands = autopilot.vehicle().acceleration_commands;
        assert_eq!(autopilot.update(100_000).unwrap(), None);
        assert_eq!(autopilot.vehicle().acceleration_commands, commands);
    }
}

#[test]
fn reactivate_after_deactivate() {
    for state in EVERY_STATE {
        let mut autopilot = engaged_in(state);
        autopilot.deactivate().unwrap();
        autopilot.vehicle_mut().override_engaged = false;

        autopilot.activate(200_000).unwrap();
        assert!(autopilot.is_active());
        assert_ne!(autopilot.state(), JourneyState::Idle, "{state:?}");
    }
}
