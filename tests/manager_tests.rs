//! Station Manager Tests
//!
//! Tests for lifecycle transitions, slot allocation and dial-following
//! relocation, driven through the full simulated band.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test manager_tests

use simradio_firmware::config::{PipelineConfig, SimConfig, MAX_STATIONS};
use simradio_firmware::meter::NullMeter;
use simradio_firmware::sim::SimRadio;
use simradio_firmware::station::Station;
use simradio_firmware::types::{DialFrequency, Lifecycle, Millis, SimError, StationId, TuningDirection};

const D: u32 = 7_002_000;

fn dial(hz: u32) -> DialFrequency {
    DialFrequency::from_hz(hz)
}

fn band(targets: &[u32]) -> SimRadio {
    let mut radio = SimRadio::new(SimConfig::default());
    for (i, &hz) in targets.iter().enumerate() {
        radio
            .add_station(Station::cw(f64::from(hz), 20, 0, i as u32 + 1))
            .unwrap();
    }
    radio
}

fn lifecycle(radio: &SimRadio, id: u8) -> Lifecycle {
    radio.station(StationId::new(id)).unwrap().lifecycle()
}

fn target(radio: &SimRadio, id: u8) -> f64 {
    radio.station(StationId::new(id)).unwrap().target_hz()
}

// =============================================================================
// Station Table Tests
// =============================================================================

#[test]
fn station_table_is_bounded() {
    let mut radio = SimRadio::default();
    for i in 0..MAX_STATIONS {
        let id = radio.add_station(Station::jammer(7_000_000.0, i as u32)).unwrap();
        assert_eq!(id.index(), i);
    }
    assert_eq!(
        radio.add_station(Station::jammer(7_000_000.0, 99)).unwrap_err(),
        SimError::StationTableFull
    );
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn setup_fills_slots_in_table_order() {
    let mut radio = band(&[D + 2500, D + 2000, D + 1500, D + 1000, D + 500, D]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);

    // Stations 4 and 5 are nearer the dial but come last in the table
    for id in 0..4 {
        assert_eq!(lifecycle(&radio, id), Lifecycle::Audible, "station {id}");
    }
    assert_eq!(lifecycle(&radio, 4), Lifecycle::Silent);
    assert_eq!(lifecycle(&radio, 5), Lifecycle::Silent);
    assert_eq!(
        radio.manager().assignments(),
        &[StationId::new(0), StationId::new(1), StationId::new(2), StationId::new(3)]
    );
    assert_eq!(radio.pool().available_count(), 0);
}

#[test]
fn far_stations_stay_dormant() {
    let mut radio = band(&[D, D + 50_000]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    assert_eq!(lifecycle(&radio, 0), Lifecycle::Audible);
    assert_eq!(lifecycle(&radio, 1), Lifecycle::Dormant);
    assert!(!radio.stations()[1].holds_generator());
}

#[test]
fn playing_stations_keep_their_slots() {
    let mut radio = band(&[D - 2500, D - 1500, D - 500, D + 500, D + 1500, D + 2500]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    assert_eq!(lifecycle(&radio, 0), Lifecycle::Audible);

    // Station 5 is now nearer than station 0, but 0 is already playing
    for t in 1..500 {
        radio.tick(Millis::new(t), dial(D + 1000), &mut NullMeter);
    }
    assert_eq!(lifecycle(&radio, 0), Lifecycle::Audible);
    assert_eq!(lifecycle(&radio, 5), Lifecycle::Silent);
}

#[test]
fn freed_slot_goes_to_waiting_station() {
    let mut radio = band(&[D - 4000, D, D + 500, D + 1000, D + 4500]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    assert_eq!(lifecycle(&radio, 4), Lifecycle::Silent);

    radio.tick(Millis::new(1), dial(D + 4300), &mut NullMeter);
    assert_eq!(lifecycle(&radio, 0), Lifecycle::Dormant);
    assert!(!radio.stations()[0].holds_generator());
    assert_eq!(lifecycle(&radio, 4), Lifecycle::Audible);
    assert!(radio.stations()[4].holds_generator());
}

#[test]
fn dual_station_takes_two_slots() {
    let mut radio = SimRadio::default();
    radio.add_station(Station::dual_pager(f64::from(D), 1)).unwrap();
    radio.add_station(Station::cw(f64::from(D + 500), 20, 0, 2)).unwrap();
    radio.add_station(Station::cw(f64::from(D + 1000), 20, 0, 3)).unwrap();
    radio.add_station(Station::cw(f64::from(D + 1500), 20, 0, 4)).unwrap();
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);

    let assignments = radio.manager().assignments();
    assert_eq!(assignments.len(), 4);
    assert_eq!(assignments.iter().filter(|&&id| id == StationId::new(0)).count(), 2);
    assert_eq!(lifecycle(&radio, 3), Lifecycle::Silent);
}

#[test]
fn no_generator_held_outside_audible() {
    let mut radio = band(&[D - 2500, D - 1500, D - 500, D + 500, D + 1500, D + 2500, D + 20_000]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    for t in 1..20_000 {
        let hz = D + (t / 10) as u32;
        radio.tick(Millis::new(t), dial(hz), &mut NullMeter);
        for station in radio.stations() {
            if station.holds_generator() {
                assert_eq!(station.lifecycle(), Lifecycle::Audible);
            }
        }
        assert!(radio.manager().assignments().len() <= 4);
    }
}

// =============================================================================
// Interrupt / Lookahead Tests
// =============================================================================

#[test]
fn interrupt_rules_by_lifecycle() {
    let mut radio = band(&[D, D + 6000]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    let config = PipelineConfig::default();
    let manager = radio.manager();

    // Audible, 6 kHz away: beyond the audible range
    let near = &radio.stations()[0];
    assert!(!manager.can_interrupt(near, dial(D), &config));
    assert!(manager.can_interrupt(near, dial(D + 6000), &config));

    // Station 1 is in lookahead and got a slot
    let other = &radio.stations()[1];
    assert_eq!(other.lifecycle(), Lifecycle::Audible);
    assert!(manager.can_interrupt(other, dial(D), &config));
}

#[test]
fn lookahead_halved_behind_travel() {
    let mut radio = band(&[D - 6000, D + 6000]);
    radio.set_pipelining(true);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    radio.tick(Millis::new(10), dial(D + 200), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Up);

    let config = PipelineConfig::default();
    let manager = radio.manager();
    let behind = manager.effective_lookahead(&radio.stations()[0], dial(D + 200), &config);
    let ahead = manager.effective_lookahead(&radio.stations()[1], dial(D + 200), &config);
    assert!((behind - 4000.0).abs() < f64::EPSILON);
    assert!((ahead - 8000.0).abs() < f64::EPSILON);
    // 6200 Hz behind with a 4 kHz lookahead
    assert_eq!(lifecycle(&radio, 0), Lifecycle::Dormant);
}

// =============================================================================
// Pipelining Tests
// =============================================================================

#[test]
fn relocation_moves_far_stations_ahead() {
    let mut radio = band(&[D, D + 1000, 7_200_000, 7_300_000, 7_400_000]);
    radio.set_pipelining(true);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    assert_eq!(lifecycle(&radio, 4), Lifecycle::Dormant);

    let tuned = D + 3500;
    radio.tick(Millis::new(10), dial(tuned), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Up);
    assert_eq!(radio.manager().center_hz(), Some(tuned));

    // Farthest first, stacked above the dial
    assert!((target(&radio, 4) - f64::from(tuned + 2000)).abs() < f64::EPSILON);
    assert!((target(&radio, 3) - f64::from(tuned + 3000)).abs() < f64::EPSILON);
    assert!((target(&radio, 2) - f64::from(tuned + 4000)).abs() < f64::EPSILON);
    // Stations inside the lookahead are never moved
    assert!((target(&radio, 0) - f64::from(D)).abs() < f64::EPSILON);
    assert!((target(&radio, 1) - f64::from(D + 1000)).abs() < f64::EPSILON);
    // The two free slots go to the relocated stations in table order
    assert_eq!(lifecycle(&radio, 2), Lifecycle::Audible);
    assert_eq!(lifecycle(&radio, 3), Lifecycle::Audible);
    assert_eq!(lifecycle(&radio, 4), Lifecycle::Silent);
}

#[test]
fn relocation_down_respects_floor() {
    let mut radio = band(&[106_000, 7_000_000, 7_100_000]);
    radio.set_pipelining(true);
    radio.setup(dial(110_000), Millis::ZERO, &mut NullMeter);

    radio.tick(Millis::new(10), dial(106_000), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Down);
    assert!((target(&radio, 2) - 100_300.0).abs() < f64::EPSILON);
    assert!((target(&radio, 1) - 100_000.0).abs() < f64::EPSILON);
    assert!((target(&radio, 0) - 106_000.0).abs() < f64::EPSILON);
}

#[test]
fn relocation_is_rate_limited() {
    let mut radio = band(&[D, 7_200_000, 7_300_000]);
    radio.set_pipelining(true);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);

    radio.tick(Millis::new(10), dial(D + 3500), &mut NullMeter);
    assert_eq!(radio.manager().center_hz(), Some(D + 3500));

    radio.tick(Millis::new(100), dial(D + 7000), &mut NullMeter);
    assert_eq!(radio.manager().center_hz(), Some(D + 3500));

    radio.tick(Millis::new(300), dial(D + 7000), &mut NullMeter);
    assert_eq!(radio.manager().center_hz(), Some(D + 7000));
}

#[test]
fn no_relocation_once_tuning_stops() {
    let mut radio = band(&[D, 7_200_000, 7_300_000]);
    radio.set_pipelining(true);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);

    radio.tick(Millis::new(10), dial(D + 3500), &mut NullMeter);
    // Second move lands inside the rate limit, so it is not acted on yet
    radio.tick(Millis::new(100), dial(D + 7000), &mut NullMeter);
    assert_eq!(radio.manager().center_hz(), Some(D + 3500));
    let before: Vec<f64> = radio.stations().iter().map(Station::target_hz).collect();

    // The knob rests past the settle timeout; the pending shift is never applied
    radio.tick(Millis::new(5200), dial(D + 7000), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Stopped);
    radio.tick(Millis::new(5500), dial(D + 7000), &mut NullMeter);

    let after: Vec<f64> = radio.stations().iter().map(Station::target_hz).collect();
    assert_eq!(before, after);
    assert_eq!(radio.manager().center_hz(), Some(D + 3500));
}

#[test]
fn no_relocation_without_pipelining() {
    let mut radio = band(&[D, 7_200_000]);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);
    radio.tick(Millis::new(10), dial(D + 3500), &mut NullMeter);
    assert!((target(&radio, 1) - 7_200_000.0).abs() < f64::EPSILON);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Stopped);
}

#[test]
fn direction_settles_to_stopped() {
    let mut radio = band(&[D]);
    radio.set_pipelining(true);
    radio.setup(dial(D), Millis::ZERO, &mut NullMeter);

    radio.tick(Millis::new(10), dial(D + 500), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Up);
    radio.tick(Millis::new(2000), dial(D + 550), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Up);
    radio.tick(Millis::new(5010), dial(D + 550), &mut NullMeter);
    assert_eq!(radio.manager().tuning_direction(), TuningDirection::Stopped);
}
