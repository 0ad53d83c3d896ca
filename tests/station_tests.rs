//! Station Tests
//!
//! Tests for the shared station lifecycle and the per-kind policies.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test station_tests

use simradio_firmware::config::{SimConfig, SILENT_HZ};
use simradio_firmware::generator::GeneratorPool;
use simradio_firmware::meter::SignalMeter;
use simradio_firmware::station::{
    NumbersPhase, PagerStation, Station, StationContext, StationKind, TeleprinterPhase,
};
use simradio_firmware::types::{DialFrequency, Lifecycle, Millis, SimError};

#[derive(Default)]
struct RecordingMeter {
    pulses: Vec<i16>,
}

impl SignalMeter for RecordingMeter {
    fn add_charge(&mut self, amount: i16) {
        self.pulses.push(amount);
    }
}

struct Rig {
    pool: GeneratorPool,
    meter: RecordingMeter,
    config: SimConfig,
}

impl Rig {
    fn new(generators: usize) -> Self {
        Self {
            pool: GeneratorPool::new(generators),
            meter: RecordingMeter::default(),
            config: SimConfig::default(),
        }
    }

    fn ctx(&mut self) -> StationContext<'_> {
        StationContext {
            pool: &mut self.pool,
            meter: &mut self.meter,
            config: &self.config,
        }
    }

    /// Output frequency of the station's first generator
    fn output(&self, station: &Station) -> Option<f32> {
        let slot = station.generator_slots().next()?;
        self.pool.generator(slot).map(|g| g.output())
    }

    /// Step `station` every millisecond in `from..to`, stopping when `until` holds
    fn run_until(
        &mut self,
        station: &mut Station,
        from: u32,
        to: u32,
        mut until: impl FnMut(&Station) -> bool,
    ) -> Option<u32> {
        for t in from..to {
            station.step(&mut self.ctx(), Millis::new(t));
            if until(station) {
                return Some(t);
            }
        }
        None
    }
}

const DIAL: DialFrequency = DialFrequency::from_hz(7_002_000);

/// Station at the dial, audible, already told where the dial is
fn on_air(rig: &mut Rig, mut station: Station) -> Station {
    station.set_lifecycle(Lifecycle::Audible, &mut rig.pool);
    station.update(&mut rig.ctx(), DIAL);
    station.begin(&mut rig.ctx(), Millis::ZERO).expect("generator available");
    station
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn begin_requires_audible() {
    let mut rig = Rig::new(4);
    let mut station = Station::cw(7_002_000.0, 20, 0, 1);
    assert_eq!(station.begin(&mut rig.ctx(), Millis::ZERO), Err(SimError::NotAssigned));
    assert!(!station.holds_generator());
    assert_eq!(rig.pool.available_count(), 4);
}

#[test]
fn begin_is_idempotent() {
    let mut rig = Rig::new(4);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    let slot = station.generator_slots().next();
    assert!(station.begin(&mut rig.ctx(), Millis::new(5)).is_ok());
    assert_eq!(station.generator_slots().next(), slot);
    assert_eq!(rig.pool.available_count(), 3);
}

#[test]
fn begin_reports_exhaustion() {
    let mut rig = Rig::new(1);
    let _first = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    let mut second = Station::cw(7_002_500.0, 20, 0, 2);
    second.set_lifecycle(Lifecycle::Audible, &mut rig.pool);
    assert_eq!(second.begin(&mut rig.ctx(), Millis::ZERO), Err(SimError::PoolExhausted));
    assert!(!second.holds_generator());
}

#[test]
fn end_silences_and_releases() {
    let mut rig = Rig::new(2);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    station.step(&mut rig.ctx(), Millis::ZERO);
    let slot = station.generator_slots().next().unwrap();

    station.end(&mut rig.pool);
    assert!(!station.holds_generator());
    assert_eq!(rig.pool.available_count(), 2);
    assert!(rig.pool.generator(slot).unwrap().is_silent());
}

#[test]
fn leaving_audible_releases() {
    let mut rig = Rig::new(2);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    station.set_lifecycle(Lifecycle::Silent, &mut rig.pool);
    assert!(!station.holds_generator());
    assert_eq!(station.lifecycle(), Lifecycle::Silent);
}

#[test]
fn reinitialize_moves_and_resets() {
    let mut rig = Rig::new(2);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    station.reinitialize(&mut rig.pool, 7_010_000.0);
    assert!(!station.holds_generator());
    assert_eq!(station.lifecycle(), Lifecycle::Active);
    assert!((station.target_hz() - 7_010_000.0).abs() < f64::EPSILON);
    assert!(!station.is_enabled());
    assert!(!station.carrier_on());
}

// =============================================================================
// Audio Tests
// =============================================================================

#[test]
fn cw_keys_beat_note() {
    let mut rig = Rig::new(4);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    assert!((station.audio_hz() - 700.0).abs() < 0.01);
    assert_eq!(rig.output(&station), Some(SILENT_HZ));

    // First element of "CQ" is a dah: 150 ms at 20 WPM
    station.step(&mut rig.ctx(), Millis::ZERO);
    assert!(station.carrier_on());
    assert_eq!(rig.output(&station), Some(700.0));
    // Zero beat: lock pulse
    assert_eq!(rig.meter.pulses.last(), Some(&-1));

    station.step(&mut rig.ctx(), Millis::new(150));
    assert!(!station.carrier_on());
    assert_eq!(rig.output(&station), Some(SILENT_HZ));
}

#[test]
fn dial_change_retunes() {
    let mut rig = Rig::new(4);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    station.step(&mut rig.ctx(), Millis::ZERO);
    station.update(&mut rig.ctx(), DialFrequency::from_hz(7_002_300));
    assert!((station.audio_hz() - 1000.0).abs() < 0.01);
    assert_eq!(rig.output(&station), Some(1000.0));
}

#[test]
fn out_of_window_goes_quiet_but_keeps_generator() {
    let mut rig = Rig::new(4);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 20, 0, 1));
    station.step(&mut rig.ctx(), Millis::ZERO);

    station.update(&mut rig.ctx(), DialFrequency::from_hz(7_012_000));
    assert!(!station.is_enabled());
    assert!(station.holds_generator());
    assert_eq!(rig.output(&station), Some(SILENT_HZ));

    station.update(&mut rig.ctx(), DIAL);
    assert!(station.is_enabled());
    assert_eq!(rig.output(&station), Some(700.0));
}

#[test]
fn no_charge_without_generator() {
    let mut rig = Rig::new(4);
    let mut station = Station::cw(7_002_000.0, 20, 0, 1);
    station.update(&mut rig.ctx(), DIAL);
    for t in 0..2000 {
        station.step(&mut rig.ctx(), Millis::new(t));
    }
    assert!(rig.meter.pulses.is_empty());
}

// =============================================================================
// Kind Policy Tests
// =============================================================================

#[test]
fn cw_waits_then_calls_again() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 25, 0, 7));

    let released = rig
        .run_until(&mut station, 0, 60_000, |s| !s.holds_generator())
        .expect("message finishes");
    let resumed = rig
        .run_until(&mut station, released + 1, released + 10_000, Station::holds_generator)
        .expect("calls again");
    assert_eq!(resumed - released, 4000);
}

#[test]
fn cw_retries_when_pool_is_taken() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::cw(7_002_000.0, 25, 0, 7));
    let released = rig
        .run_until(&mut station, 0, 60_000, |s| !s.holds_generator())
        .expect("message finishes");

    // Someone else grabs the only generator during the pause
    let mut other = Station::jammer(7_003_000.0, 3);
    other.set_lifecycle(Lifecycle::Audible, &mut rig.pool);
    other.begin(&mut rig.ctx(), Millis::new(released)).unwrap();

    let resumed = rig.run_until(&mut station, released + 1, released + 6000, Station::holds_generator);
    assert_eq!(resumed, None);

    other.end(&mut rig.pool);
    let resumed = rig.run_until(&mut station, released + 6000, released + 8000, Station::holds_generator);
    assert!(resumed.is_some());
}

#[test]
fn numbers_counts_interval_signals() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::numbers(7_002_000.0, 18, 4));
    for t in 0..10_000 {
        station.step(&mut rig.ctx(), Millis::new(t));
    }
    let StationKind::Numbers(numbers) = station.kind() else {
        panic!("numbers station");
    };
    assert_eq!(numbers.phase(), NumbersPhase::IntervalSignal);
    assert!(numbers.sent() >= 1);
    assert!(station.holds_generator());
}

#[test]
fn teleprinter_leads_with_mark() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::teleprinter(7_002_000.0, 5));
    let StationKind::Teleprinter(rtty) = station.kind() else {
        panic!("rtty station");
    };
    assert_eq!(rtty.phase(), TeleprinterPhase::LeadMark);
    assert!(station.carrier_on());
    // Mark is the upper tone
    assert_eq!(rig.output(&station), Some(870.0));

    for t in 0..3001 {
        station.step(&mut rig.ctx(), Millis::new(t));
    }
    let StationKind::Teleprinter(rtty) = station.kind() else {
        panic!("rtty station");
    };
    assert_eq!(rtty.phase(), TeleprinterPhase::Sending);
}

#[test]
fn pager_releases_between_pages() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::pager(7_002_000.0, 11));
    station.step(&mut rig.ctx(), Millis::ZERO);
    assert!(station.carrier_on());
    let StationKind::Pager(pager) = station.kind() else {
        panic!("pager station");
    };
    let tone_a = pager.tones(0).unwrap().a_hz;
    assert_eq!(rig.output(&station), Some(700.0 + tone_a));

    let released = rig
        .run_until(&mut station, 1, 5000, |s| !s.holds_generator())
        .expect("released after tone B");
    assert_eq!(released, 4000);
    assert_eq!(rig.pool.available_count(), 1);

    let resumed = rig
        .run_until(&mut station, 4001, 12_000, Station::holds_generator)
        .expect("next page");
    assert!((7000..=10_000).contains(&resumed));
}

#[test]
fn dual_pager_needs_two_generators() {
    let mut rig = Rig::new(1);
    let mut station = Station::dual_pager(7_002_000.0, 12);
    assert_eq!(station.generators_needed(), 2);
    station.set_lifecycle(Lifecycle::Audible, &mut rig.pool);
    assert_eq!(station.begin(&mut rig.ctx(), Millis::ZERO), Err(SimError::PoolExhausted));
    assert_eq!(rig.pool.available_count(), 1);

    let mut rig = Rig::new(2);
    let station = on_air(&mut rig, Station::dual_pager(7_002_000.0, 12));
    assert_eq!(station.generator_slots().count(), 2);
    let StationKind::Pager(pager) = station.kind() else {
        panic!("pager station");
    };
    assert!(PagerStation::is_dual(pager));
}

#[test]
fn jammer_holds_generator() {
    let mut rig = Rig::new(1);
    let mut station = on_air(&mut rig, Station::jammer(7_002_000.0, 21));
    for t in 0..30_000 {
        station.step(&mut rig.ctx(), Millis::new(t));
        assert!(station.holds_generator());
    }
}
