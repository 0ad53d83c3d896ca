//! Simulated Stations
//!
//! A station couples a keying machine to a target frequency and drives one
//! or two leased generators so the listener hears it at
//! `dial - target + audio offset`. Every kind shares the same lifecycle:
//!
//! ```text
//! begin ──► step/update ... ──► end
//!   │           │
//!   │           └─ kind policy: wait, release, re-acquire, drift
//!   └─ acquire generator(s), silence them, start the machine
//! ```
//!
//! Generators are only held while the manager has marked the station
//! [`Lifecycle::Audible`]; everything else keeps timing but stays dark.

pub mod content;
pub mod cw;
pub mod jammer;
pub mod numbers;
pub mod pager;
pub mod teleprinter;

pub use cw::CwStation;
pub use jammer::JammerStation;
pub use numbers::{NumbersPhase, NumbersStation};
pub use pager::{PagerStation, TonePair};
pub use teleprinter::{TeleprinterPhase, TeleprinterStation};

use crate::config::SimConfig;
use crate::generator::{Generator, GeneratorLease, GeneratorPool};
use crate::meter::{carrier_charge, SignalMeter};
use crate::rng::Rng;
use crate::types::{DialFrequency, Lifecycle, Millis, SimError, StationId};
use heapless::Vec;

/// Shared collaborators handed to a station for one call
pub struct StationContext<'a> {
    /// Generator pool
    pub pool: &'a mut GeneratorPool,
    /// Signal-strength meter
    pub meter: &'a mut dyn SignalMeter,
    /// Runtime configuration
    pub config: &'a SimConfig,
}

/// State common to every station kind
#[derive(Debug)]
pub struct StationCore {
    id: StationId,
    target_hz: f64,
    audio_hz: f32,
    dial: DialFrequency,
    enabled: bool,
    carrier: bool,
    lifecycle: Lifecycle,
    in_service: bool,
    leases: Vec<GeneratorLease, 2>,
    rng: Rng,
}

impl StationCore {
    fn new(target_hz: f64, rng: Rng) -> Self {
        Self {
            id: StationId::default(),
            target_hz,
            audio_hz: 0.0,
            dial: DialFrequency::default(),
            enabled: false,
            carrier: false,
            lifecycle: Lifecycle::Dormant,
            in_service: false,
            leases: Vec::new(),
            rng,
        }
    }

    /// Table index
    #[must_use]
    pub const fn id(&self) -> StationId {
        self.id
    }

    /// Frequency the station transmits on (Hz)
    #[must_use]
    pub const fn target_hz(&self) -> f64 {
        self.target_hz
    }

    /// Beat note heard at the current dial (Hz)
    #[must_use]
    pub const fn audio_hz(&self) -> f32 {
        self.audio_hz
    }

    /// Carrier is keyed
    #[must_use]
    pub const fn carrier(&self) -> bool {
        self.carrier
    }

    /// Holding at least one generator
    #[must_use]
    pub fn holds_generator(&self) -> bool {
        !self.leases.is_empty()
    }

    pub(crate) fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub(crate) fn set_carrier(&mut self, on: bool) {
        self.carrier = on;
    }

    pub(crate) fn shift_target(&mut self, hz: f64) {
        self.target_hz += hz;
    }

    /// Lease `count` generators (all or nothing) and silence them
    pub(crate) fn acquire(&mut self, pool: &mut GeneratorPool, count: usize) -> Result<(), SimError> {
        if self.holds_generator() {
            return Ok(());
        }
        if !self.lifecycle.permits_generator() {
            return Err(SimError::NotAssigned);
        }
        if count >= 2 {
            let (first, second) = pool.acquire_pair(self.id).ok_or(SimError::PoolExhausted)?;
            let _ = self.leases.push(first);
            let _ = self.leases.push(second);
        } else {
            let lease = pool.acquire(self.id).ok_or(SimError::PoolExhausted)?;
            let _ = self.leases.push(lease);
        }
        self.silence(pool);
        Ok(())
    }

    /// Silence and return every held generator
    pub(crate) fn release(&mut self, pool: &mut GeneratorPool) {
        self.silence(pool);
        while let Some(lease) = self.leases.pop() {
            pool.release(lease, self.id);
        }
    }

    /// Write the silent frequency to every held generator
    pub(crate) fn silence(&self, pool: &mut GeneratorPool) {
        for lease in &self.leases {
            if let Some(gen) = pool.generator_mut(lease) {
                gen.silence();
            }
        }
    }

    /// The `n`th held generator
    pub(crate) fn generator<'p>(&self, pool: &'p mut GeneratorPool, n: usize) -> Option<&'p mut Generator> {
        self.leases.get(n).and_then(|lease| pool.generator_mut(lease))
    }

    /// Recompute the beat note from the last-known dial
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn retune(&mut self, config: &SimConfig) {
        let audio = self.dial.as_f64() - self.target_hz + f64::from(config.audio_offset_hz);
        self.audio_hz = audio as f32;
    }

    /// Track the audible window; silences the generators on the way out
    fn check_bounds(&mut self, pool: &mut GeneratorPool, config: &SimConfig) -> bool {
        if config.is_audible(self.audio_hz) {
            self.enabled = true;
            return true;
        }
        if self.enabled {
            self.enabled = false;
            self.silence(pool);
        }
        false
    }

    /// Report a carrier pulse to the meter while audible
    pub(crate) fn send_charge(&self, ctx: &mut StationContext<'_>) {
        if !self.enabled || !self.holds_generator() {
            return;
        }
        let charge = carrier_charge(self.target_hz, self.dial, ctx.config);
        if charge != 0 {
            ctx.meter.add_charge(charge);
        }
    }
}

/// What each station kind supplies to the shared lifecycle
pub(crate) trait Behavior {
    /// Generators this kind drives at once
    fn generators_needed(&self) -> usize {
        1
    }

    /// Called right after the generators were acquired
    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis);

    /// Advance the keying machine and apply the kind's post-message policy
    fn step(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis);

    /// Write the current tones to the held generators
    fn program(&self, core: &StationCore, pool: &mut GeneratorPool);

    /// Fresh operator content after a relocation
    fn randomize(&mut self, core: &mut StationCore);
}

/// Push the station's state to its generators if it is audible
pub(crate) fn realize<B: Behavior + ?Sized>(
    core: &mut StationCore,
    behavior: &B,
    pool: &mut GeneratorPool,
    config: &SimConfig,
) {
    if !core.holds_generator() || !core.check_bounds(pool, config) {
        return;
    }
    behavior.program(core, pool);
}

/// Log and drop a message-buffer truncation
pub(crate) fn note_truncation(core: &StationCore, result: Result<(), SimError>) {
    if let Err(e) = result {
        warn!("{}: {}", core.id(), e);
    }
}

/// Per-kind state
#[derive(Debug)]
pub enum StationKind {
    /// CW operator calling CQ
    Cw(CwStation),
    /// Numbers station
    Numbers(NumbersStation),
    /// RTTY station
    Teleprinter(TeleprinterStation),
    /// Two-tone pager (one or two generators)
    Pager(PagerStation),
    /// Drifting jammer
    Jammer(JammerStation),
}

impl StationKind {
    fn behavior(&self) -> &dyn Behavior {
        match self {
            Self::Cw(s) => s,
            Self::Numbers(s) => s,
            Self::Teleprinter(s) => s,
            Self::Pager(s) => s,
            Self::Jammer(s) => s,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            Self::Cw(s) => s,
            Self::Numbers(s) => s,
            Self::Teleprinter(s) => s,
            Self::Pager(s) => s,
            Self::Jammer(s) => s,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cw(_) => "cw",
            Self::Numbers(_) => "numbers",
            Self::Teleprinter(_) => "rtty",
            Self::Pager(_) => "pager",
            Self::Jammer(_) => "jammer",
        }
    }
}

/// One simulated transmitter
#[derive(Debug)]
pub struct Station {
    core: StationCore,
    kind: StationKind,
}

impl Station {
    fn with_kind(target_hz: f64, rng: Rng, kind: StationKind) -> Self {
        Self {
            core: StationCore::new(target_hz, rng),
            kind,
        }
    }

    /// CW operator at `wpm` with the given fist quality (0 = perfect)
    #[must_use]
    pub fn cw(target_hz: f64, wpm: u8, fist: u8, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Cw(CwStation::new(wpm, fist, &mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    /// Numbers station sending at `wpm`
    #[must_use]
    pub fn numbers(target_hz: f64, wpm: u8, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Numbers(NumbersStation::new(wpm, &mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    /// RTTY station
    #[must_use]
    pub fn teleprinter(target_hz: f64, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Teleprinter(TeleprinterStation::new(&mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    /// Single-generator pager
    #[must_use]
    pub fn pager(target_hz: f64, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Pager(PagerStation::new(false, &mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    /// Pager that plays two independent tone pairs on two generators
    #[must_use]
    pub fn dual_pager(target_hz: f64, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Pager(PagerStation::new(true, &mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    /// Jammer
    #[must_use]
    pub fn jammer(target_hz: f64, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let kind = StationKind::Jammer(JammerStation::new(&mut rng));
        Self::with_kind(target_hz, rng, kind)
    }

    pub(crate) fn set_id(&mut self, id: StationId) {
        self.core.id = id;
    }

    /// Table index
    #[must_use]
    pub const fn id(&self) -> StationId {
        self.core.id
    }

    /// Shared state
    #[must_use]
    pub const fn core(&self) -> &StationCore {
        &self.core
    }

    /// Kind-specific state
    #[must_use]
    pub const fn kind(&self) -> &StationKind {
        &self.kind
    }

    /// Transmit frequency (Hz)
    #[must_use]
    pub const fn target_hz(&self) -> f64 {
        self.core.target_hz
    }

    /// Beat note at the last-known dial (Hz)
    #[must_use]
    pub const fn audio_hz(&self) -> f32 {
        self.core.audio_hz
    }

    /// Beat note is inside the audible window
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.core.enabled
    }

    /// Carrier keyed
    #[must_use]
    pub const fn carrier_on(&self) -> bool {
        self.core.carrier
    }

    /// Lifecycle as last set by the manager
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    /// Taking part in dial-following management
    #[must_use]
    pub const fn is_in_service(&self) -> bool {
        self.core.in_service
    }

    /// Include or exclude the station from lifecycle management
    pub fn set_in_service(&mut self, in_service: bool) {
        self.core.in_service = in_service;
    }

    /// Holding at least one generator
    #[must_use]
    pub fn holds_generator(&self) -> bool {
        self.core.holds_generator()
    }

    /// Pool slots currently leased
    pub fn generator_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.core.leases.iter().map(GeneratorLease::slot)
    }

    /// Generators the station drives while audible
    #[must_use]
    pub fn generators_needed(&self) -> usize {
        self.kind.behavior().generators_needed()
    }

    /// Acquire generators and start transmitting
    ///
    /// Idempotent: succeeds immediately if a generator is already held.
    ///
    /// # Errors
    ///
    /// [`SimError::NotAssigned`] unless the station is audible;
    /// [`SimError::PoolExhausted`] if no generator is free.
    pub fn begin(&mut self, ctx: &mut StationContext<'_>, now: Millis) -> Result<(), SimError> {
        if self.core.holds_generator() {
            return Ok(());
        }
        let needed = self.generators_needed();
        self.core.acquire(ctx.pool, needed)?;
        debug!("{} {} on air", self.core.id, self.kind.name());
        self.kind.behavior_mut().start(&mut self.core, ctx, now);
        Ok(())
    }

    /// Advance the station to `now`; always true
    pub fn step(&mut self, ctx: &mut StationContext<'_>, now: Millis) -> bool {
        self.kind.behavior_mut().step(&mut self.core, ctx, now);
        true
    }

    /// Follow a dial change
    pub fn update(&mut self, ctx: &mut StationContext<'_>, dial: DialFrequency) {
        self.core.dial = dial;
        self.core.retune(ctx.config);
        realize(&mut self.core, self.kind.behavior(), ctx.pool, ctx.config);
    }

    /// Silence and release every held generator
    pub fn end(&mut self, pool: &mut GeneratorPool) {
        if self.core.holds_generator() {
            debug!("{} off air", self.core.id);
        }
        self.core.release(pool);
    }

    /// Rewrite the held generators in full on the next drain
    pub fn force_refresh(&mut self, pool: &mut GeneratorPool) {
        for lease in &self.core.leases {
            if let Some(gen) = pool.generator_mut(lease) {
                gen.force_refresh();
            }
        }
    }

    /// Move the station to a new frequency and make it eligible again
    pub fn reinitialize(&mut self, pool: &mut GeneratorPool, target_hz: f64) {
        self.end(pool);
        self.core.target_hz = target_hz;
        self.core.audio_hz = 0.0;
        self.core.enabled = false;
        self.core.carrier = false;
        self.core.lifecycle = Lifecycle::Active;
    }

    /// Give the station a new operator
    pub fn randomize(&mut self) {
        self.kind.behavior_mut().randomize(&mut self.core);
    }

    /// Change lifecycle; leaving audible or going dormant releases generators
    pub fn set_lifecycle(&mut self, next: Lifecycle, pool: &mut GeneratorPool) {
        let current = self.core.lifecycle;
        if current == next {
            return;
        }
        if current == Lifecycle::Audible || next == Lifecycle::Dormant {
            self.end(pool);
        }
        trace!("{} {} -> {}", self.core.id, current, next);
        self.core.lifecycle = next;
    }
}
