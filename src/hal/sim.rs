//! Host side stand-in for the board, recording everything the engine does
use {
    super::{Hardware, IrqSources, PinAction, PwmSetting, SampleTimer},
    crate::Rng,
};

/// Simulated board.
///
/// DMA is modeled as a current and a next buffer; [`SimHardware::step_dma`] plays one
/// sample and reports when a buffer completed. Time is counted in ticks of the 42 MHz timer
/// clock; [`SimHardware::next_due`] tells which timer fires next.
#[derive(Default, Debug)]
pub struct SimHardware {
    /// Divisor last programmed into each [`SampleTimer`]
    pub timers: [Option<u32>; 4],
    /// Enabled interrupt sources
    pub irqs: IrqSources,
    dma_current: Vec<u16>,
    dma_next: Vec<u16>,
    dma_pos: usize,
    /// Whether DMA streaming is active
    pub dma_running: bool,
    /// Samples written to the DAC, directly or through DMA
    pub dac: Vec<u16>,
    /// Current square wave pin level
    pub square: bool,
    /// Pin history
    pub pin_events: Vec<PinAction>,
    /// Active PWM programming
    pub pwm: Option<PwmSetting>,
    /// Total busy wait cycles
    pub spun: u64,
    rng: Rng,
    /// Limit on recorded DAC samples and pin events. Zero records everything.
    pub record_limit: usize,
    /// Timer clock counts elapsed
    pub clock: u64,
    /// Level on the modulation input
    pub analog: u16,
    due: [u64; 4],
}

impl SimHardware {
    /// Board with a seeded random source
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            ..Self::default()
        }
    }
    /// Play one DMA sample.
    ///
    /// Returns the sample and whether it finished the current buffer (the completion
    /// interrupt should be dispatched). `None` when nothing is streaming.
    pub fn step_dma(&mut self) -> Option<(u16, bool)> {
        if !self.dma_running {
            return None;
        }
        let sample = *self.dma_current.get(self.dma_pos)?;
        self.record_dac(sample);
        self.dma_pos += 1;
        let done = self.dma_pos >= self.dma_current.len();
        if done {
            self.dma_current = std::mem::take(&mut self.dma_next);
            self.dma_pos = 0;
        }
        Some((sample, done))
    }
    /// Buffers as currently armed: (streaming, queued)
    #[must_use]
    pub fn dma_buffers(&self) -> (&[u16], &[u16]) {
        (&self.dma_current, &self.dma_next)
    }
    /// Forget recorded samples and pin events
    pub fn clear_records(&mut self) {
        self.dac.clear();
        self.pin_events.clear();
    }
    /// Timer divisor of `timer`
    #[must_use]
    pub const fn timer(&self, timer: SampleTimer) -> Option<u32> {
        self.timers[timer as usize]
    }
    /// Whether `timer` is counting and something listens to it
    #[must_use]
    pub const fn running(&self, timer: SampleTimer) -> bool {
        if self.timers[timer as usize].is_none() {
            return false;
        }
        match timer {
            SampleTimer::Dma => self.dma_running,
            SampleTimer::Slow => self.irqs.contains(IrqSources::SLOW_TICK),
            SampleTimer::Noise => self.irqs.contains(IrqSources::NOISE_TICK),
            SampleTimer::Unsynced => self.irqs.contains(IrqSources::UNSYNCED_TICK),
        }
    }
    /// The running timer that fires first, and when
    #[must_use]
    pub fn next_due(&self) -> Option<(SampleTimer, u64)> {
        SampleTimer::ALL
            .into_iter()
            .filter(|&t| self.running(t))
            .map(|t| (t, self.due[t as usize].max(self.clock)))
            .min_by_key(|&(_, due)| due)
    }
    /// Advance the clock to `timer` firing and schedule its next period
    pub fn fire(&mut self, timer: SampleTimer, at: u64) {
        self.clock = at;
        let period = self.timers[timer as usize].unwrap_or(1).max(1);
        self.due[timer as usize] = at + u64::from(period);
    }
    fn full(&self, len: usize) -> bool {
        self.record_limit != 0 && len >= self.record_limit
    }
    fn record_dac(&mut self, value: u16) {
        if !self.full(self.dac.len()) {
            self.dac.push(value);
        }
    }
    fn record_pin(&mut self, ev: PinAction) {
        if !self.full(self.pin_events.len()) {
            self.pin_events.push(ev);
        }
    }
}

impl Hardware for SimHardware {
    fn program_timer(&mut self, timer: SampleTimer, divisor: u32) {
        self.timers[timer as usize] = Some(divisor);
        self.due[timer as usize] = self.clock + u64::from(divisor.max(1));
    }
    fn enable_irq(&mut self, irqs: IrqSources) {
        self.irqs.insert(irqs);
    }
    fn disable_irq(&mut self, irqs: IrqSources) {
        self.irqs.remove(irqs);
    }
    fn arm_dma(&mut self, current: &[u16], next: &[u16]) {
        self.dma_current = current.to_vec();
        self.dma_next = next.to_vec();
        self.dma_pos = 0;
        self.dma_running = true;
    }
    fn queue_dma(&mut self, next: &[u16]) {
        self.dma_next = next.to_vec();
    }
    fn stop_dma(&mut self) {
        self.dma_running = false;
        self.dma_current.clear();
        self.dma_next.clear();
        self.dma_pos = 0;
    }
    fn write_dac(&mut self, value: u16) {
        self.record_dac(value);
    }
    fn set_square(&mut self, high: bool) {
        self.square = high;
        self.record_pin(PinAction::Level(high));
    }
    fn pulse_square(&mut self, level: bool) {
        self.record_pin(PinAction::Pulse(level));
    }
    fn configure_pwm(&mut self, setting: PwmSetting) {
        self.pwm = Some(setting);
    }
    fn disable_pwm(&mut self) {
        self.pwm = None;
    }
    fn read_random(&mut self) -> u32 {
        self.rng.next_u32()
    }
    fn read_analog(&mut self) -> u16 {
        self.analog
    }
    fn spin(&mut self, cycles: u32) {
        self.spun += u64::from(cycles);
    }
}
