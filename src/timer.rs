//! Blocking microsecond delay built on a hardware countdown timer.
//!
//! The timer is clocked at 1 MHz (one tick per microsecond) and used in
//! one-shot fashion: the auto-reload register is loaded with the requested
//! duration, the update flag is cleared, the counter is started and the flag
//! is polled until it is raised again. No interrupts are involved.

use embedded_hal::delay::DelayNs;

/// Shortest delay the countdown can represent, in microseconds.
///
/// A reload value of zero never produces an update event, so shorter
/// requests are clamped to this value.
pub const MIN_DELAY_US: u32 = 2;

/// Register-level access to a free-running countdown timer ticking at 1 MHz.
pub trait Countdown {
    /// Largest value the auto-reload register accepts.
    const MAX_RELOAD: u32 = u16::MAX as u32;

    /// Loads the auto-reload register and re-initialises the counter.
    fn load(&mut self, reload: u32);

    /// Clears the update (expiry) flag.
    fn clear_expired(&mut self);

    /// Enables the counter.
    fn start(&mut self);

    /// Returns `true` once the counter has wrapped since the flag was cleared.
    fn is_expired(&mut self) -> bool;
}

/// Microsecond delay provider over a [`Countdown`].
///
/// Only one delay may be in flight at a time: the wrapper owns the counter
/// and every operation takes `&mut self`.
pub struct MicrosecondTimer<C> {
    counter: C,
}

impl<C: Countdown> MicrosecondTimer<C> {
    /// Creates a new delay provider. The counter must already be clocked
    /// at 1 MHz.
    pub fn new(counter: C) -> Self {
        MicrosecondTimer { counter }
    }

    /// Busy-waits for at least `us` microseconds.
    ///
    /// Requests shorter than [`MIN_DELAY_US`] are clamped up to it, requests
    /// longer than one counter period are split into several countdowns.
    pub fn delay(&mut self, us: u32) {
        let period = C::MAX_RELOAD.saturating_add(1);
        let mut remaining = us;
        loop {
            let chunk = remaining.min(period);
            self.countdown(chunk);
            remaining -= chunk;
            if remaining == 0 {
                break;
            }
        }
    }

    /// Returns the wrapped counter.
    pub fn free(self) -> C {
        self.counter
    }

    fn countdown(&mut self, us: u32) {
        let us = us.max(MIN_DELAY_US);

        self.counter.load(us - 1);
        self.counter.clear_expired();
        self.counter.start();
        while !self.counter.is_expired() {}
        self.counter.clear_expired();
    }
}

impl<C: Countdown> DelayNs for MicrosecondTimer<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        const MAX_MS_PER_CALL: u32 = u32::MAX / 1_000;

        let mut remaining = ms;
        while remaining > 0 {
            let chunk = remaining.min(MAX_MS_PER_CALL);
            self.delay(chunk * 1_000);
            remaining -= chunk;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Op {
        Load(u32),
        Clear,
        Start,
    }

    /// Records register accesses and expires after `reload + 1` polls.
    #[derive(Default)]
    struct FakeCounter {
        ops: Vec<Op>,
        ticks_left: u32,
        running: bool,
    }

    impl Countdown for FakeCounter {
        fn load(&mut self, reload: u32) {
            self.ops.push(Op::Load(reload));
            self.ticks_left = reload + 1;
            self.running = false;
        }

        fn clear_expired(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn start(&mut self) {
            self.ops.push(Op::Start);
            self.running = true;
        }

        fn is_expired(&mut self) -> bool {
            assert!(self.running, "polled a stopped counter");
            self.ticks_left -= 1;
            self.ticks_left == 0
        }
    }

    /// Same as [`FakeCounter`] but with an 8-bit reload register.
    #[derive(Default)]
    struct NarrowCounter(FakeCounter);

    impl Countdown for NarrowCounter {
        const MAX_RELOAD: u32 = u8::MAX as u32;

        fn load(&mut self, reload: u32) {
            self.0.load(reload)
        }

        fn clear_expired(&mut self) {
            self.0.clear_expired()
        }

        fn start(&mut self) {
            self.0.start()
        }

        fn is_expired(&mut self) -> bool {
            self.0.is_expired()
        }
    }

    fn loads(ops: &[Op]) -> Vec<u32> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Load(reload) => Some(*reload),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_register_sequence() {
        let mut timer = MicrosecondTimer::new(FakeCounter::default());
        timer.delay(40);

        let counter = timer.free();
        assert_eq!(
            counter.ops,
            vec![Op::Load(39), Op::Clear, Op::Start, Op::Clear]
        );
    }

    #[test]
    fn test_minimum_delay_clamp() {
        let mut reference = MicrosecondTimer::new(FakeCounter::default());
        reference.delay(2);
        let reference = reference.free().ops;

        for us in [0, 1] {
            let mut timer = MicrosecondTimer::new(FakeCounter::default());
            timer.delay(us);
            assert_eq!(timer.free().ops, reference, "delay({us})");
        }
    }

    #[test]
    fn test_long_delay_is_split() {
        let mut timer = MicrosecondTimer::new(FakeCounter::default());
        // 18 ms start pulse fits a 16-bit counter in one go
        timer.delay(18_000);
        timer.delay(65_536 + 100);

        assert_eq!(loads(&timer.free().ops), vec![17_999, 65_535, 99]);
    }

    #[test]
    fn test_split_respects_counter_width() {
        let mut timer = MicrosecondTimer::new(NarrowCounter::default());
        timer.delay(600);

        assert_eq!(loads(&timer.free().0.ops), vec![255, 255, 87]);
    }

    #[test]
    fn test_delay_ns_rounds_up() {
        let mut timer = MicrosecondTimer::new(FakeCounter::default());
        timer.delay_ns(40_001);

        assert_eq!(loads(&timer.free().ops), vec![40]);
    }

    #[test]
    fn test_delay_ms() {
        let mut timer = MicrosecondTimer::new(FakeCounter::default());
        timer.delay_ms(50);

        assert_eq!(loads(&timer.free().ops), vec![49_999]);
    }
}
