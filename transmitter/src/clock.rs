use cortex_m::peripheral::DWT;

use remote::{ sampler::Millis, Clock };

/// Milliseconds since boot, from the cycle counter.
///
/// The counter wraps every minute or so at 72MHz; reading the clock more
/// often than that keeps the count exact.
pub struct CycleClock {
    cycles_per_ms: u64,
    last: u32,
    pending: u64,
    millis: Millis,
}

impl CycleClock {
    pub fn new(sysclk_hz: u32) -> Self {
        CycleClock {
            cycles_per_ms: u64::from(sysclk_hz / 1000),
            last: DWT::cycle_count(),
            pending: 0,
            millis: 0,
        }
    }
}

impl Clock for CycleClock {
    fn now(&mut self) -> Millis {
        let cycles = DWT::cycle_count();
        self.pending += u64::from(cycles.wrapping_sub(self.last));
        self.last = cycles;
        self.millis = self.millis.wrapping_add((self.pending / self.cycles_per_ms) as Millis);
        self.pending %= self.cycles_per_ms;
        self.millis
    }
}
