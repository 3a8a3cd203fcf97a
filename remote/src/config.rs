use protocol::Channel;

use crate::sampler::{ Millis, Reading };

pub const CHANNELS : [Channel; 2] = [ 1, 2 ];

/// A button level must hold this long before it counts.
pub const DEBOUNCE_MS : Millis = 10;
/// ADC jitter band, in counts of a 10 bit reading.
pub const POT_THRESHOLD : Reading = 4;
pub const POLL_INTERVAL_MS : Millis = 1;

pub const POSITIVE_PULSE_MS : u16 = 200;
pub const NEGATIVE_PULSE_MS : u16 = 60;
pub const NEGATIVE_PULSES : u8 = 3;

// Retry discipline of the radio itself: delay in 250us steps, then count.
// 1.5ms is the shortest delay that leaves room for an ack at 250kbps.
pub const RETRANSMIT_DELAY : u8 = 5;
pub const RETRANSMIT_COUNT : u8 = 15;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SamplerConfig {
    pub debounce_ms: Millis,
    pub pot_threshold: Reading,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig { debounce_ms: DEBOUNCE_MS, pot_threshold: POT_THRESHOLD }
    }
}
