use heapless::Vec;
use log::{ debug, warn };

use protocol::{ Channel, Command, Value };

use crate::config::{ SamplerConfig, CHANNELS };

/// Wrapping millisecond timestamp.
pub type Millis = u32;
/// Raw ADC reading.
pub type Reading = u16;

pub const MAX_EVENTS : usize = 2 * CHANNELS.len();
pub type Events = Vec<Event, MAX_EVENTS>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Event {
    ModeChange { channel: Channel },
    PotChanged { channel: Channel, value: Reading },
}

impl Event {
    pub fn channel(&self) -> Channel {
        match *self {
            Event::ModeChange { channel } => channel,
            Event::PotChanged { channel, .. } => channel,
        }
    }

    pub fn command(&self) -> Command {
        match *self {
            Event::ModeChange { channel } => Command::mode(channel),
            Event::PotChanged { channel, value } => Command::pots(channel, Value::from(value)),
        }
    }
}

/// One raw reading of every input.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Sample {
    pub buttons: [Level; 2],
    pub pots: [Reading; 2],
}

// Buttons are wired to pull-ups, so a pressed button reads Low.
const RELEASED : Level = Level::High;
const PRESSED : Level = Level::Low;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ButtonState {
    stable: Level,
    raw: Level,
    last_change: Millis,
}

impl ButtonState {
    pub fn new() -> Self {
        ButtonState { stable: RELEASED, raw: RELEASED, last_change: 0 }
    }

    pub fn is_pressed(&self) -> bool {
        self.stable == PRESSED
    }

    /// Returns true when a press becomes stable.
    fn update(&mut self, raw: Level, now: Millis, debounce_ms: Millis) -> bool {
        if raw != self.raw {
            self.raw = raw;
            self.last_change = now;
            return false;
        }

        if raw != self.stable && now.wrapping_sub(self.last_change) >= debounce_ms {
            self.stable = raw;
            return raw == PRESSED;
        }

        false
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PotState {
    last_reported: Reading,
}

impl PotState {
    pub fn new(initial: Reading) -> Self {
        PotState { last_reported: initial }
    }

    pub fn last_reported(&self) -> Reading {
        self.last_reported
    }

    fn update(&mut self, raw: Reading, threshold: Reading) -> bool {
        if raw.abs_diff(self.last_reported) > threshold {
            self.last_reported = raw;
            true
        } else {
            false
        }
    }
}

/// Turns raw samples into events. Holds no timers: time comes in with each poll.
#[derive(Debug, Clone)]
pub struct InputSampler {
    config: SamplerConfig,
    buttons: [ButtonState; 2],
    pots: [PotState; 2],
}

impl InputSampler {
    /// `initial_pots` is the first reading of each pot; it is taken as already reported.
    pub fn new(config: SamplerConfig, initial_pots: [Reading; 2]) -> Self {
        InputSampler {
            config,
            buttons: [ButtonState::new(); 2],
            pots: [ PotState::new(initial_pots[0]), PotState::new(initial_pots[1]) ],
        }
    }

    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    pub fn button(&self, channel: Channel) -> Option<&ButtonState> {
        slot(channel).map(|i| &self.buttons[i])
    }

    pub fn pot(&self, channel: Channel) -> Option<&PotState> {
        slot(channel).map(|i| &self.pots[i])
    }

    pub fn poll_button(&mut self, channel: Channel, raw: Level, now: Millis) -> Option<Event> {
        let i = known_slot(channel)?;
        if self.buttons[i].update(raw, now, self.config.debounce_ms) {
            debug!("button {} pressed at {}ms", channel, now);
            Some(Event::ModeChange { channel })
        } else {
            None
        }
    }

    pub fn poll_pot(&mut self, channel: Channel, raw: Reading) -> Option<Event> {
        let i = known_slot(channel)?;
        if self.pots[i].update(raw, self.config.pot_threshold) {
            debug!("pot {} moved to {}", channel, raw);
            Some(Event::PotChanged { channel, value: raw })
        } else {
            None
        }
    }

    /// Polls every input of a sample: buttons first, then pots, each in channel order.
    pub fn poll(&mut self, sample: &Sample, now: Millis) -> Events {
        // One event per input at most, so `events` never runs out of room.
        let mut events = Events::new();
        for (i, &channel) in CHANNELS.iter().enumerate() {
            if let Some(event) = self.poll_button(channel, sample.buttons[i], now) {
                let _ = events.push(event);
            }
        }
        for (i, &channel) in CHANNELS.iter().enumerate() {
            if let Some(event) = self.poll_pot(channel, sample.pots[i]) {
                let _ = events.push(event);
            }
        }
        events
    }
}

fn slot(channel: Channel) -> Option<usize> {
    CHANNELS.iter().position(|&known| known == channel)
}

fn known_slot(channel: Channel) -> Option<usize> {
    let slot = slot(channel);
    if slot.is_none() {
        warn!("ignoring input on unknown channel {}", channel);
    }
    slot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> InputSampler {
        InputSampler::new(SamplerConfig { debounce_ms: 10, pot_threshold: 4 }, [500, 500])
    }

    #[test]
    fn press_held_past_debounce_fires_once() {
        let mut sampler = sampler();
        assert_eq!(sampler.poll_button(1, Level::High, 0), None);

        let mut events = 0;
        for now in 1..=30 {
            if let Some(event) = sampler.poll_button(1, Level::Low, now) {
                assert_eq!(event, Event::ModeChange { channel: 1 });
                assert_eq!(now, 11);
                events += 1;
            }
        }
        assert_eq!(events, 1);
        assert!(sampler.button(1).unwrap().is_pressed());
    }

    #[test]
    fn bouncing_contact_is_ignored() {
        let mut sampler = sampler();
        for now in 0..200 {
            // toggles every 5ms, never stable for 10
            let raw = if (now / 5) % 2 == 0 { Level::Low } else { Level::High };
            assert_eq!(sampler.poll_button(1, raw, now), None);
        }
        assert!(!sampler.button(1).unwrap().is_pressed());
    }

    #[test]
    fn release_is_silent() {
        let mut sampler = sampler();
        let fired: usize = (0..=20)
            .filter_map(|now| sampler.poll_button(2, Level::Low, now))
            .count();
        assert_eq!(fired, 1);

        for now in 21..=60 {
            assert_eq!(sampler.poll_button(2, Level::High, now), None);
        }
        assert!(!sampler.button(2).unwrap().is_pressed());
    }

    #[test]
    fn second_press_fires_again() {
        let mut sampler = sampler();
        let mut fired = 0;
        for now in 0..100 {
            let raw = if now < 30 || now >= 60 { Level::Low } else { Level::High };
            if sampler.poll_button(1, raw, now).is_some() {
                fired += 1;
            }
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn debounce_survives_clock_wrap() {
        let mut sampler = sampler();
        let start = Millis::MAX - 3;
        assert_eq!(sampler.poll_button(1, Level::Low, start), None);
        assert_eq!(sampler.poll_button(1, Level::Low, start.wrapping_add(9)), None);
        assert_eq!(
            sampler.poll_button(1, Level::Low, start.wrapping_add(10)),
            Some(Event::ModeChange { channel: 1 })
        );
    }

    #[test]
    fn jitter_inside_band_is_ignored() {
        let mut sampler = sampler();
        for &raw in [ 500, 504, 496, 503, 497, 500 ].iter() {
            assert_eq!(sampler.poll_pot(1, raw), None);
        }
        assert_eq!(sampler.pot(1).unwrap().last_reported(), 500);
    }

    #[test]
    fn movement_past_band_reports_and_moves_baseline() {
        let mut sampler = sampler();
        assert_eq!(sampler.poll_pot(1, 506), Some(Event::PotChanged { channel: 1, value: 506 }));
        assert_eq!(sampler.pot(1).unwrap().last_reported(), 506);
        // 503 is within the band around the new baseline
        assert_eq!(sampler.poll_pot(1, 503), None);
        assert_eq!(sampler.poll_pot(1, 501), Some(Event::PotChanged { channel: 1, value: 501 }));
    }

    #[test]
    fn pots_are_independent() {
        let mut sampler = sampler();
        assert_eq!(sampler.poll_pot(2, 0), Some(Event::PotChanged { channel: 2, value: 0 }));
        assert_eq!(sampler.pot(1).unwrap().last_reported(), 500);
    }

    #[test]
    fn unknown_channel_yields_nothing() {
        let mut sampler = sampler();
        assert_eq!(sampler.poll_pot(3, 0), None);
        assert_eq!(sampler.poll_button(0, Level::Low, 100), None);
        assert!(sampler.button(3).is_none());
    }

    #[test]
    fn poll_orders_buttons_before_pots() {
        let mut sampler = sampler();
        let pressed = Sample { buttons: [Level::High, Level::Low], pots: [500, 500] };
        assert!(sampler.poll(&pressed, 0).is_empty());

        let moved = Sample { buttons: [Level::High, Level::Low], pots: [900, 100] };
        let events = sampler.poll(&moved, 10);
        assert_eq!(&events[..], &[
            Event::ModeChange { channel: 2 },
            Event::PotChanged { channel: 1, value: 900 },
            Event::PotChanged { channel: 2, value: 100 },
        ][..]);
    }

    #[test]
    fn every_input_at_once_fits_the_batch() {
        let mut sampler = sampler();
        let pressed = Sample { buttons: [Level::Low, Level::Low], pots: [500, 500] };
        assert!(sampler.poll(&pressed, 0).is_empty());

        let all = Sample { pots: [0, 1023], ..pressed };
        let events = sampler.poll(&all, 10);
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(&events[..], &[
            Event::ModeChange { channel: 1 },
            Event::ModeChange { channel: 2 },
            Event::PotChanged { channel: 1, value: 0 },
            Event::PotChanged { channel: 2, value: 1023 },
        ][..]);
    }

    #[test]
    fn events_map_to_commands() {
        assert_eq!(Event::ModeChange { channel: 2 }.command(), Command::mode(2));
        assert_eq!(Event::PotChanged { channel: 1, value: 1023 }.command(), Command::pots(1, 1023));
    }
}
