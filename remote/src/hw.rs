// Controls and indicator on top of embedded-hal pins.

use core::{ fmt, marker::PhantomData };

use embedded_hal::{
    adc::{ Channel as AdcChannel, OneShot },
    blocking::delay::DelayMs,
    digital::v2::{ InputPin, OutputPin },
};

use crate::{
    config::{ NEGATIVE_PULSES, NEGATIVE_PULSE_MS, POSITIVE_PULSE_MS },
    link::Controls,
    sampler::{ Level, Reading, Sample },
    transport::StatusIndicator,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PanelError<P, A> {
    Pin(P),
    Adc(A),
}

/// Two buttons on digital inputs, two pots on one ADC.
pub struct Panel<ADC, A, B, P1, P2> {
    adc: A,
    buttons: [B; 2],
    pots: (P1, P2),
    _adc: PhantomData<ADC>,
}

impl<ADC, A, B, P1, P2> Panel<ADC, A, B, P1, P2> {
    pub fn new(adc: A, buttons: [B; 2], pots: (P1, P2)) -> Self {
        Panel { adc, buttons, pots, _adc: PhantomData }
    }
}

impl<ADC, A, B, P1, P2, E> Controls for Panel<ADC, A, B, P1, P2>
where
    A: OneShot<ADC, Reading, P1, Error = E> + OneShot<ADC, Reading, P2, Error = E>,
    B: InputPin,
    B::Error: fmt::Debug,
    P1: AdcChannel<ADC>,
    P2: AdcChannel<ADC>,
    E: fmt::Debug,
{
    type Error = PanelError<B::Error, E>;

    fn sample(&mut self) -> Result<Sample, Self::Error> {
        let mut buttons = [Level::High; 2];
        for (level, pin) in buttons.iter_mut().zip(self.buttons.iter()) {
            *level = Level::from(pin.is_high().map_err(PanelError::Pin)?);
        }

        let first = nb::block!(<A as OneShot<ADC, Reading, P1>>::read(&mut self.adc, &mut self.pots.0))
            .map_err(PanelError::Adc)?;
        let second = nb::block!(<A as OneShot<ADC, Reading, P2>>::read(&mut self.adc, &mut self.pots.1))
            .map_err(PanelError::Adc)?;

        Ok(Sample { buttons, pots: [first, second] })
    }
}

/// An LED that shows one long pulse for success and a burst of short ones for failure.
pub struct PulseIndicator<P, D> {
    led: P,
    delay: D,
}

impl<P: OutputPin, D: DelayMs<u16>> PulseIndicator<P, D> {
    pub fn new(led: P, delay: D) -> Self {
        PulseIndicator { led, delay }
    }

    fn pulse(&mut self, ms: u16) {
        // a stuck LED is not worth stopping for
        let _ = self.led.set_high();
        self.delay.delay_ms(ms);
        let _ = self.led.set_low();
        self.delay.delay_ms(ms);
    }
}

impl<P: OutputPin, D: DelayMs<u16>> StatusIndicator for PulseIndicator<P, D> {
    fn signal(&mut self, positive: bool) {
        if positive {
            self.pulse(POSITIVE_PULSE_MS);
        } else {
            for _ in 0..NEGATIVE_PULSES {
                self.pulse(NEGATIVE_PULSE_MS);
            }
        }
    }
}
