use core::fmt;

use heapless::Vec;
use log::{ debug, info, warn };

use protocol::{ Frame, NodeId, RECEIVER_ID };

use crate::{
    config::{ SamplerConfig, POLL_INTERVAL_MS },
    sampler::{ Event, InputSampler, Millis, Sample, MAX_EVENTS },
    transport::{ Datagram, DeliveryResult, ReliableTransport, StartupError, StatusIndicator },
};

/// The physical inputs.
pub trait Controls {
    type Error: fmt::Debug;

    fn sample(&mut self) -> Result<Sample, Self::Error>;
}

pub trait Clock {
    fn now(&mut self) -> Millis;
}

pub type Outcomes = Vec<(Event, DeliveryResult), MAX_EVENTS>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LinkError<C, D> {
    Startup(StartupError<D>),
    Sample(C),
}

impl<C: fmt::Debug, D: fmt::Debug> fmt::Display for LinkError<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Startup(e) => write!(f, "{}", e),
            LinkError::Sample(e) => write!(f, "initial sample failed: {:?}", e),
        }
    }
}

/// Spins until `POLL_INTERVAL_MS` have passed since `started`, returning the time it stopped at.
pub fn wait_interval<K: Clock>(clock: &mut K, started: Millis) -> Millis {
    loop {
        let now = clock.now();
        if now.wrapping_sub(started) >= POLL_INTERVAL_MS {
            return now;
        }
        core::hint::spin_loop();
    }
}

pub struct TransmitterLoop<C, D, S> {
    controls: C,
    sampler: InputSampler,
    transport: ReliableTransport<D, S>,
    destination: NodeId,
    frame: Frame,
}

impl<C, D, S> TransmitterLoop<C, D, S>
where
    C: Controls,
    D: Datagram,
    S: StatusIndicator,
{
    /// Starts the radio, then takes the first pot readings as the baseline.
    pub fn start(
        mut controls: C,
        datagram: D,
        indicator: S,
        config: SamplerConfig,
    ) -> Result<Self, LinkError<C::Error, D::Error>> {
        let transport = ReliableTransport::start(datagram, indicator).map_err(LinkError::Startup)?;
        let initial = controls.sample().map_err(LinkError::Sample)?;
        info!("pots start at {:?}", initial.pots);

        Ok(TransmitterLoop {
            controls,
            sampler: InputSampler::new(config, initial.pots),
            transport,
            destination: RECEIVER_ID,
            frame: Frame::default(),
        })
    }

    /// One polling cycle. Events go out one at a time, in the order they were detected.
    pub fn step(&mut self, now: Millis) -> Outcomes {
        let mut outcomes = Outcomes::new();

        let sample = match self.controls.sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("skipping cycle, inputs unreadable: {:?}", e);
                return outcomes;
            },
        };

        // Holds as many entries as the event batch can.
        for event in self.sampler.poll(&sample, now) {
            let result = self.deliver(&event);
            let _ = outcomes.push((event, result));
        }
        outcomes
    }

    fn deliver(&mut self, event: &Event) -> DeliveryResult {
        self.frame = match event.command().encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping {:?}: {}", event, e);
                return self.transport.reject(event.command().operation);
            },
        };
        debug!("{:?} -> \"{}\"", event, self.frame);
        self.transport.send(&self.frame, self.destination)
    }

    /// Polls forever, roughly every `POLL_INTERVAL_MS`. A send blocks the loop until it resolves.
    pub fn run<K: Clock>(&mut self, clock: &mut K) -> ! {
        loop {
            let started = clock.now();
            self.step(started);
            wait_interval(clock, started);
        }
    }

    pub fn sampler(&self) -> &InputSampler {
        &self.sampler
    }

    pub fn transport(&self) -> &ReliableTransport<D, S> {
        &self.transport
    }
}
