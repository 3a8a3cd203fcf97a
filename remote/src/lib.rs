//! Transmitter side of a two node remote control link.
//!
//! Two buttons and two potentiometers are sampled every cycle. Debounced
//! button presses and pot movements become [`Event`]s, each event is
//! encoded as a [`protocol::Frame`] and delivered to the receiver through a
//! [`Datagram`] radio that acknowledges and retries on its own.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod hw;
pub mod link;
pub mod sampler;
pub mod transport;

pub use link::{ wait_interval, Clock, Controls, LinkError, TransmitterLoop };
pub use sampler::{ Event, InputSampler, Level, Sample };
pub use transport::{ Datagram, DeliveryResult, ReliableTransport, StartupError, StatusIndicator };
