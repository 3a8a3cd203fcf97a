// nRF24L01 as the acknowledged datagram link.
//
// The chip does the reliability work itself (Enhanced ShockBurst): every
// payload is retransmitted until the receiver's auto-ack comes back or the
// retransmit count runs out.

use core::{ convert::Infallible, mem };

use embedded_nrf24l01::{
    Configuration, CrcMode, DataRate as RfDataRate, StandbyMode, TxMode, NRF24L01,
};

use stm32f1xx_hal::{
    gpio::{
        Alternate, Floating, Input, Output, PushPull,
        gpioa::{ PA5, PA6, PA7 },
        gpiob::{ PB0, PB1 },
    },
    spi::{ self, Spi, Spi1NoRemap },
    stm32::SPI1,
};

use protocol::{ address, DataRate, NodeId, PowerLevel, DATA_RATE, FREQUENCY, POWER };
use remote::{
    config::{ RETRANSMIT_COUNT, RETRANSMIT_DELAY },
    Datagram,
};

pub type RadioCe = PB0<Output<PushPull>>;
pub type RadioCsn = PB1<Output<PushPull>>;

pub type RadioSpi = Spi<SPI1, Spi1NoRemap,
    (PA5<Alternate<PushPull>>,
     PA6<Input<Floating>>,
     PA7<Alternate<PushPull>>)>;

type Device = NRF24L01<Infallible, RadioCe, RadioCsn, RadioSpi>;
type DeviceError = embedded_nrf24l01::Error<spi::Error>;

#[derive(Debug)]
pub enum RadioError {
    /// `init` has not succeeded yet.
    Offline,
    Device(DeviceError),
}

impl From<DeviceError> for RadioError {
    fn from(e: DeviceError) -> Self {
        RadioError::Device(e)
    }
}

// The device is held in every state, so a failed mode switch never loses it.
enum State {
    Unstarted(RadioCe, RadioCsn, RadioSpi),
    /// Powered down after a failed mode switch.
    Stalled(Device),
    Standby(StandbyMode<Device>),
    Ready(TxMode<Device>),
    Switching,
}

pub struct Radio {
    state: State,
    data_rate: DataRate,
    power: PowerLevel,
}

impl Radio {
    pub fn new(ce: RadioCe, csn: RadioCsn, spi: RadioSpi) -> Self {
        Radio { state: State::Unstarted(ce, csn, spi), data_rate: DATA_RATE, power: POWER }
    }

    /// Walks the device back to transmit mode, one step per state, keeping it whatever fails.
    fn ready(&mut self) -> Result<&mut TxMode<Device>, RadioError> {
        loop {
            self.state = match mem::replace(&mut self.state, State::Switching) {
                State::Ready(tx) => {
                    self.state = State::Ready(tx);
                    break;
                },
                State::Stalled(device) => match StandbyMode::power_up(device) {
                    Ok(standby) => State::Standby(standby),
                    Err((device, e)) => {
                        self.state = State::Stalled(device);
                        return Err(e.into());
                    },
                },
                State::Standby(mut standby) => {
                    if let Err(e) = setup(&mut standby, self.data_rate, self.power) {
                        self.state = State::Standby(standby);
                        return Err(e.into());
                    }
                    match standby.tx() {
                        Ok(tx) => State::Ready(tx),
                        Err((device, e)) => {
                            self.state = State::Stalled(device);
                            return Err(e.into());
                        },
                    }
                },
                other => {
                    self.state = other;
                    return Err(RadioError::Offline);
                },
            };
        }

        match &mut self.state {
            State::Ready(tx) => Ok(tx),
            _ => Err(RadioError::Offline),
        }
    }
}

fn setup<C: Configuration<Inner = Device>>(
    radio: &mut C,
    data_rate: DataRate,
    power: PowerLevel,
) -> Result<(), DeviceError> {
    radio.set_frequency(FREQUENCY)?;
    radio.set_crc(CrcMode::TwoBytes)?;
    radio.set_auto_retransmit(RETRANSMIT_DELAY, RETRANSMIT_COUNT)?;
    radio.set_auto_ack(&[true; 6])?;
    // Acks come back on pipe 0.
    radio.set_pipes_rx_enable(&[true, false, false, false, false, false])?;
    radio.set_rf(&rf_data_rate(data_rate), rf_power(power))
}

fn rf_data_rate(data_rate: DataRate) -> RfDataRate {
    match data_rate {
        DataRate::Kbps250 => RfDataRate::R250Kbps,
        DataRate::Mbps1 => RfDataRate::R1Mbps,
        DataRate::Mbps2 => RfDataRate::R2Mbps,
    }
}

// -18dBm up to 0dBm
fn rf_power(power: PowerLevel) -> u8 {
    match power {
        PowerLevel::Min => 0,
        PowerLevel::Low => 1,
        PowerLevel::High => 2,
        PowerLevel::Max => 3,
    }
}

impl Datagram for Radio {
    type Error = RadioError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.state = match mem::replace(&mut self.state, State::Switching) {
            State::Unstarted(ce, csn, spi) => State::Standby(NRF24L01::new(ce, csn, spi)?),
            other => other,
        };
        self.ready().map(|_| ())
    }

    fn configure(&mut self, data_rate: DataRate, power: PowerLevel) -> Result<(), Self::Error> {
        self.data_rate = data_rate;
        self.power = power;
        let tx = self.ready()?;
        tx.set_rf(&rf_data_rate(data_rate), rf_power(power))?;
        Ok(())
    }

    // Stays in transmit mode between sends; a fault in here leaves the device
    // where it was and the next send picks up from there.
    fn send_and_await_ack(&mut self, payload: &[u8], destination: NodeId) -> Result<bool, Self::Error> {
        let tx = self.ready()?;

        let peer = address(destination);
        tx.set_tx_addr(&peer)?;
        tx.set_rx_addr(0, &peer)?;
        tx.send(payload)?;
        Ok(nb::block!(tx.poll_send())?)
    }
}
