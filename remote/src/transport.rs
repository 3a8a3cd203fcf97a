use core::fmt;

use log::{ debug, info, warn };

use protocol::{ DataRate, Frame, NodeId, Operation, PowerLevel, DATA_RATE, POWER };

/// An unreliable radio that knows how to wait for an acknowledgement.
///
/// Retries and timeouts belong to the implementation; callers only see
/// whether the peer acknowledged in the end.
pub trait Datagram {
    type Error: fmt::Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn configure(&mut self, data_rate: DataRate, power: PowerLevel) -> Result<(), Self::Error>;

    /// Blocks until `destination` acknowledges `payload` (`Ok(true)`) or the
    /// radio gives up (`Ok(false)`).
    fn send_and_await_ack(&mut self, payload: &[u8], destination: NodeId) -> Result<bool, Self::Error>;
}

pub trait StatusIndicator {
    fn signal(&mut self, positive: bool);
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeliveryResult {
    Delivered,
    Failed,
}

impl DeliveryResult {
    pub fn is_delivered(self) -> bool {
        self == DeliveryResult::Delivered
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeliveryAttempt<'a> {
    pub frame: &'a Frame,
    pub destination: NodeId,
    /// Sequence number of this send since startup.
    pub attempt: u32,
}

/// Counters since startup. They wrap rather than saturate.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct DeliveryStats {
    pub attempts: u32,
    pub delivered: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StartupError<E> {
    Init(E),
    Configure(E),
}

impl<E: fmt::Debug> fmt::Display for StartupError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Init(e) => write!(f, "radio init failed: {:?}", e),
            StartupError::Configure(e) => write!(f, "radio configuration failed: {:?}", e),
        }
    }
}

pub struct ReliableTransport<D, S> {
    datagram: D,
    indicator: S,
    stats: DeliveryStats,
}

impl<D: Datagram, S: StatusIndicator> ReliableTransport<D, S> {
    /// Brings the radio up. Any failure here leaves nothing to operate with.
    pub fn start(mut datagram: D, indicator: S) -> Result<Self, StartupError<D::Error>> {
        datagram.init().map_err(StartupError::Init)?;
        datagram.configure(DATA_RATE, POWER).map_err(StartupError::Configure)?;
        info!("radio up: {:?} at {:?} power", DATA_RATE, POWER);

        Ok(ReliableTransport { datagram, indicator, stats: DeliveryStats::default() })
    }

    /// One logical delivery. Only button frames show their outcome on the indicator.
    pub fn send(&mut self, frame: &Frame, destination: NodeId) -> DeliveryResult {
        self.stats.attempts = self.stats.attempts.wrapping_add(1);
        let attempt = DeliveryAttempt { frame, destination, attempt: self.stats.attempts };

        let result = self.deliver(&attempt);
        match result {
            DeliveryResult::Delivered => self.stats.delivered = self.stats.delivered.wrapping_add(1),
            DeliveryResult::Failed => self.stats.failed = self.stats.failed.wrapping_add(1),
        }

        if frame.operation() == Some(Operation::Mode) {
            self.indicator.signal(result.is_delivered());
        }
        result
    }

    /// Accounts for a command that never became a frame, as a failed delivery.
    pub fn reject(&mut self, operation: Operation) -> DeliveryResult {
        self.stats.attempts = self.stats.attempts.wrapping_add(1);
        self.stats.failed = self.stats.failed.wrapping_add(1);
        if operation == Operation::Mode {
            self.indicator.signal(false);
        }
        DeliveryResult::Failed
    }

    fn deliver(&mut self, attempt: &DeliveryAttempt<'_>) -> DeliveryResult {
        match self.datagram.send_and_await_ack(attempt.frame.as_bytes(), attempt.destination) {
            Ok(true) => {
                debug!("#{} \"{}\" acknowledged by node {}", attempt.attempt, attempt.frame, attempt.destination);
                DeliveryResult::Delivered
            },
            Ok(false) => {
                warn!("#{} \"{}\" not acknowledged by node {}", attempt.attempt, attempt.frame, attempt.destination);
                DeliveryResult::Failed
            },
            Err(e) => {
                warn!("#{} \"{}\" radio error: {:?}", attempt.attempt, attempt.frame, e);
                DeliveryResult::Failed
            },
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        self.stats
    }

    pub fn datagram(&self) -> &D {
        &self.datagram
    }

    pub fn indicator(&self) -> &S {
        &self.indicator
    }
}
