use core::fmt::Write;

use cortex_m_semihosting::hio;
use log::{ Level, LevelFilter, Log, Metadata, Record };

struct Semihosting;

static LOGGER: Semihosting = Semihosting;

const LEVEL : Level = Level::Info;

impl Log for Semihosting {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut out) = hio::hstdout() {
            let _ = writeln!(out, "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}
