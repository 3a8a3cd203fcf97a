#![cfg_attr(not(test), no_std)]
pub mod frame;

pub use frame::{
    decode, encode,
    Command, DecodeError, EncodeError, Field, Frame, Operation,
    FIELD_MAX, FIELD_MIN, FIELD_WIDTH, FRAME_LEN,
};

pub type Value = i32;
pub type Channel = i32;
pub type NodeId = u8;

pub const TRANSMITTER_ID : NodeId = 1;
pub const RECEIVER_ID : NodeId = 2;

pub const FREQUENCY : u8 = 76;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DataRate {
    Kbps250,
    Mbps1,
    Mbps2,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PowerLevel {
    Min,
    Low,
    High,
    Max,
}

// Range matters more than throughput: a frame is 16 bytes and goes out a few times a second.
pub const DATA_RATE : DataRate = DataRate::Kbps250;
pub const POWER : PowerLevel = PowerLevel::Max;

const ADDRESS_PREFIX : [u8; 4] = [ 'R' as u8, 'C' as u8, 'N' as u8, 'D' as u8 ];

/// The 5 byte pipe address a node listens on.
pub fn address(node: NodeId) -> [u8; 5] {
    let mut address = [0u8; 5];
    address[..4].copy_from_slice(&ADDRESS_PREFIX);
    address[4] = node;
    address
}

#[test]
fn nodes_have_distinct_addresses() {
    assert_ne!(address(TRANSMITTER_ID), address(RECEIVER_ID));
    assert_eq!(&address(RECEIVER_ID), b"RCND\x02");
}

#[test]
fn frame_fits_a_radio_payload() {
    // nRF24L01 payloads are at most 32 bytes
    assert!(FRAME_LEN <= 32);
}
