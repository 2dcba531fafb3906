//! Scripted I2C platform for tests
//!
//! Every handle shares one transaction log with the platform that opened it, so
//! a test can hand the handle to a driver (or a polling thread) and still
//! inspect what went over the wire afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{BusSpeed, ControllerId, I2cBus, I2cPlatform};
use crate::error::{Mma8452qError, Result};

/// One recorded bus event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    Open { addr: u8, speed: BusSpeed },
    Write { addr: u8, data: Vec<u8> },
    WriteRead { addr: u8, write_data: Vec<u8>, read_len: usize },
    Close { addr: u8 },
}

#[derive(Debug, Default)]
struct MockState {
    log: Vec<I2cTransaction>,
    writes_seen: usize,
    fail_write_at: Option<(usize, String)>,
    responses: VecDeque<std::result::Result<Vec<u8>, String>>,
}

/// Mock platform with one shared transaction log
#[derive(Debug, Clone)]
pub struct MockPlatform {
    controllers: Vec<ControllerId>,
    address_in_use: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    /// One controller, `/dev/i2c-1`, with a free address
    pub fn new() -> Self {
        Self::with_controllers(vec![ControllerId::new(1, "/dev/i2c-1")])
    }

    pub fn with_controllers(controllers: Vec<ControllerId>) -> Self {
        Self {
            controllers,
            address_in_use: false,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Make every `open` report the address as taken
    pub fn address_in_use(mut self) -> Self {
        self.address_in_use = true;
        self
    }

    /// Fail the `index`-th write (0-based) with `message`
    pub fn fail_write(self, index: usize, message: &str) -> Self {
        self.lock().fail_write_at = Some((index, message.to_string()));
        self
    }

    /// Queue bytes for the next write-read
    pub fn push_frame(&self, bytes: &[u8]) {
        self.lock().responses.push_back(Ok(bytes.to_vec()));
    }

    /// Queue a failure for the next write-read
    pub fn push_read_error(&self, message: &str) {
        self.lock().responses.push_back(Err(message.to_string()));
    }

    /// Hand out a handle without going through `open`
    pub fn bus(&self, addr: u8) -> MockBus {
        MockBus {
            addr,
            state: self.state.clone(),
        }
    }

    pub fn transactions(&self) -> Vec<I2cTransaction> {
        self.lock().log.clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.transactions()
            .into_iter()
            .filter_map(|t| match t {
                I2cTransaction::Write { data, .. } => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn read_count(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| matches!(t, I2cTransaction::WriteRead { .. }))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| matches!(t, I2cTransaction::Close { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl I2cPlatform for MockPlatform {
    type Bus = MockBus;

    fn list_i2c_controllers(&self) -> Result<Vec<ControllerId>> {
        Ok(self.controllers.clone())
    }

    fn open(&self, controller: &ControllerId, address: u8, speed: BusSpeed) -> Result<MockBus> {
        if self.address_in_use {
            return Err(Mma8452qError::AddressInUse {
                address,
                controller: controller.to_string(),
            });
        }
        self.lock().log.push(I2cTransaction::Open { addr: address, speed });
        Ok(self.bus(address))
    }
}

/// Handle produced by [`MockPlatform`]; logs `Close` when dropped
#[derive(Debug)]
pub struct MockBus {
    addr: u8,
    state: Arc<Mutex<MockState>>,
}

impl I2cBus for MockBus {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let index = state.writes_seen;
        state.writes_seen += 1;
        state.log.push(I2cTransaction::Write {
            addr: self.addr,
            data: bytes.to_vec(),
        });

        match &state.fail_write_at {
            Some((at, message)) if *at == index => Err(Mma8452qError::Bus(message.clone())),
            _ => Ok(()),
        }
    }

    fn write_read(&mut self, write_bytes: &[u8], read_buffer: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.log.push(I2cTransaction::WriteRead {
            addr: self.addr,
            write_data: write_bytes.to_vec(),
            read_len: read_buffer.len(),
        });

        match state.responses.pop_front() {
            Some(Ok(data)) => {
                let n = data.len().min(read_buffer.len());
                read_buffer[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Err(message)) => Err(Mma8452qError::Bus(message)),
            None => Err(Mma8452qError::Bus("no scripted response".into())),
        }
    }
}

impl Drop for MockBus {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.log.push(I2cTransaction::Close { addr: self.addr });
        }
    }
}
