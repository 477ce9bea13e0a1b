//! Simulated TPS65200 and interrupt lines for driver tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use charger_hal::{Edge, HalError, HalResult, InterruptLines, LineId};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

use crate::{PlatformConfig, Tps65200};

pub const ADDRESS: u8 = 0x6A;
pub const STATUS_LINE: LineId = LineId(4);
pub const FAULT_LINE: LineId = LineId(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Write(u8, u8),
    Read(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError(pub ErrorKind);

impl embedded_hal::i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Default)]
struct ChipState {
    registers: [u8; 0x10],
    scripted: HashMap<u8, VecDeque<u8>>,
    failing_writes: HashSet<u8>,
    failing_reads: HashSet<u8>,
    log: Vec<BusOp>,
}

/// Register file behind an I2C bus. Clones share the same chip.
#[derive(Clone, Default)]
pub struct SimChip {
    state: Arc<Mutex<ChipState>>,
}

impl SimChip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, register: u8, value: u8) {
        self.state.lock().unwrap().registers[register as usize] = value;
    }

    pub fn get(&self, register: u8) -> u8 {
        self.state.lock().unwrap().registers[register as usize]
    }

    /// Values returned by the next reads of `register`, before the register
    /// file is consulted again.
    pub fn script(&self, register: u8, values: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(register)
            .or_default()
            .extend(values.iter().copied());
    }

    pub fn fail_writes_to(&self, register: u8) {
        self.state.lock().unwrap().failing_writes.insert(register);
    }

    pub fn fail_reads_of(&self, register: u8) {
        self.state.lock().unwrap().failing_reads.insert(register);
    }

    pub fn log(&self) -> Vec<BusOp> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                BusOp::Write(register, value) => Some((register, value)),
                BusOp::Read(_) => None,
            })
            .collect()
    }

    pub fn reads(&self) -> Vec<u8> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                BusOp::Read(register) => Some(register),
                BusOp::Write(..) => None,
            })
            .collect()
    }

    pub fn reads_of(&self, register: u8) -> usize {
        self.reads().into_iter().filter(|&r| r == register).count()
    }
}

impl ErrorType for SimChip {
    type Error = SimError;
}

impl I2c for SimChip {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != ADDRESS {
            return Err(SimError(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            )));
        }

        let mut state = self.state.lock().unwrap();
        let mut cursor = 0u8;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&register, payload)) = bytes.split_first() else {
                        continue;
                    };
                    cursor = register;
                    if payload.is_empty() {
                        continue;
                    }
                    if state.failing_writes.contains(&register) {
                        return Err(SimError(ErrorKind::Other));
                    }
                    for (offset, &value) in payload.iter().enumerate() {
                        let target = register.wrapping_add(offset as u8);
                        state.registers[target as usize % 0x10] = value;
                        state.log.push(BusOp::Write(target, value));
                    }
                }
                Operation::Read(buf) => {
                    if state.failing_reads.contains(&cursor) {
                        return Err(SimError(ErrorKind::Other));
                    }
                    for byte in buf.iter_mut() {
                        let scripted = state.scripted.get_mut(&cursor).and_then(VecDeque::pop_front);
                        *byte = scripted.unwrap_or(state.registers[cursor as usize % 0x10]);
                        state.log.push(BusOp::Read(cursor));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCall {
    Enable(LineId),
    Disable(LineId),
}

#[derive(Default)]
struct LinesState {
    requested: Vec<(LineId, Edge)>,
    refused: HashSet<LineId>,
    stuck_masked: HashSet<LineId>,
    calls: Vec<LineCall>,
}

/// Interrupt lines that record every call. Clones share the record.
#[derive(Clone, Default)]
pub struct SimLines {
    state: Arc<Mutex<LinesState>>,
}

impl SimLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, line: LineId) {
        self.state.lock().unwrap().refused.insert(line);
    }

    /// Makes every later `enable` of `line` fail.
    pub fn stick_masked(&self, line: LineId) {
        self.state.lock().unwrap().stuck_masked.insert(line);
    }

    pub fn requested(&self) -> Vec<(LineId, Edge)> {
        self.state.lock().unwrap().requested.clone()
    }

    pub fn calls(&self) -> Vec<LineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn disables(&self, line: LineId) -> usize {
        self.calls()
            .into_iter()
            .filter(|&c| c == LineCall::Disable(line))
            .count()
    }

    pub fn enables(&self, line: LineId) -> usize {
        self.calls()
            .into_iter()
            .filter(|&c| c == LineCall::Enable(line))
            .count()
    }
}

impl InterruptLines for SimLines {
    fn request(&mut self, line: LineId, edge: Edge) -> HalResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.refused.contains(&line) {
            return Err(HalError::Busy);
        }
        state.requested.push((line, edge));
        Ok(())
    }

    fn enable(&mut self, line: LineId) -> HalResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.stuck_masked.contains(&line) {
            return Err(HalError::HardwareError);
        }
        state.calls.push(LineCall::Enable(line));
        Ok(())
    }

    fn disable(&mut self, line: LineId) -> HalResult<()> {
        self.state.lock().unwrap().calls.push(LineCall::Disable(line));
        Ok(())
    }
}

pub type SimDriver = Tps65200<SimChip, SimLines>;

pub fn full_config() -> PlatformConfig {
    PlatformConfig::builder(ADDRESS)
        .status_line(STATUS_LINE)
        .fault_line(FAULT_LINE)
        .build()
}

pub fn driver_with(config: PlatformConfig) -> (SimDriver, SimChip, SimLines) {
    let chip = SimChip::new();
    let lines = SimLines::new();
    let driver = Tps65200::new(chip.clone(), lines.clone(), config).unwrap();
    (driver, chip, lines)
}

pub fn driver() -> (SimDriver, SimChip, SimLines) {
    driver_with(full_config())
}

/// Advances time and runs whatever became due.
pub fn tick(driver: &SimDriver, ms: u64) -> usize {
    driver.advance(Duration::from_millis(ms));
    driver.run_pending()
}
