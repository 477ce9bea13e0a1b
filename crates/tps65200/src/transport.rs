//! Serialised register access over the I2C bus.

use embedded_hal::i2c::{Error as _, I2c};

use crate::error::{Error, Result};
use crate::regs::{self, RegisterDump};
use crate::sync::Mutex;

/// Largest payload a single register write carries.
const MAX_WRITE_LEN: usize = 4;

/// Register transport for one chip.
///
/// Every transaction runs with the bus lock held. [`Transport::session`] keeps
/// the lock across several transactions so a register sequence cannot be
/// interleaved with another caller's.
pub struct Transport<I2C> {
    address: u8,
    bus: Mutex<I2C>,
}

impl<I2C: I2c> Transport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            address,
            bus: Mutex::new(i2c),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Runs `f` with exclusive access to the bus.
    pub fn session<R>(&self, f: impl FnOnce(&mut Bus<'_, I2C>) -> R) -> R {
        let mut guard = self.bus.lock();
        let mut bus = Bus {
            i2c: &mut *guard,
            address: self.address,
        };
        f(&mut bus)
    }

    pub fn write(&self, register: u8, bytes: &[u8]) -> Result<()> {
        self.session(|bus| bus.write(register, bytes))
    }

    pub fn read(&self, register: u8, buf: &mut [u8]) -> Result<()> {
        self.session(|bus| bus.read(register, buf))
    }

    pub fn write_byte(&self, register: u8, value: u8) -> Result<()> {
        self.write(register, &[value])
    }

    pub fn read_byte(&self, register: u8) -> Result<u8> {
        self.session(|bus| bus.read_byte(register))
    }

    pub fn dump(&self) -> RegisterDump {
        self.session(|bus| bus.dump())
    }

    /// Releases the underlying bus.
    pub fn release(self) -> I2C {
        self.bus.into_inner()
    }
}

/// Exclusive handle on the bus, valid for one [`Transport::session`].
pub struct Bus<'a, I2C> {
    i2c: &'a mut I2C,
    address: u8,
}

impl<I2C: I2c> Bus<'_, I2C> {
    /// Writes `bytes` starting at `register` in one transaction.
    pub fn write(&mut self, register: u8, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_WRITE_LEN {
            return Err(Error::InvalidArgument("register write too long"));
        }
        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register;
        frame[1..=bytes.len()].copy_from_slice(bytes);

        self.i2c
            .write(self.address, &frame[..=bytes.len()])
            .map_err(|err| {
                let kind = err.kind();
                log::error!("write of register {register:#04x} failed: {kind}");
                Error::Transport { register, kind }
            })
    }

    /// Addresses `register`, then reads `buf.len()` bytes.
    pub fn read(&mut self, register: u8, buf: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(self.address, &[register], buf)
            .map_err(|err| {
                let kind = err.kind();
                log::error!("read of register {register:#04x} failed: {kind}");
                Error::Transport { register, kind }
            })
    }

    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<()> {
        self.write(register, &[value])
    }

    pub fn read_byte(&mut self, register: u8) -> Result<u8> {
        let mut value = [0u8; 1];
        self.read(register, &mut value)?;
        Ok(value[0])
    }

    /// Reads a register, reporting a failed read as zero.
    ///
    /// The failure is still logged by [`Bus::read`].
    pub fn read_or_zero(&mut self, register: u8) -> u8 {
        self.read_byte(register).unwrap_or(0)
    }

    /// Reads every register in [`regs::DUMP_ORDER`] and logs the result.
    ///
    /// Failed reads show up as zero; the dump is diagnostic only.
    pub fn dump(&mut self) -> RegisterDump {
        let mut dump = RegisterDump::default();
        for register in regs::DUMP_ORDER {
            dump.set(register, self.read_or_zero(register));
        }
        log::debug!(
            "regs 0x00={:#04x} 0x01={:#04x} 0x02={:#04x} 0x03={:#04x}",
            dump.status,
            dump.charge_current,
            dump.mode,
            dump.safety
        );
        log::debug!(
            "regs 0x06={:#04x} 0x08={:#04x} 0x09={:#04x} 0x0a={:#04x}",
            dump.chg_stat,
            dump.int1,
            dump.int2,
            dump.control
        );
        dump
    }
}
