//! SSH wire primitives (RFC 4251 §5) shared by the agent codec and the
//! public key encoders.

use bytes::{Buf, BufMut, Bytes};

use crate::core::errors::{AgentError, Result};

/// Cursor over a received message body.
pub struct WireReader {
    buf: Bytes,
}

impl WireReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        if self.buf.remaining() < wanted {
            return Err(AgentError::protocol(format!(
                "truncated message: wanted {wanted} bytes, {} left",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Length-prefixed byte string.
    pub fn read_string(&mut self) -> Result<Bytes> {
        let len = self.read_u32()? as usize;
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    pub fn read_utf8(&mut self) -> Result<String> {
        let raw = self.read_string()?;
        String::from_utf8(raw.to_vec()).map_err(|_| AgentError::protocol("string is not UTF-8"))
    }

    /// Unsigned multiple-precision integer, returned as big-endian magnitude
    /// without leading zero bytes.
    pub fn read_mpint(&mut self) -> Result<Vec<u8>> {
        let raw = self.read_string()?;
        if raw.first().is_some_and(|b| b & 0x80 != 0) {
            return Err(AgentError::protocol("negative mpint"));
        }
        let start = raw.iter().position(|&b| b != 0).unwrap_or(raw.len());
        Ok(raw[start..].to_vec())
    }

    /// Fail if anything is left over.
    pub fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AgentError::protocol(format!(
                "{} trailing bytes",
                self.remaining()
            )))
        }
    }
}

/// Writers for the SSH wire types.
pub trait WireWrite {
    fn put_string(&mut self, data: &[u8]);
    fn put_mpint(&mut self, magnitude: &[u8]);
}

impl<B: BufMut> WireWrite for B {
    fn put_string(&mut self, data: &[u8]) {
        self.put_u32(data.len() as u32);
        self.put_slice(data);
    }

    fn put_mpint(&mut self, magnitude: &[u8]) {
        let start = magnitude.iter().position(|&b| b != 0).unwrap_or(magnitude.len());
        let digits = &magnitude[start..];
        if digits.first().is_some_and(|b| b & 0x80 != 0) {
            self.put_u32(digits.len() as u32 + 1);
            self.put_u8(0);
            self.put_slice(digits);
        } else {
            self.put_string(digits);
        }
    }
}
