// Copyright (c) 2019-2021 The pisim developers

//! Byte-level I/O seams.
//!
//! The simulator consumes a blocking byte source and produces bytes one at a
//! time; these traits are the whole contract. Blanket implementations make
//! any `Read`/`Write` usable, which covers real standard streams, literal
//! string replacements and the in-memory buffers the tests drive.

use std::io::{ErrorKind, Read, Result, Write};

/// A blocking source of single bytes. `None` is end of input.
pub trait ByteSource {
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// A sink accepting single bytes.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8) -> Result<()>;
}

impl<R: Read> ByteSource for R {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<W: Write> ByteSink for W {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte])
    }
}
