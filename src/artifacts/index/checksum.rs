//! Running SHA-1 over everything read from or written to the index file

use crate::artifacts::index::CHECKSUM_SIZE;
use sha1::{Digest, Sha1};
use std::io::{self, Read, Write};

/// Stream adapter that hashes every byte passing through it
#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Checksum<T> {
    /// Read the stored checksum and compare it against the running digest
    ///
    /// # Returns
    ///
    /// Whether the stored checksum matches
    pub fn verify(&mut self) -> io::Result<bool> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.inner.read_exact(&mut expected)?;

        let actual = self.digest.clone().finalize();
        Ok(expected == actual.as_slice())
    }
}

impl<T: Write> Checksum<T> {
    /// Append the running digest
    pub fn write_checksum(&mut self) -> io::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.inner.write_all(checksum.as_slice())
    }
}

impl<T: Read> Read for Checksum<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }
}

impl<T: Write> Write for Checksum<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_checksum_verifies_on_read() {
        let mut writer = Checksum::new(Vec::new());
        writer.write_all(b"index body").unwrap();
        writer.write_checksum().unwrap();
        let bytes = writer.into_inner();

        let mut reader = Checksum::new(bytes.as_slice());
        let mut body = [0u8; 10];
        reader.read_exact(&mut body).unwrap();

        assert!(reader.verify().unwrap());
    }

    #[test]
    fn flipped_byte_fails_verification() {
        let mut writer = Checksum::new(Vec::new());
        writer.write_all(b"index body").unwrap();
        writer.write_checksum().unwrap();
        let mut bytes = writer.into_inner();
        bytes[0] ^= 0x01;

        let mut reader = Checksum::new(bytes.as_slice());
        let mut body = [0u8; 10];
        reader.read_exact(&mut body).unwrap();

        assert!(!reader.verify().unwrap());
    }
}
