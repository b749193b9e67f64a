//! Forward-only byte cursor over a telegram.

use crate::error::DvError;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;

type NomError<'a> = nom::error::Error<&'a [u8]>;

/// Walks a telegram strictly forward; offsets are absolute within `data`.
#[derive(Debug, Clone)]
pub struct DvCursor<'a> {
    data: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> DvCursor<'a> {
    /// Positions a cursor at `start` within `data`.
    pub fn new(data: &'a [u8], start: usize) -> Result<Self, DvError> {
        let remaining = data.get(start..).ok_or_else(|| DvError::PayloadTruncated {
            offset: data.len(),
            needed: start - data.len(),
            available: 0,
        })?;
        Ok(Self { data, remaining })
    }

    pub fn offset(&self) -> usize {
        self.data.len() - self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.remaining.first().copied()
    }

    pub fn next_byte(&mut self) -> Result<u8, DvError> {
        let (rest, byte) = be_u8::<_, NomError<'a>>(self.remaining)
            .map_err(|_| self.truncated(1))?;
        self.remaining = rest;
        Ok(byte)
    }

    pub fn take(&mut self, count: usize) -> Result<&'a [u8], DvError> {
        let (rest, bytes) = take::<_, _, NomError<'a>>(count)(self.remaining)
            .map_err(|_| self.truncated(count))?;
        self.remaining = rest;
        Ok(bytes)
    }

    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = self.remaining;
        self.remaining = &self.remaining[rest.len()..];
        rest
    }

    fn truncated(&self, needed: usize) -> DvError {
        DvError::PayloadTruncated {
            offset: self.offset(),
            needed,
            available: self.remaining.len(),
        }
    }
}
