//! Packbits run-length codec used for compressed raster lines.
//!
//! A packed buffer is a sequence of runs, each introduced by a header byte
//! read as `i8`:
//!
//! ```text
//!  0 ..= 127    literal run, copy the next n + 1 bytes verbatim
//! -127 ..= -1   repeat run, repeat the next byte 1 - n times (2 ..= 128)
//! -128          no-op, skipped by the decoder and never produced
//! ```

use crate::error::CodecError;

/// Longest literal or repeat run a single header can describe.
pub const MAX_RUN: usize = 128;

/// Pack `data` with a greedy scan.
///
/// Repeats of two or more equal bytes become repeat runs, everything else is
/// gathered into literal runs. Both kinds are split at [`MAX_RUN`].
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
    let mut i = 0;

    while i < data.len() {
        let run_value = data[i];
        let mut run_length = 1;

        while i + run_length < data.len()
            && run_length < MAX_RUN
            && data[i + run_length] == run_value
        {
            run_length += 1;
        }

        if run_length > 1 {
            packed.push((1 - run_length as i16) as i8 as u8);
            packed.push(run_value);
            i += run_length;
        } else {
            // stop right before the next pair, it is cheaper as a repeat run
            let mut literal_run = 1;
            while i + literal_run < data.len()
                && literal_run < MAX_RUN
                && !(i + literal_run + 1 < data.len()
                    && data[i + literal_run] == data[i + literal_run + 1])
            {
                literal_run += 1;
            }

            packed.push(literal_run as u8 - 1);
            packed.extend_from_slice(&data[i..i + literal_run]);
            i += literal_run;
        }
    }

    packed
}

/// Expand a packed buffer.
///
/// Fails only when a run header promises more bytes than the buffer holds.
pub fn decode(packed: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut data = Vec::with_capacity(packed.len() * 2);
    let mut i = 0;

    while i < packed.len() {
        let offset = i;
        let header = packed[i] as i8;
        i += 1;

        match header {
            -128 => continue,
            0..=127 => {
                let len = header as usize + 1;
                let available = packed.len() - i;
                if available < len {
                    return Err(CodecError::TruncatedRun {
                        offset,
                        needed: len - available,
                    });
                }
                data.extend_from_slice(&packed[i..i + len]);
                i += len;
            }
            _ => {
                let len = (1 - header as i16) as usize;
                let value = *packed
                    .get(i)
                    .ok_or(CodecError::TruncatedRun { offset, needed: 1 })?;
                data.resize(data.len() + len, value);
                i += 1;
            }
        }
    }

    Ok(data)
}
