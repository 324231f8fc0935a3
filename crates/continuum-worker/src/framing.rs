//! Length-delimited framing over byte streams.
//!
//! Both directions of the contract are length-delimited protobuf: a varint
//! byte length followed by the message body. [`write_frame`] emits exactly
//! what prost's own length-delimited encoder produces, and [`read_frame`]
//! consumes it, so the two interoperate with any peer speaking the same
//! delimiting.

use std::io::{Read, Write};

use prost::Message;

use crate::error::FrameError;

/// Write one message with its varint length prefix.
pub fn write_frame<M: Message>(writer: &mut impl Write, message: &M) -> std::io::Result<()> {
    writer.write_all(&message.encode_length_delimited_to_vec())
}

/// Read one length-delimited message from the stream.
pub fn read_frame<M: Message + Default>(reader: &mut impl Read) -> Result<M, FrameError> {
    let length = read_varint(reader)?;
    let mut buffer = vec![0u8; length as usize];
    reader.read_exact(&mut buffer)?;
    Ok(M::decode(buffer.as_slice())?)
}

fn read_varint(reader: &mut impl Read) -> Result<u64, FrameError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        value |= u64::from(byte[0] & 0x7f) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift >= 64 {
            return Err(FrameError::OversizedLengthPrefix);
        }
    }
}
