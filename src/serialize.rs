//! Bitcoin-style "compact size" varint encoding, used only by the PoW-cache
//! file format (`powcache.dat`).

use std::io::{self, Read, Write};

pub fn write_compact_size<W: Write>(w: &mut W, n: u64) -> io::Result<()> {
    if n < 253 {
        w.write_all(&[n as u8])
    } else if n <= 0xffff {
        w.write_all(&[253u8])?;
        w.write_all(&(n as u16).to_le_bytes())
    } else if n <= 0xffff_ffff {
        w.write_all(&[254u8])?;
        w.write_all(&(n as u32).to_le_bytes())
    } else {
        w.write_all(&[255u8])?;
        w.write_all(&n.to_le_bytes())
    }
}

pub fn read_compact_size<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut marker = [0u8; 1];
    r.read_exact(&mut marker)?;
    match marker[0] {
        253 => {
            let mut buf = [0u8; 2];
            r.read_exact(&mut buf)?;
            Ok(u16::from_le_bytes(buf) as u64)
        }
        254 => {
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf) as u64)
        }
        255 => {
            let mut buf = [0u8; 8];
            r.read_exact(&mut buf)?;
            Ok(u64::from_le_bytes(buf))
        }
        small => Ok(small as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_across_size_classes() {
        for n in [0u64, 1, 252, 253, 1000, 0xffff, 0x1_0000, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_compact_size(&mut buf, n).unwrap();
            let mut cursor = &buf[..];
            assert_eq!(read_compact_size(&mut cursor).unwrap(), n);
        }
    }
}
