//! SBAS L1 message type 9 (GEO navigation message)
use crate::{
    bits::bit_copy,
    constants::p2,
    decoder::NavSource,
    ephemeris::{Ephemeris, XyzParameters},
    health::decode_ura_index,
    prelude::{Error, GpsTime, SignalId, Vector3},
    stream::BitStream,
};

#[cfg(feature = "log")]
use log::debug;

/// Message length, CRC included [bits]
pub const SBAS_MESSAGE_BITS: usize = 250;

/// Bits covered by the CRC
const CRC_COVERAGE: usize = 226;

/// GEO navigation message
const MT_GEO_NAVIGATION: u8 = 9;

/// URA index of a satellite that must not be used
const URA_DO_NOT_USE: u8 = 15;

/// Ephemeris validity [s]
const FIT_INTERVAL: u32 = 240;

const DAY_SECS: f64 = 86_400.0;

/// CRC-24Q of the first 226 bits of `msg`.
/// `msg` must hold at least 226 bits.
fn checksum(msg: &[u8]) -> u32 {
    // right aligned: leading zeros do not alter a zero-initialized CRC
    let mut buf = [0_u8; 29];
    bit_copy(&mut buf, 6, msg, 0, CRC_COVERAGE);
    let crc24q = crc::Crc::<u32>::new(&crc::CRC_24_LTE_A);
    crc24q.checksum(&buf)
}

/// Message type of a raw SBAS message
pub fn message_type(msg: &[u8]) -> Result<u8, Error> {
    let stream = BitStream::new(msg, SBAS_MESSAGE_BITS);
    Ok(stream.peek_unsigned(8, 6)? as u8)
}

/// Decodes a type 9 message, `tot` being its time of reception,
/// into a direct position [Ephemeris].
/// The 13-bit reference time of day is resolved to the day closest to `tot`.
pub fn decode_mt9(sid: SignalId, msg: &[u8], tot: GpsTime) -> Result<Ephemeris, Error> {
    let constellation = sid.constellation();
    if !constellation.is_sbas() {
        return Err(Error::UnsupportedConstellation(constellation));
    }
    if !tot.is_valid() {
        return Err(Error::InvalidTime);
    }

    let mut stream = BitStream::new(msg, SBAS_MESSAGE_BITS);
    if stream.len() < SBAS_MESSAGE_BITS {
        return Err(Error::NotEnoughBits);
    }

    let found = stream.peek_unsigned(8, 6)? as u8;
    if found != MT_GEO_NAVIGATION {
        return Err(Error::UnexpectedMessageType {
            expected: MT_GEO_NAVIGATION,
            found,
        });
    }

    let crc = stream.peek_unsigned(CRC_COVERAGE, 24)? as u32;
    if crc != checksum(msg) {
        #[cfg(feature = "log")]
        debug!("{} - MT9 checksum mismatch", sid);
        return Err(Error::ChecksumMismatch);
    }

    // preamble, message type, IODN
    stream.skip(8 + 6 + 8)?;
    let t0 = stream.read_unsigned(13)? as f64 * 16.0;
    let ura_index = stream.read_unsigned(4)? as u8;

    let x = stream.read_signed(30)? as f64 * 0.08;
    let y = stream.read_signed(30)? as f64 * 0.08;
    let z = stream.read_signed(25)? as f64 * 0.4;
    let vx = stream.read_signed(17)? as f64 * 0.000625;
    let vy = stream.read_signed(17)? as f64 * 0.000625;
    let vz = stream.read_signed(18)? as f64 * 0.004;
    let ax = stream.read_signed(10)? as f64 * 0.0000125;
    let ay = stream.read_signed(10)? as f64 * 0.0000125;
    let az = stream.read_signed(10)? as f64 * 0.0000625;
    let a_gf0 = stream.read_signed(12)? as f64 * p2(-31);
    let a_gf1 = stream.read_signed(8)? as f64 * p2(-40);

    let day_start = tot.tow - tot.tow % DAY_SECS;
    let mut dt = day_start + t0 - tot.tow;
    if dt > DAY_SECS / 2.0 {
        dt -= DAY_SECS;
    } else if dt < -DAY_SECS / 2.0 {
        dt += DAY_SECS;
    }

    let mut eph = Ephemeris::new(sid);
    eph.toe = tot.add_secs(dt);
    eph.ura = decode_ura_index(ura_index);
    eph.fit_interval = FIT_INTERVAL;
    eph.health_bits = (ura_index == URA_DO_NOT_USE) as u8;
    eph.source = NavSource::SbasL1;
    eph.valid = true;

    *eph.xyz_mut()? = XyzParameters {
        pos: Vector3::new(x, y, z),
        vel: Vector3::new(vx, vy, vz),
        acc: Vector3::new(ax, ay, az),
        a_gf0,
        a_gf1,
    };
    Ok(eph)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        bits::{set_signed, set_unsigned},
        health::SignalHealth,
        prelude::{Code, Constellation},
    };

    /// Sealed type 9 message, `t0` being the reference time of day [s]
    fn message(ura: u64, t0: u64) -> [u8; 32] {
        let mut msg = [0_u8; 32];
        set_unsigned(&mut msg, 0, 8, 0x53);
        set_unsigned(&mut msg, 8, 6, 9);
        set_unsigned(&mut msg, 14, 8, 0);
        set_unsigned(&mut msg, 22, 13, t0 / 16);
        set_unsigned(&mut msg, 35, 4, ura);
        set_signed(&mut msg, 39, 30, 500_000_000);
        set_signed(&mut msg, 69, 30, 30_000_000);
        set_signed(&mut msg, 99, 25, -10_000);
        set_signed(&mut msg, 124, 17, 1_600);
        set_signed(&mut msg, 141, 17, -1_600);
        set_signed(&mut msg, 158, 18, 250);
        set_signed(&mut msg, 176, 10, -8);
        set_signed(&mut msg, 186, 10, 8);
        set_signed(&mut msg, 196, 10, 2);
        set_signed(&mut msg, 206, 12, -100);
        set_signed(&mut msg, 218, 8, 3);
        let crc = checksum(&msg);
        set_unsigned(&mut msg, 226, 24, crc as u64);
        msg
    }

    #[test]
    fn crc24q() {
        // check value of the CRC-24Q ("123456789")
        let crc24q = crc::Crc::<u32>::new(&crc::CRC_24_LTE_A);
        assert_eq!(crc24q.checksum(b"123456789"), 0xcde703);
    }

    #[test]
    fn geo_navigation() {
        let sid = SignalId::new(123, Code::SbasL1CA).unwrap();
        let msg = message(2, 43_200);
        assert_eq!(message_type(&msg), Ok(9));

        let tot = GpsTime::new(2200, 3.0 * 86_400.0 + 43_210.0);
        let eph = decode_mt9(sid, &msg, tot).unwrap();
        assert!(eph.valid);
        assert_eq!(eph.source, NavSource::SbasL1);
        assert_eq!(eph.toe, GpsTime::new(2200, 3.0 * 86_400.0 + 43_200.0));
        assert_eq!(eph.ura, 4.0);
        assert_eq!(eph.fit_interval, 240);
        assert_eq!(eph.health_bits, 0);
        assert!(eph.is_healthy(Code::SbasL1CA));

        let xyz = eph.xyz().unwrap();
        assert_eq!(
            xyz.pos,
            Vector3::new(500_000_000.0 * 0.08, 30_000_000.0 * 0.08, -10_000.0 * 0.4)
        );
        assert_eq!(
            xyz.vel,
            Vector3::new(1_600.0 * 0.000625, -1_600.0 * 0.000625, 250.0 * 0.004)
        );
        assert_eq!(
            xyz.acc,
            Vector3::new(-8.0 * 0.0000125, 8.0 * 0.0000125, 2.0 * 0.0000625)
        );
        assert_eq!(xyz.a_gf0, -100.0 * p2(-31));
        assert_eq!(xyz.a_gf1, 3.0 * p2(-40));
    }

    #[test]
    fn day_boundaries() {
        let sid = SignalId::new(123, Code::SbasL1CA).unwrap();

        // t0 = 23:59:44 received right after midnight: previous day
        let msg = message(2, 86_384);
        let tot = GpsTime::new(2200, 86_400.0 + 10.0);
        let eph = decode_mt9(sid, &msg, tot).unwrap();
        assert_eq!(eph.toe, GpsTime::new(2200, 86_384.0));

        // same, across the week boundary
        let tot = GpsTime::new(2200, 10.0);
        let eph = decode_mt9(sid, &msg, tot).unwrap();
        assert_eq!(eph.toe, GpsTime::new(2199, 604_784.0));

        // t0 = 00:00:16 received right before midnight: next day
        let msg = message(2, 16);
        let tot = GpsTime::new(2200, 86_390.0);
        let eph = decode_mt9(sid, &msg, tot).unwrap();
        assert_eq!(eph.toe, GpsTime::new(2200, 86_416.0));
    }

    #[test]
    fn do_not_use() {
        let sid = SignalId::new(123, Code::SbasL1CA).unwrap();
        let msg = message(15, 43_200);
        let eph = decode_mt9(sid, &msg, GpsTime::new(2200, 43_200.0)).unwrap();
        assert_eq!(eph.health_bits, 1);
        assert!(!eph.is_healthy(Code::SbasL1CA));
    }

    #[test]
    fn rejected_messages() {
        let sid = SignalId::new(123, Code::SbasL1CA).unwrap();
        let tot = GpsTime::new(2200, 43_200.0);

        let mut msg = message(2, 43_200);
        msg[10] ^= 0x10;
        assert_eq!(decode_mt9(sid, &msg, tot), Err(Error::ChecksumMismatch));

        let mut msg = message(2, 43_200);
        set_unsigned(&mut msg, 8, 6, 17);
        assert_eq!(
            decode_mt9(sid, &msg, tot),
            Err(Error::UnexpectedMessageType {
                expected: 9,
                found: 17
            })
        );

        let msg = message(2, 43_200);
        assert_eq!(decode_mt9(sid, &msg[..30], tot), Err(Error::NotEnoughBits));
        assert_eq!(
            decode_mt9(sid, &msg, GpsTime::UNKNOWN),
            Err(Error::InvalidTime)
        );

        let gps = SignalId::new(3, Code::GpsL1CA).unwrap();
        assert_eq!(
            decode_mt9(gps, &msg, tot),
            Err(Error::UnsupportedConstellation(Constellation::GPS))
        );
    }
}
