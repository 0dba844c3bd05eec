//! BeiDou D1 navigation message (subframes 1 to 3).
//!
//! Each subframe is handed over as its ten 30-bit words, right aligned,
//! with the parity bits left in place: bit positions below count from
//! the first bit of word 1.
use crate::{
    constants::{p2, GPS_PI, WEEK_SECS},
    decoder::{split_signed, split_unsigned, word_stream, NavSource},
    ephemeris::{Ephemeris, KeplerParameters},
    health::decode_ura_index,
    prelude::{Constellation, Error, GpsTime, SignalId},
    time::{BDS_SECOND_TO_GPS_SECOND, BDS_WEEK_TO_GPS_WEEK},
};

#[cfg(feature = "log")]
use log::debug;

/// Ten words of one D1 subframe
pub type D1Subframe = [u32; 10];

/// Ephemeris validity [s]
const FIT_INTERVAL: u32 = 3 * 3600;

/// Converts a BDT week and time of week to GPS time
fn bdt_to_gps(week: u16, tow: f64) -> GpsTime {
    GpsTime::new(week as i16 + BDS_WEEK_TO_GPS_WEEK, tow + BDS_SECOND_TO_GPS_SECOND).normalized()
}

/// Decodes D1 subframes 1 to 3 (in this order) into a Keplerian [Ephemeris].
pub fn decode_d1(sid: SignalId, subframes: &[D1Subframe; 3]) -> Result<Ephemeris, Error> {
    if sid.constellation() != Constellation::BeiDou {
        return Err(Error::UnsupportedConstellation(sid.constellation()));
    }

    let mut sf1 = word_stream(&subframes[0]);
    let mut sf2 = word_stream(&subframes[1]);
    let mut sf3 = word_stream(&subframes[2]);

    for (index, sf) in [&sf1, &sf2, &sf3].iter().enumerate() {
        let fra_id = sf.peek_unsigned(15, 3)? as u8;
        let expected = index as u8 + 1;
        if fra_id != expected {
            return Err(Error::UnexpectedMessageType {
                expected,
                found: fra_id,
            });
        }
    }

    // subframe 1
    let sat_h1 = sf1.peek_unsigned(42, 1)? as u8;
    let aodc = sf1.peek_unsigned(43, 5)? as u16;
    let urai = sf1.peek_unsigned(48, 4)? as u8;
    let week = sf1.peek_unsigned(60, 13)? as u16;
    let toc = split_unsigned(&mut sf1, (73, 9), (90, 8))? as f64 * 8.0;
    let tgd1 = sf1.peek_signed(98, 10)? as f64 * 0.1E-9;
    let tgd2 = split_signed(&mut sf1, (108, 4), (120, 6))? as f64 * 0.1E-9;
    let af2 = sf1.peek_signed(214, 11)? as f64 * p2(-66);
    let af0 = split_signed(&mut sf1, (225, 7), (240, 17))? as f64 * p2(-33);
    let af1 = split_signed(&mut sf1, (257, 5), (270, 17))? as f64 * p2(-50);
    let aode = sf1.peek_unsigned(287, 5)? as u16;

    // subframe 2
    let dn = split_signed(&mut sf2, (42, 10), (60, 6))? as f64 * p2(-43) * GPS_PI;
    let cuc = split_signed(&mut sf2, (66, 16), (90, 2))? as f64 * p2(-31);
    let m0 = split_signed(&mut sf2, (92, 20), (120, 12))? as f64 * p2(-31) * GPS_PI;
    let ecc = split_unsigned(&mut sf2, (132, 10), (150, 22))? as f64 * p2(-33);
    let cus = sf2.peek_signed(180, 18)? as f64 * p2(-31);
    let crc = split_signed(&mut sf2, (198, 4), (210, 14))? as f64 * p2(-6);
    let crs = split_signed(&mut sf2, (224, 8), (240, 10))? as f64 * p2(-6);
    let sqrta = split_unsigned(&mut sf2, (250, 12), (270, 20))? as f64 * p2(-19);
    let toe_msb = sf2.peek_unsigned(290, 2)?;

    // subframe 3
    let toe_lsb = split_unsigned(&mut sf3, (42, 10), (60, 5))?;
    let inc = split_signed(&mut sf3, (65, 17), (90, 15))? as f64 * p2(-31) * GPS_PI;
    let cic = split_signed(&mut sf3, (105, 7), (120, 11))? as f64 * p2(-31);
    let omegadot = split_signed(&mut sf3, (131, 11), (150, 13))? as f64 * p2(-43) * GPS_PI;
    let cis = split_signed(&mut sf3, (163, 9), (180, 9))? as f64 * p2(-31);
    let inc_dot = split_signed(&mut sf3, (189, 13), (210, 1))? as f64 * p2(-43) * GPS_PI;
    let omega0 = split_signed(&mut sf3, (211, 21), (240, 11))? as f64 * p2(-31) * GPS_PI;
    let w = split_signed(&mut sf3, (251, 11), (270, 21))? as f64 * p2(-31) * GPS_PI;

    let toe = ((toe_msb << 15) | toe_lsb) as f64 * 8.0;
    for (field, tow) in [("toe", toe), ("toc", toc)] {
        if tow >= WEEK_SECS {
            #[cfg(feature = "log")]
            debug!("{} - {} out of range: {}", sid, field, tow);
            return Err(Error::OutOfRange(field));
        }
    }

    let mut eph = Ephemeris::new(sid);
    eph.toe = bdt_to_gps(week, toe);
    eph.ura = decode_ura_index(urai);
    eph.fit_interval = FIT_INTERVAL;
    eph.health_bits = sat_h1;
    eph.source = NavSource::BdsD1;
    eph.valid = eph.toe.is_valid();

    *eph.kepler_mut()? = KeplerParameters {
        tgd: [tgd1, tgd2],
        crc,
        crs,
        cuc,
        cus,
        cic,
        cis,
        dn,
        m0,
        ecc,
        sqrta,
        omega0,
        omegadot,
        w,
        inc,
        inc_dot,
        af0,
        af1,
        af2,
        toc: bdt_to_gps(week, toc),
        iodc: aodc,
        iode: aode,
    };
    Ok(eph)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{bits::set_unsigned, health::SignalHealth, prelude::Code};

    /// Subframe image, written at absolute bit positions
    struct Subframe([u8; 38]);

    impl Subframe {
        fn new(fra_id: u64) -> Self {
            let mut sf = Self([0; 38]);
            sf.set(15, 3, fra_id);
            sf
        }
        fn set(&mut self, pos: usize, len: usize, value: u64) {
            set_unsigned(&mut self.0, pos, len, value);
        }
        fn set_signed(&mut self, pos: usize, len: usize, value: i64) {
            self.set(pos, len, value as u64 & ((1 << len) - 1));
        }
        /// Writes a field split in two chunks
        fn set_split(&mut self, (pos1, len1): (usize, usize), (pos2, len2): (usize, usize), value: i64) {
            let value = value as u64 & ((1 << (len1 + len2)) - 1);
            self.set(pos1, len1, value >> len2);
            self.set(pos2, len2, value);
        }
        fn words(&self) -> D1Subframe {
            let mut words = [0; 10];
            for (index, word) in words.iter_mut().enumerate() {
                *word = crate::bits::get_unsigned(&self.0, index * 30, 30) as u32;
            }
            words
        }
    }

    fn subframes() -> [D1Subframe; 3] {
        let toe = 345_600_u64 / 8;

        let mut sf1 = Subframe::new(1);
        sf1.set(42, 1, 0);
        sf1.set(43, 5, 12);
        sf1.set(48, 4, 2);
        sf1.set(60, 13, 800);
        sf1.set_split((73, 9), (90, 8), 345_600 / 8);
        sf1.set_signed(98, 10, 25);
        sf1.set_split((108, 4), (120, 6), -30);
        sf1.set_signed(214, 11, 0);
        sf1.set_split((225, 7), (240, 17), -200_000);
        sf1.set_split((257, 5), (270, 17), 3_000);
        sf1.set(287, 5, 7);

        let mut sf2 = Subframe::new(2);
        sf2.set_split((42, 10), (60, 6), 4_000);
        sf2.set_split((66, 16), (90, 2), -9_000);
        sf2.set_split((92, 20), (120, 12), 1_073_741_824);
        sf2.set_split((132, 10), (150, 22), 8_589_935);
        sf2.set_signed(180, 18, 12_000);
        sf2.set_split((198, 4), (210, 14), 10_000);
        sf2.set_split((224, 8), (240, 10), -10_000);
        sf2.set_split((250, 12), (270, 20), 2_829_647_872);
        sf2.set(290, 2, toe >> 15);

        let mut sf3 = Subframe::new(3);
        sf3.set_split((42, 10), (60, 5), (toe & 0x7fff) as i64);
        sf3.set_split((65, 17), (90, 15), 590_000_000);
        sf3.set_split((105, 7), (120, 11), 50);
        sf3.set_split((131, 11), (150, 13), -35_000);
        sf3.set_split((163, 9), (180, 9), -50);
        sf3.set_split((189, 13), (210, 1), 100);
        sf3.set_split((211, 21), (240, 11), -700_000_000);
        sf3.set_split((251, 11), (270, 21), 300_000_000);

        [sf1.words(), sf2.words(), sf3.words()]
    }

    #[test]
    fn ephemeris_decoding() {
        let sid = SignalId::new(12, Code::Bds2B1).unwrap();
        let eph = decode_d1(sid, &subframes()).unwrap();

        assert!(eph.valid);
        assert_eq!(eph.source, NavSource::BdsD1);
        assert_eq!(eph.toe, GpsTime::new(2156, 345_614.0));
        assert_eq!(eph.ura, 4.0);
        assert_eq!(eph.fit_interval, 10_800);
        assert_eq!(eph.health_bits, 0);
        assert!(eph.is_healthy(Code::Bds2B1));

        let k = eph.kepler().unwrap();
        assert_eq!(k.toc, GpsTime::new(2156, 345_614.0));
        assert_eq!(k.iodc, 12);
        assert_eq!(k.iode, 7);
        assert_eq!(k.tgd, [25.0 * 0.1E-9, -30.0 * 0.1E-9]);
        assert_eq!(k.af0, -200_000.0 * p2(-33));
        assert_eq!(k.af1, 3_000.0 * p2(-50));
        assert_eq!(k.af2, 0.0);
        assert_eq!(k.dn, 4_000.0 * p2(-43) * GPS_PI);
        assert_eq!(k.cuc, -9_000.0 * p2(-31));
        assert_eq!(k.m0, 0.5 * GPS_PI);
        assert_eq!(k.ecc, 8_589_935.0 * p2(-33));
        assert_eq!(k.cus, 12_000.0 * p2(-31));
        assert_eq!(k.crc, 10_000.0 * p2(-6));
        assert_eq!(k.crs, -10_000.0 * p2(-6));
        assert_eq!(k.sqrta, 2_829_647_872.0 * p2(-19));
        assert_eq!(k.inc, 590_000_000.0 * p2(-31) * GPS_PI);
        assert_eq!(k.cic, 50.0 * p2(-31));
        assert_eq!(k.omegadot, -35_000.0 * p2(-43) * GPS_PI);
        assert_eq!(k.cis, -50.0 * p2(-31));
        assert_eq!(k.inc_dot, 100.0 * p2(-43) * GPS_PI);
        assert_eq!(k.omega0, -700_000_000.0 * p2(-31) * GPS_PI);
        assert_eq!(k.w, 300_000_000.0 * p2(-31) * GPS_PI);

        assert_eq!(eph.tgd_correction(Code::Bds2B2), Ok(-30.0 * 0.1E-9));
    }

    #[test]
    fn week_rollover() {
        let sid = SignalId::new(12, Code::Bds2B1).unwrap();
        let mut sf = subframes();
        // toe = 604792 s BDT
        let toe = 604_792_u64 / 8;
        sf[1][9] = (sf[1][9] & !(0x03 << 8)) | (((toe >> 15) as u32) << 8);
        let mut sf3 = Subframe([0; 38]);
        for (index, word) in sf[2].iter().enumerate() {
            sf3.set(index * 30, 30, *word as u64);
        }
        sf3.set_split((42, 10), (60, 5), (toe & 0x7fff) as i64);
        sf[2] = sf3.words();

        let eph = decode_d1(sid, &sf).unwrap();
        assert_eq!(eph.toe, GpsTime::new(2157, 6.0));
    }

    #[test]
    fn unhealthy_satellite() {
        let sid = SignalId::new(12, Code::Bds2B1).unwrap();
        let mut sf = subframes();
        // SatH1: word 2, bit 13
        sf[0][1] |= 1 << (29 - 12);
        let eph = decode_d1(sid, &sf).unwrap();
        assert_eq!(eph.health_bits, 1);
        assert!(!eph.is_healthy(Code::Bds2B1));
    }

    #[test]
    fn rejected_subframes() {
        let sid = SignalId::new(12, Code::Bds2B1).unwrap();
        let mut sf = subframes();
        sf.swap(1, 2);
        assert_eq!(
            decode_d1(sid, &sf),
            Err(Error::UnexpectedMessageType {
                expected: 2,
                found: 3
            })
        );

        let gal = SignalId::new(12, Code::GalE1B).unwrap();
        assert_eq!(
            decode_d1(gal, &subframes()),
            Err(Error::UnsupportedConstellation(Constellation::Galileo))
        );
    }
}
