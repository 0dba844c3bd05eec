//! GPS (and QZSS) legacy navigation message.
//!
//! Subframes are handed over as words 3 to 10 (TLM and HOW stripped),
//! each word right aligned in a `u32`: bit 1 of the word is bit 29
//! of the integer, parity bits 25 to 30 occupy the 6 LSBs.
use crate::{
    almanac::{AlmanacData, AlmanacEntry, AlmanacHealth, AlmanacKepler, AlmanacReferenceWeek},
    bits::parity,
    constants::{p2, GPS_PI},
    decoder::{split_signed, split_unsigned, word_stream, NavSource, WORD_BITS},
    ephemeris::{Ephemeris, KeplerParameters},
    health::decode_ura_index,
    ionosphere::KbModel,
    prelude::{Code, Constellation, Error, GpsTime, SignalId},
    stream::BitStream,
    time::{adjust_week_cycle, adjust_week_cycle256, WN_UNKNOWN},
    utc::UtcParameters,
};

#[cfg(feature = "log")]
use log::{debug, warn};

/// Words 3 to 10 of one subframe
pub type SubframeWords = [u32; 8];

/// Almanac pages of Block II satellites
const DATA_ID_BLOCK_II: u8 = 1;

/// Subframe 5 page 25 (reference week and health of SV 1 to 24)
pub const SVID_HEALTH_5: u8 = 51;

/// Subframe 4 page 25 (health of SV 25 to 32)
pub const SVID_HEALTH_4: u8 = 63;

/// Subframe 4 page 18 (ionosphere and UTC parameters)
pub const SVID_IONO_UTC: u8 = 56;

/// Almanac fit interval [s]
const ALMANAC_FIT_INTERVAL: u32 = 140 * 3600;

/// Almanac URA [m]
const ALMANAC_URA: f64 = 900.0;

/// Parity equations of D25 to D30. Bit 31 is D29*, bit 30 is D30*,
/// bits 29 to 6 are d1 to d24.
const PARITY_MASKS: [u32; 6] = [
    0xbb1f_3480,
    0x5d8f_9a40,
    0xaec7_cd00,
    0x5763_e680,
    0x6bb1_f340,
    0x8b7a_89c0,
];

/// Data bits d1 to d24
const DATA_MASK: u32 = 0x3fff_ffc0;

/// Stream position of `bit` (1 based) of `word` (3 to 10)
const fn at(word: usize, bit: usize) -> usize {
    (word - 3) * WORD_BITS + bit - 1
}

/// Verifies the parity of one word.
/// `word` holds D29* and D30* (last two bits of the previous word)
/// in bits 31 and 30, followed by the 30 bits of this word.
/// Returns the 24 data bits, with their polarity restored.
pub fn check_word_parity(word: u32) -> Result<u32, Error> {
    let mut word = word;
    if word & (1 << 30) != 0 {
        word ^= DATA_MASK;
    }
    for (index, mask) in PARITY_MASKS.iter().enumerate() {
        if parity(word & mask) as u32 != (word >> (5 - index)) & 0x01 {
            return Err(Error::ParityError);
        }
    }
    Ok((word & DATA_MASK) >> 6)
}

/// Builds the 30 transmitted bits of a word from its 24 data bits,
/// `previous` being the previously transmitted word.
pub fn encode_word(data: u32, previous: u32) -> u32 {
    let d29 = (previous >> 1) & 0x01;
    let d30 = previous & 0x01;
    let source = (d29 << 31) | (d30 << 30) | ((data & 0x00ff_ffff) << 6);
    let mut parity_bits = 0;
    for (index, mask) in PARITY_MASKS.iter().enumerate() {
        parity_bits |= (parity(source & mask) as u32) << (5 - index);
    }
    let mut transmitted = source & DATA_MASK;
    if d30 == 1 {
        transmitted ^= DATA_MASK;
    }
    transmitted | parity_bits
}

/// Curve fit interval [s] from the fit interval flag and IODC.
pub fn decode_fit_interval(flag: bool, iodc: u16) -> u32 {
    let hours = if !flag {
        4
    } else {
        match iodc {
            240..=247 => 8,
            248..=255 | 496 => 14,
            497..=503 | 1021..=1023 => 26,
            504..=510 => 50,
            511 | 752..=756 => 74,
            757 => 98,
            _ => 6,
        }
    };
    hours * 3600
}

/// Decodes subframes 1 to 3 into a Keplerian [Ephemeris].
/// - `tot_tow`: time of week of transmission, resolving toe week
///   ambiguities near the week rollover
/// - `wn_ref`: reference week, resolving the 10-bit week rollover
///   (see [crate::time::GPS_WEEK_REFERENCE])
///
/// The returned ephemeris is marked invalid when the issues of data
/// do not match or toe is not a legal time.
pub fn decode_ephemeris(
    sid: SignalId,
    subframes: &[SubframeWords; 3],
    tot_tow: f64,
    wn_ref: u16,
) -> Result<Ephemeris, Error> {
    match sid.constellation() {
        Constellation::GPS | Constellation::QZSS => {},
        c => return Err(Error::UnsupportedConstellation(c)),
    }

    let mut sf1 = word_stream(&subframes[0]);
    let mut sf2 = word_stream(&subframes[1]);
    let mut sf3 = word_stream(&subframes[2]);

    let mut eph = Ephemeris::new(sid);
    eph.source = NavSource::GpsLnav;

    // subframe 1
    let wn_raw = sf1.peek_unsigned(at(3, 1), 10)? as u16;
    let ura_index = sf1.peek_unsigned(at(3, 13), 4)? as u8;
    let health_bits = sf1.peek_unsigned(at(3, 17), 6)? as u8;
    let iodc = split_unsigned(&mut sf1, (at(3, 23), 2), (at(8, 1), 8))? as u16;
    let tgd = sf1.peek_signed(at(7, 17), 8)? as f64 * p2(-31);
    let toc = sf1.peek_unsigned(at(8, 9), 16)? as f64 * 16.0;
    let af2 = sf1.peek_signed(at(9, 1), 8)? as f64 * p2(-55);
    let af1 = sf1.peek_signed(at(9, 9), 16)? as f64 * p2(-43);
    let af0 = sf1.peek_signed(at(10, 1), 22)? as f64 * p2(-31);

    // subframe 2
    let iode_sf2 = sf2.peek_unsigned(at(3, 1), 8)? as u16;
    let crs = sf2.peek_signed(at(3, 9), 16)? as f64 * p2(-5);
    let dn = sf2.peek_signed(at(4, 1), 16)? as f64 * p2(-43) * GPS_PI;
    let m0 = split_signed(&mut sf2, (at(4, 17), 8), (at(5, 1), 24))? as f64 * p2(-31) * GPS_PI;
    let cuc = sf2.peek_signed(at(6, 1), 16)? as f64 * p2(-29);
    let ecc = split_unsigned(&mut sf2, (at(6, 17), 8), (at(7, 1), 24))? as f64 * p2(-33);
    let cus = sf2.peek_signed(at(8, 1), 16)? as f64 * p2(-29);
    let sqrta = split_unsigned(&mut sf2, (at(8, 17), 8), (at(9, 1), 24))? as f64 * p2(-19);
    let toe = sf2.peek_unsigned(at(10, 1), 16)? as f64 * 16.0;
    let fit_flag = sf2.peek_unsigned(at(10, 17), 1)? == 1;

    // subframe 3
    let cic = sf3.peek_signed(at(3, 1), 16)? as f64 * p2(-29);
    let omega0 =
        split_signed(&mut sf3, (at(3, 17), 8), (at(4, 1), 24))? as f64 * p2(-31) * GPS_PI;
    let cis = sf3.peek_signed(at(5, 1), 16)? as f64 * p2(-29);
    let inc = split_signed(&mut sf3, (at(5, 17), 8), (at(6, 1), 24))? as f64 * p2(-31) * GPS_PI;
    let crc = sf3.peek_signed(at(7, 1), 16)? as f64 * p2(-5);
    let w = split_signed(&mut sf3, (at(7, 17), 8), (at(8, 1), 24))? as f64 * p2(-31) * GPS_PI;
    let omegadot = sf3.peek_signed(at(9, 1), 24)? as f64 * p2(-43) * GPS_PI;
    let iode = sf3.peek_unsigned(at(10, 1), 8)? as u16;
    let inc_dot = sf3.peek_signed(at(10, 9), 14)? as f64 * p2(-43) * GPS_PI;

    eph.toe = GpsTime::new(adjust_week_cycle(wn_raw, wn_ref) as i16, toe);
    let toe_valid = eph.toe.is_valid();
    if toe_valid {
        // next week's ephemeris may still carry the current week number
        let tot = GpsTime::new(eph.toe.wn, tot_tow);
        eph.toe.match_weeks(&tot);
    } else {
        #[cfg(feature = "log")]
        warn!("{} - faulty toe {}: invalidating ephemeris", sid, eph.toe);
    }

    eph.ura = decode_ura_index(ura_index);
    eph.health_bits = health_bits;
    eph.fit_interval = decode_fit_interval(fit_flag, iodc);

    #[cfg(feature = "log")]
    debug!(
        "{} - iodc={:03x} iode={:02x}/{:02x} ura={} health={:02x} fit={}s",
        sid, iodc, iode_sf2, iode, eph.ura, health_bits, eph.fit_interval
    );

    let iode_valid = iode_sf2 == iode && iode == (iodc & 0xff);
    if !iode_valid {
        #[cfg(feature = "log")]
        warn!("{} - iodc/iode mismatch: invalidating ephemeris", sid);
    }
    eph.valid = iode_valid && toe_valid;

    let toc = GpsTime::new(eph.toe.wn, toc);
    *eph.kepler_mut()? = KeplerParameters {
        tgd: [tgd, 0.0],
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
        toc,
        iodc,
        iode,
    };
    Ok(eph)
}

/// Data ID and SV ID of an almanac page
fn page_id<B: AsRef<[u8]>>(page: &BitStream<B>) -> Result<(u8, u8), Error> {
    let data_id = page.peek_unsigned(at(3, 1), 2)? as u8;
    let sv_id = page.peek_unsigned(at(3, 3), 6)? as u8;
    Ok((data_id, sv_id))
}

fn check_data_id(data_id: u8) -> Result<(), Error> {
    if data_id == DATA_ID_BLOCK_II {
        Ok(())
    } else {
        Err(Error::UnexpectedMessageType {
            expected: DATA_ID_BLOCK_II,
            found: data_id,
        })
    }
}

/// Decodes an almanac page (subframe 4 pages 2-5 and 7-10,
/// subframe 5 pages 1-24). The reference week is unknown
/// until [decode_almanac_week] completes it.
pub fn decode_almanac(words: &SubframeWords) -> Result<AlmanacEntry, Error> {
    let mut page = word_stream(words);
    let (data_id, sv_id) = page_id(&page)?;
    check_data_id(data_id)?;

    if !(1..=32).contains(&sv_id) {
        return Err(Error::InvalidSatellite(sv_id as u16));
    }
    let sid = SignalId::new(sv_id as u16, Code::GpsL1CA)?;

    let ecc = page.peek_unsigned(at(3, 9), 16)? as f64 * p2(-21);
    let toa = page.peek_unsigned(at(4, 1), 8)? as f64 * 4096.0;
    let inc = page.peek_signed(at(4, 9), 16)? as f64 * p2(-19) * GPS_PI + 0.3 * GPS_PI;
    let omegadot = page.peek_signed(at(5, 1), 16)? as f64 * p2(-38) * GPS_PI;
    let health_bits = page.peek_unsigned(at(5, 17), 8)? as u8;
    let sqrta = page.peek_unsigned(at(6, 1), 24)? as f64 * p2(-11);
    let omega0 = page.peek_signed(at(7, 1), 24)? as f64 * p2(-23) * GPS_PI;
    let w = page.peek_signed(at(8, 1), 24)? as f64 * p2(-23) * GPS_PI;
    let m0 = page.peek_signed(at(9, 1), 24)? as f64 * p2(-23) * GPS_PI;
    // 8 MSBs, then 3 LSBs after af1
    let af0 = split_signed(&mut page, (at(10, 1), 8), (at(10, 20), 3))? as f64 * p2(-20);
    let af1 = page.peek_signed(at(10, 9), 11)? as f64 * p2(-38);

    Ok(AlmanacEntry {
        sid,
        toa: GpsTime::new(WN_UNKNOWN, toa),
        ura: ALMANAC_URA,
        fit_interval: ALMANAC_FIT_INTERVAL,
        valid: true,
        health_bits,
        data: AlmanacData::Kepler(AlmanacKepler {
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            af0,
            af1,
        }),
    })
}

/// Decodes the almanac reference week (subframe 5 page 25),
/// the 8-bit week being resolved against `wn_ref`.
pub fn decode_almanac_week(
    words: &SubframeWords,
    wn_ref: u16,
) -> Result<AlmanacReferenceWeek, Error> {
    let page = word_stream(words);
    let (data_id, sv_id) = page_id(&page)?;
    check_data_id(data_id)?;
    if sv_id != SVID_HEALTH_5 {
        return Err(Error::UnexpectedMessageType {
            expected: SVID_HEALTH_5,
            found: sv_id,
        });
    }
    let toa = page.peek_unsigned(at(3, 9), 8)? as u32 * 4096;
    let wna = page.peek_unsigned(at(3, 17), 8)? as u16;
    Ok(AlmanacReferenceWeek {
        wna: adjust_week_cycle256(wna, wn_ref),
        toa,
    })
}

/// Decodes the 6-bit health words of subframe 5 page 25 (SV 1 to 24)
/// or subframe 4 page 25 (SV 25 to 32).
pub fn decode_almanac_health(words: &SubframeWords) -> Result<AlmanacHealth, Error> {
    let page = word_stream(words);
    let (data_id, sv_id) = page_id(&page)?;
    check_data_id(data_id)?;

    let mut health = AlmanacHealth::default();
    match sv_id {
        SVID_HEALTH_5 => {
            for (index, bits) in health.health_bits.iter_mut().take(24).enumerate() {
                let (word, chunk) = (4 + index / 4, index % 4);
                *bits = page.peek_unsigned(at(word, 1 + 6 * chunk), 6)? as u8;
            }
            health.valid_mask = 0x00ff_ffff;
        },
        SVID_HEALTH_4 => {
            health.health_bits[24] = page.peek_unsigned(at(8, 19), 6)? as u8;
            for (index, bits) in health.health_bits[25..].iter_mut().enumerate() {
                let (word, chunk) = (9 + index / 4, index % 4);
                *bits = page.peek_unsigned(at(word, 1 + 6 * chunk), 6)? as u8;
            }
            health.valid_mask = 0xff00_0000;
        },
        found => {
            return Err(Error::UnexpectedMessageType {
                expected: SVID_HEALTH_5,
                found,
            })
        },
    }
    Ok(health)
}

/// Opens subframe 4 page 18
fn page18(words: &SubframeWords) -> Result<BitStream<[u8; 38]>, Error> {
    let page = word_stream(words);
    let (data_id, sv_id) = page_id(&page)?;
    check_data_id(data_id)?;
    if sv_id != SVID_IONO_UTC {
        return Err(Error::UnexpectedMessageType {
            expected: SVID_IONO_UTC,
            found: sv_id,
        });
    }
    Ok(page)
}

/// Decodes the Klobuchar coefficients of subframe 4 page 18.
pub fn decode_iono_parameters(words: &SubframeWords) -> Result<KbModel, Error> {
    let page = page18(words)?;
    let coef = |word: usize, bit: usize, scale: f64| -> Result<f64, Error> {
        Ok(page.peek_signed(at(word, bit), 8)? as f64 * scale)
    };
    Ok(KbModel {
        alpha: (
            coef(3, 9, p2(-30))?,
            coef(3, 17, p2(-27))?,
            coef(4, 1, p2(-24))?,
            coef(4, 9, p2(-24))?,
        ),
        beta: (
            coef(4, 17, p2(11))?,
            coef(5, 1, p2(14))?,
            coef(5, 9, p2(16))?,
            coef(5, 17, p2(16))?,
        ),
    })
}

/// Decodes the UTC parameters of subframe 4 page 18,
/// 8-bit weeks being resolved against `wn_ref`.
pub fn decode_utc_parameters(words: &SubframeWords, wn_ref: u16) -> Result<UtcParameters, Error> {
    let mut page = page18(words)?;

    let a1 = page.peek_signed(at(6, 1), 24)? as f64 * p2(-50);
    let a0 = split_signed(&mut page, (at(7, 1), 24), (at(8, 1), 8))? as f64 * p2(-30);
    let tot = page.peek_unsigned(at(8, 9), 8)? as f64 * 4096.0;
    let wnt = page.peek_unsigned(at(8, 17), 8)? as u16;
    let dt_ls = page.peek_signed(at(9, 1), 8)? as i8;
    let wn_lsf = page.peek_unsigned(at(9, 9), 8)? as u16;
    let dn = page.peek_unsigned(at(9, 17), 8)? as u8;
    let dt_lsf = page.peek_signed(at(10, 1), 8)? as i8;

    let tot = GpsTime::new(adjust_week_cycle256(wnt, wn_ref) as i16, tot);
    let wn_lsf = adjust_week_cycle256(wn_lsf, wn_ref) as i16;
    UtcParameters::from_broadcast(a0, a1, tot, wn_lsf, dn, dt_ls, dt_lsf)
}
