//! Galileo I/NAV ephemeris (word types 1 to 5)
use crate::{
    constants::{p2, GPS_PI, WEEK_SECS},
    decoder::NavSource,
    ephemeris::{Ephemeris, KeplerParameters},
    health::{GalileoHealth, INVALID_URA},
    ionosphere::{NgModel, NgRegionFlags},
    prelude::{Constellation, Error, GpsTime, SignalId},
    stream::BitStream,
    time::GAL_WEEK_TO_GPS_WEEK,
};

#[cfg(feature = "log")]
use log::debug;

/// One I/NAV word, 128 bits MSB first
pub type InavWord = [u8; 16];

/// Ephemeris validity [s]
const FIT_INTERVAL: u32 = 4 * 3600;

/// No accuracy prediction available
const SISA_NAPA: u8 = 255;

/// NeQuick-G coefficients and region flags of word 5
const NEQUICK_BITS: usize = 11 + 11 + 14 + 5;

/// Converts a SISA index to metres.
/// Spare indices and NAPA do not have an accuracy.
pub fn decode_sisa(index: u8) -> f64 {
    let index_f = index as f64;
    match index {
        0..=49 => index_f * 0.01,
        50..=74 => 0.5 + (index_f - 50.0) * 0.02,
        75..=99 => 1.0 + (index_f - 75.0) * 0.04,
        100..=125 => 2.0 + (index_f - 100.0) * 0.16,
        _ => INVALID_URA,
    }
}

/// Opens word `word_type`, positioned right after the type tag.
fn open(words: &[InavWord; 5], word_type: u8) -> Result<BitStream<&[u8]>, Error> {
    open_word(&words[word_type as usize - 1], word_type)
}

fn open_word(word: &InavWord, word_type: u8) -> Result<BitStream<&[u8]>, Error> {
    let mut stream = BitStream::from_bytes(&word[..]);
    let found = stream.read_unsigned(6)? as u8;
    if found != word_type {
        return Err(Error::UnexpectedMessageType {
            expected: word_type,
            found,
        });
    }
    Ok(stream)
}

/// Returns the time of week, if legal.
#[cfg_attr(not(feature = "log"), allow(unused_variables))]
fn time_of_week(sid: SignalId, field: &'static str, tow: f64) -> Result<f64, Error> {
    if tow < WEEK_SECS {
        Ok(tow)
    } else {
        #[cfg(feature = "log")]
        debug!("{} - {} out of range: {}", sid, field, tow);
        Err(Error::OutOfRange(field))
    }
}

/// Decodes I/NAV word types 1 to 5 (in this order) into a Keplerian
/// [Ephemeris]. Reference times are resolved against the GST week
/// and time of week broadcast in word 5.
pub fn decode_inav(sid: SignalId, words: &[InavWord; 5]) -> Result<Ephemeris, Error> {
    if sid.constellation() != Constellation::Galileo {
        return Err(Error::UnsupportedConstellation(sid.constellation()));
    }

    // word 1
    let mut w1 = open(words, 1)?;
    let iod_nav = w1.read_unsigned(10)? as u16;
    let toe = w1.read_unsigned(14)? as f64 * 60.0;
    let m0 = w1.read_signed(32)? as f64 * p2(-31) * GPS_PI;
    let ecc = w1.read_unsigned(32)? as f64 * p2(-33);
    let sqrta = w1.read_unsigned(32)? as f64 * p2(-19);

    // word 2
    let mut w2 = open(words, 2)?;
    let iod_2 = w2.read_unsigned(10)? as u16;
    let omega0 = w2.read_signed(32)? as f64 * p2(-31) * GPS_PI;
    let inc = w2.read_signed(32)? as f64 * p2(-31) * GPS_PI;
    let w = w2.read_signed(32)? as f64 * p2(-31) * GPS_PI;
    let inc_dot = w2.read_signed(14)? as f64 * p2(-43) * GPS_PI;

    // word 3
    let mut w3 = open(words, 3)?;
    let iod_3 = w3.read_unsigned(10)? as u16;
    let omegadot = w3.read_signed(24)? as f64 * p2(-43) * GPS_PI;
    let dn = w3.read_signed(16)? as f64 * p2(-43) * GPS_PI;
    let cuc = w3.read_signed(16)? as f64 * p2(-29);
    let cus = w3.read_signed(16)? as f64 * p2(-29);
    let crc = w3.read_signed(16)? as f64 * p2(-5);
    let crs = w3.read_signed(16)? as f64 * p2(-5);
    let sisa = w3.read_unsigned(8)? as u8;

    // word 4
    let mut w4 = open(words, 4)?;
    let iod_4 = w4.read_unsigned(10)? as u16;
    let svid = w4.read_unsigned(6)? as u16;
    let cic = w4.read_signed(16)? as f64 * p2(-29);
    let cis = w4.read_signed(16)? as f64 * p2(-29);
    let toc = w4.read_unsigned(14)? as f64 * 60.0;
    let af0 = w4.read_signed(31)? as f64 * p2(-34);
    let af1 = w4.read_signed(21)? as f64 * p2(-46);
    let af2 = w4.read_signed(6)? as f64 * p2(-59);

    // word 5, see decode_inav_iono for the ionospheric model
    let mut w5 = open(words, 5)?;
    w5.skip(NEQUICK_BITS)?;
    let bgd_e1e5a = w5.read_signed(10)? as f64 * p2(-32);
    let bgd_e1e5b = w5.read_signed(10)? as f64 * p2(-32);
    let e5b_hs = w5.read_unsigned(2)? as u8;
    let e1b_hs = w5.read_unsigned(2)? as u8;
    let e5b_dvs = w5.read_bool()?;
    let e1b_dvs = w5.read_bool()?;
    let wn = w5.read_unsigned(12)? as i16;
    let tow = w5.read_unsigned(20)? as f64;

    if iod_2 != iod_nav || iod_3 != iod_nav || iod_4 != iod_nav {
        #[cfg(feature = "log")]
        debug!(
            "{} - IODnav mismatch: {}/{}/{}/{}",
            sid, iod_nav, iod_2, iod_3, iod_4
        );
        return Err(Error::IssueOfDataMismatch);
    }
    if svid != sid.sat {
        return Err(Error::InvalidSatellite(svid));
    }

    let tow = time_of_week(sid, "tow", tow)?;
    let toe = time_of_week(sid, "toe", toe)?;
    let toc = time_of_week(sid, "toc", toc)?;

    let tot = GpsTime::new(wn + GAL_WEEK_TO_GPS_WEEK, tow);
    let mut toe = GpsTime::new(tot.wn, toe);
    toe.match_weeks(&tot);
    let mut toc = GpsTime::new(tot.wn, toc);
    toc.match_weeks(&tot);

    let health = GalileoHealth::from_inav(e5b_hs, e1b_hs, e5b_dvs, e1b_dvs);

    let mut eph = Ephemeris::new(sid);
    eph.toe = toe;
    eph.ura = if sisa == SISA_NAPA {
        INVALID_URA
    } else {
        decode_sisa(sisa)
    };
    eph.fit_interval = FIT_INTERVAL;
    eph.health_bits = health.to_compact();
    eph.source = NavSource::GalInav;
    eph.valid = true;

    *eph.kepler_mut()? = KeplerParameters {
        tgd: [bgd_e1e5a, bgd_e1e5b],
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
        iodc: iod_nav,
        iode: iod_nav,
    };
    Ok(eph)
}

/// Decodes the NeQuick-G model of I/NAV word 5.
pub fn decode_inav_iono(word: &InavWord) -> Result<NgModel, Error> {
    let mut w5 = open_word(word, 5)?;
    let ai0 = w5.read_unsigned(11)? as f64 * p2(-2);
    let ai1 = w5.read_signed(11)? as f64 * p2(-8);
    let ai2 = w5.read_signed(14)? as f64 * p2(-15);
    let mut region = NgRegionFlags::empty();
    for flag in [
        NgRegionFlags::REGION1,
        NgRegionFlags::REGION2,
        NgRegionFlags::REGION3,
        NgRegionFlags::REGION4,
        NgRegionFlags::REGION5,
    ] {
        region.set(flag, w5.read_bool()?);
    }
    Ok(NgModel {
        a: (ai0, ai1, ai2),
        region,
    })
}
