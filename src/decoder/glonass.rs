//! GLONASS FDMA navigation strings.
//!
//! A superframe carries five immediate data strings (types 1 to 5)
//! describing the transmitting satellite. Each string holds 85
//! significant bits, numbered from 1 (LSB of the first word) to 85,
//! bits 1 to 8 being the Hamming check bits.
//!
//! Strings are decoded one at a time into a caller owned [Ephemeris].
//! A string that fails the error detection, carries an unexpected type
//! or a quantity outside of the published bounds is rejected and the
//! [Ephemeris] is left untouched.
use crate::{
    bits::parity,
    constants::p2,
    decoder::NavSource,
    ephemeris::Ephemeris,
    fcn::{FcnRegistry, RegistryLock, FCN_UNKNOWN, NUM_SLOTS},
    health::INVALID_URA,
    prelude::{Error, GloTime, SignalId},
    stream::BitStream,
};

#[cfg(feature = "log")]
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Significant bits in a navigation string
pub const GLO_STRING_BITS: u16 = 85;

/// Bits held by the three words
const STRING_CAPACITY: usize = 96;

/// Check bit masks, applied to the three words, for C1 to C7
const CHECK_MASKS: [[u32; 3]; 7] = [
    [0xaaad_5b00, 0x5555_5556, 0x000a_aaab],
    [0x3336_6d00, 0x9999_999b, 0x000c_cccd],
    [0xc3c7_8e00, 0xe1e1_e1e3, 0x0010_f0f1],
    [0xfc07_f000, 0xfe01_fe03, 0x0000_ff01],
    [0xfff8_0000, 0xfffe_0003, 0x001f_0001],
    [0x0000_0000, 0xffff_fffc, 0x0000_0001],
    [0x0000_0000, 0x0000_0000, 0x001f_fffe],
];

/// 2⁻¹¹ km
const POSITION_UNIT: f64 = 0.488_281_25;
/// 2⁻²⁰ km.s⁻¹
const VELOCITY_UNIT: f64 = 9.536_743_164_062_5E-4;
/// 2⁻³⁰ km.s⁻²
const ACCELERATION_UNIT: f64 = 9.313_225_746_154_785E-7;

const POSITION_MAX: f64 = 2.7E7;
const VELOCITY_MAX: f64 = 4.3E3;
const ACCELERATION_MAX: f64 = 6.2E-6;
const TK_MAX_HOURS: u8 = 23;
const TK_MAX_MINUTES: u8 = 59;
const TB_MIN_SECS: u32 = 900;
const TB_MAX_SECS: u32 = 85_500;
const GAMMA_MAX: f64 = 9.313_225_746_154_785E-10;
const TAU_MAX: f64 = 1.953_125E-3;
const D_TAU_MAX: f64 = 13.97E-9;
const NT_MAX_DAYS: u16 = 1461;
const TAU_GPS_MAX: f64 = 1.9E-3;

/// Accuracy [m] per Ft index
const FT_ACCURACY: [f64; 16] = [
    1.0,
    2.0,
    2.5,
    4.0,
    5.0,
    7.0,
    10.0,
    12.0,
    14.0,
    16.0,
    32.0,
    64.0,
    128.0,
    256.0,
    512.0,
    INVALID_URA,
];

/// Interval between adjacent tb values, per P1 index [min]
const P1_MINUTES: [u32; 4] = [0, 30, 45, 60];

/// Margin added to the P1 interval, so consecutive ephemerides overlap
const FIT_INTERVAL_MARGIN_SECS: u32 = 600;

/// Outcome of the string error detection
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorDetection {
    /// String may be trusted as is
    Clean,
    /// Single bit error at this position (9..=85): invert it first
    Correct(u8),
    /// Multiple errors, string must be dropped
    Uncorrectable,
}

impl From<ErrorDetection> for i8 {
    fn from(detection: ErrorDetection) -> Self {
        match detection {
            ErrorDetection::Clean => 0,
            ErrorDetection::Correct(index) => index as i8,
            ErrorDetection::Uncorrectable => -1,
        }
    }
}

/// One GLONASS navigation string: bit 1 is the LSB of `words[0]`,
/// bit 33 the LSB of `words[1]`, bit 65 the LSB of `words[2]`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavString {
    pub words: [u32; 3],
}

impl NavString {
    pub fn new(words: [u32; 3]) -> Self {
        Self { words }
    }

    /// Big endian image: bit 96 first, bit 1 last
    fn to_bytes(&self) -> [u8; 12] {
        let mut bytes = [0_u8; 12];
        for (chunk, word) in bytes.chunks_mut(4).zip(self.words.iter().rev()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    fn from_bytes(bytes: [u8; 12]) -> [u32; 3] {
        let mut words = [0_u32; 3];
        for (word, chunk) in words.iter_mut().rev().zip(bytes.chunks(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }

    /// MSB first stream position of a field whose LSB is bit `index`
    fn position(index: u16, len: u8) -> Result<usize, Error> {
        if len == 0 || len > 32 {
            return Err(Error::InvalidFieldWidth(len as usize));
        }
        if index == 0 {
            return Err(Error::OutOfRange("bit index"));
        }
        (STRING_CAPACITY + 1)
            .checked_sub(index as usize + len as usize)
            .ok_or(Error::NotEnoughBits)
    }

    /// Extracts `len` bits (1..=32), bit `index` being the LSB of the result.
    pub fn extract(&self, index: u16, len: u8) -> Result<u32, Error> {
        let pos = Self::position(index, len)?;
        let stream = BitStream::new(self.to_bytes(), STRING_CAPACITY);
        Ok(stream.peek_unsigned(pos, len as usize)? as u32)
    }

    /// Writes the `len` LSBs of `value`, bit `index` receiving the LSB.
    pub fn insert(&mut self, index: u16, len: u8, value: u32) -> Result<(), Error> {
        let pos = Self::position(index, len)?;
        let mut stream = BitStream::new(self.to_bytes(), STRING_CAPACITY);
        stream.seek(pos)?;
        stream.write_unsigned(len as usize, value as u64)?;
        self.words = Self::from_bytes(stream.into_inner());
        Ok(())
    }

    /// Inverts bit `index`
    pub fn flip(&mut self, index: u16) -> Result<(), Error> {
        let bit = self.extract(index, 1)?;
        self.insert(index, 1, bit ^ 0x01)
    }

    /// String type, from bits 81 to 84
    pub fn string_type(&self) -> u8 {
        ((self.words[2] >> 16) & 0x0f) as u8
    }

    /// Reads a magnitude of `len` bits followed by its sign bit
    pub fn sign_magnitude(&self, index: u16, len: u8) -> Result<i64, Error> {
        let magnitude = self.extract(index, len)? as i64;
        if self.extract(index + len as u16, 1)? == 1 {
            Ok(-magnitude)
        } else {
            Ok(magnitude)
        }
    }

    /// Writes `value` as a magnitude of `len` bits followed by its sign bit
    pub fn insert_sign_magnitude(&mut self, index: u16, len: u8, value: i64) -> Result<(), Error> {
        let magnitude = value.unsigned_abs();
        if len >= 32 || magnitude >= 1_u64 << len {
            return Err(Error::OutOfRange("magnitude"));
        }
        self.insert(index, len, magnitude as u32)?;
        self.insert(index + len as u16, 1, (value < 0) as u32)
    }

    /// Position [m], velocity [m.s⁻¹] and acceleration [m.s⁻²]
    /// along the axis described by strings 1 to 3.
    pub fn motion(&self) -> Result<(f64, f64, f64), Error> {
        let pos = self.sign_magnitude(9, 26)? as f64 * POSITION_UNIT;
        let vel = self.sign_magnitude(41, 23)? as f64 * VELOCITY_UNIT;
        let acc = self.sign_magnitude(36, 4)? as f64 * ACCELERATION_UNIT;
        Ok((pos, vel, acc))
    }

    /// Quantizes and writes the quantities read by [Self::motion].
    pub fn set_motion(&mut self, pos: f64, vel: f64, acc: f64) -> Result<(), Error> {
        let quantize = |value: f64, unit: f64| {
            if value.is_finite() {
                Ok((value / unit).round() as i64)
            } else {
                Err(Error::OutOfRange("motion"))
            }
        };
        self.insert_sign_magnitude(9, 26, quantize(pos, POSITION_UNIT)?)?;
        self.insert_sign_magnitude(41, 23, quantize(vel, VELOCITY_UNIT)?)?;
        self.insert_sign_magnitude(36, 4, quantize(acc, ACCELERATION_UNIT)?)
    }

    /// Runs the Hamming code verification.
    pub fn error_detection(&self) -> ErrorDetection {
        let [w0, w1, w2] = self.words;
        let mut syndrome = 0_u16;
        let mut bits_set = 0;
        let mut highest = 0_u16;

        for (i, mask) in CHECK_MASKS.iter().enumerate() {
            let beta = ((w0 >> i) & 0x01) as u8;
            let c = beta ^ parity(w0 & mask[0]) ^ parity(w1 & mask[1]) ^ parity(w2 & mask[2]);
            if c == 1 {
                syndrome |= 1 << i;
                bits_set += 1;
                highest = i as u16 + 1;
            }
        }

        let c_sum = parity(w0 & 0xffff_ff00) ^ parity(w1) ^ parity(w2) ^ parity(w0 & 0xff);

        match (bits_set, c_sum) {
            (0, 0) | (1, 1) => ErrorDetection::Clean,
            (n, 1) if n > 1 => {
                let index = syndrome + 8 - highest;
                if index > GLO_STRING_BITS {
                    ErrorDetection::Uncorrectable
                } else {
                    ErrorDetection::Correct(index as u8)
                }
            },
            _ => ErrorDetection::Uncorrectable,
        }
    }

    /// Applies the correction designated by [Self::error_detection].
    pub fn correct(&mut self) -> Result<(), Error> {
        match self.error_detection() {
            ErrorDetection::Clean => Ok(()),
            ErrorDetection::Correct(index) => self.flip(index as u16),
            ErrorDetection::Uncorrectable => Err(Error::UncorrectableString),
        }
    }

    /// Computes and writes check bits 1 to 8 over the data bits.
    pub fn seal(&mut self) {
        self.words[0] &= 0xffff_ff00;
        let [w0, w1, w2] = self.words;
        let mut check = 0_u32;
        for (i, mask) in CHECK_MASKS.iter().enumerate() {
            let beta = parity(w0 & mask[0]) ^ parity(w1 & mask[1]) ^ parity(w2 & mask[2]);
            check |= (beta as u32) << i;
        }
        let data = parity(w0) ^ parity(w1) ^ parity(w2);
        check |= ((parity(check) ^ data) as u32) << 7;
        self.words[0] |= check;
    }
}

/// Corrects a copy of `string` and verifies its type
#[cfg_attr(not(feature = "log"), allow(unused_variables))]
fn checked(string: &NavString, sid: &SignalId, expected: u8) -> Result<NavString, Error> {
    let mut string = *string;
    if let Err(e) = string.correct() {
        #[cfg(feature = "log")]
        debug!("{} - string #{}: checksum mismatch", sid, expected);
        return Err(e);
    }
    let found = string.string_type();
    if found != expected {
        return Err(Error::UnexpectedMessageType { expected, found });
    }
    Ok(string)
}

#[cfg_attr(not(feature = "log"), allow(unused_variables))]
fn bounded(sid: &SignalId, field: &'static str, value: f64, max: f64) -> Result<f64, Error> {
    if value < -max || value > max {
        #[cfg(feature = "log")]
        debug!("{} - {} out of range: {:e}", sid, field, value);
        return Err(Error::OutOfRange(field));
    }
    Ok(value)
}

/// Range checked motion along `axis`
fn motion(string: &NavString, sid: &SignalId, axis: usize) -> Result<(f64, f64, f64), Error> {
    const FIELDS: [[&str; 3]; 3] = [
        ["x position", "x velocity", "x acceleration"],
        ["y position", "y velocity", "y acceleration"],
        ["z position", "z velocity", "z acceleration"],
    ];
    let (pos, vel, acc) = string.motion()?;
    let [pos_field, vel_field, acc_field] = FIELDS[axis % 3];
    Ok((
        bounded(sid, pos_field, pos, POSITION_MAX)?,
        bounded(sid, vel_field, vel, VELOCITY_MAX)?,
        bounded(sid, acc_field, acc, ACCELERATION_MAX)?,
    ))
}

fn set_motion(
    eph: &mut Ephemeris,
    axis: usize,
    (pos, vel, acc): (f64, f64, f64),
) -> Result<(), Error> {
    let glo = eph.glonass_mut()?;
    glo.pos[axis] = pos;
    glo.vel[axis] = vel;
    glo.acc[axis] = acc;
    Ok(())
}

/// Fit interval [s] described by P1. When P1 does not describe one,
/// the previous interval is kept, or the largest one is assumed.
fn fit_interval(previous: u32, p1: usize) -> u32 {
    match P1_MINUTES.get(p1).copied().unwrap_or(0) {
        0 if previous == 0 => 60 * 60 + FIT_INTERVAL_MARGIN_SECS,
        0 => previous,
        minutes => minutes * 60 + FIT_INTERVAL_MARGIN_SECS,
    }
}

/// Decodes string 1: X axis, frame time `tk` and fit interval.
pub fn decode_string_1(
    string: &NavString,
    eph: &mut Ephemeris,
    tk: &mut GloTime,
) -> Result<(), Error> {
    eph.glonass()?;
    let sid = eph.sid;
    let string = checked(string, &sid, 1)?;
    let x = motion(&string, &sid, 0)?;

    let hours = string.extract(72, 5)? as u8;
    if hours > TK_MAX_HOURS {
        #[cfg(feature = "log")]
        debug!("{} - tk hours out of range: {}", sid, hours);
        return Err(Error::OutOfRange("tk hours"));
    }
    let minutes = string.extract(66, 6)? as u8;
    if minutes > TK_MAX_MINUTES {
        #[cfg(feature = "log")]
        debug!("{} - tk minutes out of range: {}", sid, minutes);
        return Err(Error::OutOfRange("tk minutes"));
    }
    let seconds = if string.extract(65, 1)? == 1 { 30.0 } else { 0.0 };
    let p1 = string.extract(77, 2)? as usize;

    set_motion(eph, 0, x)?;
    eph.fit_interval = fit_interval(eph.fit_interval, p1);
    tk.h = hours;
    tk.m = minutes;
    tk.s = seconds;
    Ok(())
}

/// Decodes string 2: Y axis, health flag Bn and reference time tb.
pub fn decode_string_2(
    string: &NavString,
    eph: &mut Ephemeris,
    toe: &mut GloTime,
) -> Result<(), Error> {
    eph.glonass()?;
    let sid = eph.sid;
    let string = checked(string, &sid, 2)?;
    let y = motion(&string, &sid, 1)?;

    let unhealthy = string.extract(80, 1)? as u8;
    let tb = string.extract(70, 7)? * 900;
    if !(TB_MIN_SECS..=TB_MAX_SECS).contains(&tb) {
        #[cfg(feature = "log")]
        debug!("{} - tb out of range: {} s", sid, tb);
        return Err(Error::OutOfRange("tb"));
    }

    set_motion(eph, 1, y)?;
    eph.glonass_mut()?.iod = (tb & 0x7f) as u8;
    eph.health_bits |= unhealthy;
    toe.h = (tb / 3600) as u8;
    toe.m = ((tb % 3600) / 60) as u8;
    toe.s = (tb % 60) as f64;
    Ok(())
}

/// Decodes string 3: Z axis, relative frequency deviation and health flag ln.
pub fn decode_string_3(string: &NavString, eph: &mut Ephemeris) -> Result<(), Error> {
    eph.glonass()?;
    let sid = eph.sid;
    let string = checked(string, &sid, 3)?;
    let z = motion(&string, &sid, 2)?;

    let gamma = string.sign_magnitude(69, 10)? as f64 * p2(-40);
    let gamma = bounded(&sid, "gamma", gamma, GAMMA_MAX)?;
    let unhealthy = string.extract(65, 1)? as u8;

    set_motion(eph, 2, z)?;
    eph.glonass_mut()?.gamma = gamma;
    eph.health_bits |= unhealthy;
    Ok(())
}

/// Decodes string 4: clock correction, equipment delay, age of data,
/// orbital slot (assigned to the signal), accuracy and day number.
pub fn decode_string_4(
    string: &NavString,
    eph: &mut Ephemeris,
    tk: &mut GloTime,
    toe: &mut GloTime,
    age_of_data: &mut u8,
) -> Result<(), Error> {
    eph.glonass()?;
    let sid = eph.sid;
    let string = checked(string, &sid, 4)?;

    let tau = string.sign_magnitude(59, 21)? as f64 * p2(-30);
    let tau = bounded(&sid, "tau", tau, TAU_MAX)?;
    let d_tau = string.sign_magnitude(54, 4)? as f64 * p2(-30);
    let d_tau = bounded(&sid, "d_tau", d_tau, D_TAU_MAX)?;
    let age = string.extract(49, 5)? as u8;

    let slot = string.extract(11, 5)? as u16;
    if slot == 0 || slot > NUM_SLOTS {
        #[cfg(feature = "log")]
        debug!("{} - invalid orbital slot {}", sid, slot);
        return Err(Error::InvalidSlot(slot));
    }

    let ura = FT_ACCURACY
        .get(string.extract(30, 4)? as usize)
        .copied()
        .unwrap_or(INVALID_URA);

    let nt = string.extract(16, 11)? as u16;
    if nt > NT_MAX_DAYS {
        #[cfg(feature = "log")]
        debug!("{} - nt out of range: {} days", sid, nt);
        return Err(Error::OutOfRange("nt"));
    }

    if string.extract(9, 2)? == 0 {
        #[cfg(feature = "log")]
        warn!("{} - non GLONASS-M satellite", sid);
    }

    let glo = eph.glonass_mut()?;
    glo.tau = tau;
    glo.d_tau = d_tau;
    eph.sid.sat = slot;
    eph.ura = ura;
    tk.nt = nt;
    toe.nt = nt;
    *age_of_data = age;
    Ok(())
}

/// Decodes string 5: four year interval and GLONASS to GPS time offset.
pub fn decode_string_5(
    string: &NavString,
    eph: &mut Ephemeris,
    tk: &mut GloTime,
    toe: &mut GloTime,
    tau_gps: &mut f64,
) -> Result<(), Error> {
    eph.glonass()?;
    let sid = eph.sid;
    let string = checked(string, &sid, 5)?;

    let n4 = string.extract(32, 5)? as u8;
    if n4 == 0 {
        #[cfg(feature = "log")]
        debug!("{} - n4=0", sid);
        return Err(Error::OutOfRange("n4"));
    }
    let offset = string.sign_magnitude(10, 21)? as f64 * p2(-30);
    let offset = bounded(&sid, "tau_gps", offset, TAU_GPS_MAX)?;

    tk.n4 = n4;
    toe.n4 = n4;
    *tau_gps = offset;
    Ok(())
}

/// Accumulates the time related content of one superframe
/// (strings 1 to 5) and completes the [Ephemeris] once all
/// five strings were received.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassFrame {
    /// Frame start time
    pub tk: GloTime,
    /// Reference time of the immediate data (tb)
    pub toe: GloTime,
    /// Age of the immediate data [days]
    pub age_of_data: u8,
    /// GLONASS time to GPS time offset [s]
    pub tau_gps: f64,
    received: u8,
}

impl GlonassFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one string of types 1 to 5 into `eph`.
    /// Returns the decoded string type.
    pub fn decode(&mut self, string: &NavString, eph: &mut Ephemeris) -> Result<u8, Error> {
        let mut corrected = *string;
        if let Err(e) = corrected.correct() {
            #[cfg(feature = "log")]
            debug!("{} - checksum mismatch", eph.sid);
            return Err(e);
        }
        let string_type = corrected.string_type();
        match string_type {
            1 => decode_string_1(&corrected, eph, &mut self.tk)?,
            2 => decode_string_2(&corrected, eph, &mut self.toe)?,
            3 => decode_string_3(&corrected, eph)?,
            4 => decode_string_4(
                &corrected,
                eph,
                &mut self.tk,
                &mut self.toe,
                &mut self.age_of_data,
            )?,
            5 => decode_string_5(
                &corrected,
                eph,
                &mut self.tk,
                &mut self.toe,
                &mut self.tau_gps,
            )?,
            found => {
                // almanac strings
                return Err(Error::UnexpectedMessageType {
                    expected: 5,
                    found,
                });
            },
        }
        self.received |= 1 << (string_type - 1);
        Ok(string_type)
    }

    /// True once strings 1 to 5 were all decoded
    pub fn is_complete(&self) -> bool {
        self.received == 0x1f
    }

    /// Forgets the received strings
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Completes `eph` once the frame is complete: reference time
    /// converted to GPS time, frequency channel from the `registry`.
    /// Returns false while strings are missing.
    pub fn commit<L: RegistryLock>(
        &mut self,
        eph: &mut Ephemeris,
        registry: &FcnRegistry<L>,
    ) -> Result<bool, Error> {
        if !self.is_complete() {
            return Ok(false);
        }
        let toe = self.toe.to_gps()?;
        let fcn = registry.fcn_of_slot(eph.sid.sat)?.unwrap_or(FCN_UNKNOWN);

        eph.glonass_mut()?.fcn = fcn;
        eph.toe = toe;
        eph.valid = true;
        eph.source = NavSource::GloFdma;
        self.received = 0;

        #[cfg(feature = "log")]
        debug!("{} - ephemeris completed, toe={}", eph.sid, eph.toe);
        Ok(true)
    }
}
