#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * gnss-navmsg is part of the rtk-rs framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al.
 * This framework is shipped under the Mozilla Public V2 license.
 */

extern crate gnss_rs as gnss;

#[macro_use]
extern crate num_derive;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub mod almanac;
pub mod bits;
pub mod decoder;
pub mod ephemeris;
pub mod fcn;
pub mod health;
pub mod ionosphere;
pub mod signal;
pub mod stream;
pub mod time;
pub mod utc;

mod constants;
mod error;
mod geodesy;

#[cfg(test)]
mod tests;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        almanac::{AlmanacData, AlmanacEntry},
        decoder::{
            glonass::{ErrorDetection, NavString},
            NavSource,
        },
        ephemeris::{
            Ephemeris, EphemerisData, EphemerisStatus, GlonassParameters, KeplerParameters,
            SatelliteState, XyzParameters,
        },
        error::Error,
        fcn::{FcnRegistry, NoLock, RegistryLock},
        health::{Health, SignalHealth},
        ionosphere::{KbModel, NgModel, NgRegionFlags},
        signal::{Code, SignalId},
        stream::BitStream,
        time::{GloTime, GpsTime},
        utc::UtcParameters,
    };

    // pub re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}
