//! GLONASS frequency channel registry.
//!
//! GLONASS satellites are tracked on a frequency channel (FCN, 1..=14)
//! before their orbital slot (1..=28) is known from the navigation
//! message. The [FcnRegistry] maintains the slot → channel mapping.
//! Antipodal satellites share one channel, so a channel may map
//! to two slots.
//!
//! Each slot is stored in an atomic cell: concurrent readers always
//! observe a complete value. Writers are serialized through the
//! [RegistryLock] the registry was built with.
use std::sync::atomic::{AtomicU8, Ordering};

use crate::{
    prelude::{Constellation, Error},
    signal::SignalId,
};

#[cfg(feature = "log")]
use log::debug;

/// Lowest frequency channel
pub const FCN_MIN: u16 = 1;

/// Highest frequency channel
pub const FCN_MAX: u16 = 14;

/// Frequency channel is not known
pub const FCN_UNKNOWN: u16 = 0;

/// Number of GLONASS orbital slots
pub const NUM_SLOTS: u16 = 28;

/// Mutual exclusion hooks, called around every registry update.
pub trait RegistryLock {
    /// Acquires exclusive access
    fn lock(&self);
    /// Releases exclusive access
    fn unlock(&self);
}

/// Lock that does nothing, for single writer applications.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoLock;

impl RegistryLock for NoLock {
    fn lock(&self) {}
    fn unlock(&self) {}
}

/// Releases the lock when dropped
struct Guard<'a, L: RegistryLock>(&'a L);

impl<'a, L: RegistryLock> Guard<'a, L> {
    fn new(lock: &'a L) -> Self {
        lock.lock();
        Self(lock)
    }
}

impl<L: RegistryLock> Drop for Guard<'_, L> {
    fn drop(&mut self) {
        self.0.unlock();
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const UNMAPPED: AtomicU8 = AtomicU8::new(FCN_UNKNOWN as u8);

/// Orbital slot to frequency channel map
#[derive(Debug)]
pub struct FcnRegistry<L: RegistryLock = NoLock> {
    lock: L,
    /// index 0 is not used
    channels: [AtomicU8; NUM_SLOTS as usize + 1],
}

impl Default for FcnRegistry<NoLock> {
    fn default() -> Self {
        Self::new()
    }
}

impl FcnRegistry<NoLock> {
    /// Builds an empty registry without lock. Usable in `static` context.
    pub const fn new() -> Self {
        Self {
            lock: NoLock,
            channels: [UNMAPPED; NUM_SLOTS as usize + 1],
        }
    }
}

fn check_slot(slot: u16) -> Result<(), Error> {
    if slot == 0 || slot > NUM_SLOTS {
        Err(Error::InvalidSlot(slot))
    } else {
        Ok(())
    }
}

fn check_fcn(fcn: u16) -> Result<(), Error> {
    if (FCN_MIN..=FCN_MAX).contains(&fcn) {
        Ok(())
    } else {
        Err(Error::InvalidFrequencyChannel(fcn))
    }
}

impl<L: RegistryLock> FcnRegistry<L> {
    /// Builds an empty registry, updates going through `lock`.
    pub fn with_lock(lock: L) -> Self {
        Self {
            lock,
            channels: [UNMAPPED; NUM_SLOTS as usize + 1],
        }
    }

    /// Maps orbital `slot` to frequency channel `fcn`.
    pub fn set(&self, fcn: u16, slot: u16) -> Result<(), Error> {
        check_fcn(fcn)?;
        check_slot(slot)?;
        let _guard = Guard::new(&self.lock);
        self.channels[slot as usize].store(fcn as u8, Ordering::Release);
        #[cfg(feature = "log")]
        debug!("glonass slot {} mapped to fcn {}", slot, fcn);
        Ok(())
    }

    /// Frequency channel of orbital slot `slot`, if known
    pub fn fcn_of_slot(&self, slot: u16) -> Result<Option<u16>, Error> {
        check_slot(slot)?;
        match self.channels[slot as usize].load(Ordering::Acquire) as u16 {
            FCN_UNKNOWN => Ok(None),
            fcn => Ok(Some(fcn)),
        }
    }

    /// Frequency channel of this GLONASS signal, identified by its orbital slot.
    pub fn fcn(&self, sid: &SignalId) -> Result<u16, Error> {
        if sid.constellation() != Constellation::Glonass {
            return Err(Error::UnsupportedConstellation(sid.constellation()));
        }
        self.fcn_of_slot(sid.sat)?
            .ok_or(Error::UnknownFrequencyChannel)
    }

    /// True if a frequency channel is known for this GLONASS signal
    pub fn is_mapped(&self, sid: &SignalId) -> bool {
        self.fcn(sid).is_ok()
    }

    /// Forgets the channel of orbital `slot`
    pub fn clear(&self, slot: u16) -> Result<(), Error> {
        check_slot(slot)?;
        let _guard = Guard::new(&self.lock);
        self.channels[slot as usize].store(FCN_UNKNOWN as u8, Ordering::Release);
        Ok(())
    }

    /// Forgets all mappings
    pub fn clear_all(&self) {
        for slot in 1..=NUM_SLOTS {
            let _guard = Guard::new(&self.lock);
            self.channels[slot as usize].store(FCN_UNKNOWN as u8, Ordering::Release);
        }
    }

    /// Orbital slots mapped to frequency channel `fcn`, in ascending order.
    /// At most two slots share a channel (antipodal satellites),
    /// further ones are not reported.
    pub fn slots(&self, fcn: u16) -> [Option<u16>; 2] {
        let mut found = [None; 2];
        let mut count = 0;
        for slot in 1..=NUM_SLOTS {
            if self.channels[slot as usize].load(Ordering::Acquire) as u16 == fcn
                && fcn != FCN_UNKNOWN
            {
                found[count] = Some(slot);
                count += 1;
                if count == found.len() {
                    break;
                }
            }
        }
        found
    }

    /// Number of orbital slots mapped to frequency channel `fcn` (0..=2)
    pub fn slot_count(&self, fcn: u16) -> usize {
        self.slots(fcn).iter().flatten().count()
    }
}
