//! Per-client status entries and the fixed-size array holding them

use std::sync::{Mutex, MutexGuard};

use fslatency_core::{Datablock, RingBuffer, Timestamp};

use crate::alarm::{self, NOALARM};
use crate::globalstatus::GlobalStatus;

pub struct StatusEntry {
    pub alarm: u32,
    pub lastalarmtime: Timestamp,
    pub lastarrival: Timestamp,
    pub buffer: RingBuffer<Datablock>,
}

impl StatusEntry {
    fn new(rollingwindow: usize) -> Self {
        Self {
            alarm: NOALARM,
            lastalarmtime: Timestamp::ZERO,
            lastarrival: Timestamp::ZERO,
            buffer: RingBuffer::new(rollingwindow),
        }
    }

    /// Must be called while holding this entry's lock. Sets the bit, stamps
    /// `lastalarmtime`, and notifies the global alarm status.
    pub fn set_alarm(&mut self, bit: u32, global: &GlobalStatus) {
        self.alarm |= bit;
        self.lastalarmtime = Timestamp::now();
        global.set_alarmed();
    }

    pub fn unset_alarm(&mut self, bit: u32) {
        self.alarm &= !bit;
    }

    /// Only the AlarmSilencer calls this.
    pub fn clear_alarm(&mut self) {
        self.alarm = alarm::NOALARM;
        self.lastalarmtime = Timestamp::ZERO;
    }

    /// Full reset used when a slot is reused: timetoforget, or a
    /// programming-flow inconsistency discovered while housekeeping.
    pub fn clear(&mut self) {
        self.alarm = alarm::NOALARM;
        self.lastalarmtime = Timestamp::ZERO;
        self.lastarrival = Timestamp::ZERO;
        self.buffer.clear();
    }

    pub fn is_vacant(&self) -> bool {
        self.lastarrival.is_zero()
    }
}

/// Fixed-size array of per-client status entries, one slot per registry id.
pub struct StatusDb {
    slots: Vec<Mutex<StatusEntry>>,
}

impl StatusDb {
    pub fn new(maxclient: usize, rollingwindow: usize) -> Self {
        let slots = (0..maxclient)
            .map(|_| Mutex::new(StatusEntry::new(rollingwindow)))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn lock(&self, id: usize) -> MutexGuard<'_, StatusEntry> {
        self.slots[id].lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_vacant_with_no_alarm() {
        let db = StatusDb::new(4, 8);
        let entry = db.lock(0);
        assert!(entry.is_vacant());
        assert_eq!(entry.alarm, NOALARM);
    }

    #[test]
    fn set_alarm_notifies_global_status() {
        let db = StatusDb::new(1, 8);
        let global = GlobalStatus::new();
        {
            let mut entry = db.lock(0);
            entry.set_alarm(alarm::STAT_HIGH, &global);
        }
        assert_eq!(global.current(), crate::globalstatus::AlarmState::Alarmed);
        assert_eq!(db.lock(0).alarm, alarm::STAT_HIGH);
    }

    #[test]
    fn clear_resets_everything() {
        let db = StatusDb::new(1, 8);
        {
            let mut entry = db.lock(0);
            entry.alarm = alarm::UDP_TIMEOUT;
            entry.lastarrival = Timestamp::new(5, 0);
            entry.buffer.add(Datablock::empty());
        }
        db.lock(0).clear();
        let entry = db.lock(0);
        assert!(entry.is_vacant());
        assert_eq!(entry.alarm, NOALARM);
        assert!(entry.buffer.is_empty());
    }
}
