/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use crate::{
    DEVICE_ID, REG_CFG_A, REG_CFG_B, REG_CFG_C, REG_INT_CTRL, REG_INT_THS_L, REG_OFFSET_X_L,
    REG_OFFSET_Y_L, REG_OFFSET_Z_L, REG_OUTX_L, REG_WHO_AM_I,
};

/// One bus action of the initialization sequence, in issue order
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Step {
    BusInit,
    DisableInterrupt,
    ReadIdentity,
    WriteOffsetX,
    WriteOffsetY,
    WriteOffsetZ,
    WriteThreshold,
    WriteCfgA,
    WriteCfgB,
    WriteCfgC,
    WriteIntCtrl,
    FlushOutput,
    EnableInterrupt,
}

impl Step {
    pub const ALL: [Step; 13] = [
        Step::BusInit,
        Step::DisableInterrupt,
        Step::ReadIdentity,
        Step::WriteOffsetX,
        Step::WriteOffsetY,
        Step::WriteOffsetZ,
        Step::WriteThreshold,
        Step::WriteCfgA,
        Step::WriteCfgB,
        Step::WriteCfgC,
        Step::WriteIntCtrl,
        Step::FlushOutput,
        Step::EnableInterrupt,
    ];

    /// Register touched by this step, if it is a register access
    pub fn register(&self) -> Option<u8> {
        match self {
            Step::BusInit | Step::DisableInterrupt | Step::EnableInterrupt => None,
            Step::ReadIdentity => Some(REG_WHO_AM_I),
            Step::WriteOffsetX => Some(REG_OFFSET_X_L),
            Step::WriteOffsetY => Some(REG_OFFSET_Y_L),
            Step::WriteOffsetZ => Some(REG_OFFSET_Z_L),
            Step::WriteThreshold => Some(REG_INT_THS_L),
            Step::WriteCfgA => Some(REG_CFG_A),
            Step::WriteCfgB => Some(REG_CFG_B),
            Step::WriteCfgC => Some(REG_CFG_C),
            Step::WriteIntCtrl => Some(REG_INT_CTRL),
            Step::FlushOutput => Some(REG_OUTX_L),
        }
    }

    fn mask(&self) -> u16 {
        1 << (*self as u8)
    }
}

/// Outcome of each step of `initialize`.
///
/// A failed step never stops the sequence, so a report with failures still
/// comes with a usable (possibly misconfigured) driver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct InitReport {
    failed: u16,
    device_id: Option<u8>,
}

impl InitReport {
    pub(crate) fn record_failure(&mut self, step: Step) {
        self.failed |= step.mask();
    }

    pub(crate) fn record_device_id(&mut self, id: u8) {
        self.device_id = Some(id);
    }

    /// True if `step` failed on the bus
    pub fn failed(&self, step: Step) -> bool {
        self.failed & step.mask() != 0
    }

    /// All failed steps, in issue order
    pub fn failures(&self) -> impl Iterator<Item = Step> + '_ {
        Step::ALL.into_iter().filter(move |step| self.failed(*step))
    }

    /// Identity byte read from WHO_AM_I, None if the read failed
    pub fn device_id(&self) -> Option<u8> {
        self.device_id
    }

    pub fn identity_matched(&self) -> bool {
        self.device_id == Some(DEVICE_ID)
    }

    /// No bus failures and the expected identity was found
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.identity_matched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = InitReport::default();
        assert_eq!(report.failures().count(), 0);
        assert!(!report.identity_matched());
        assert!(!report.is_clean());
    }

    #[test]
    fn failures_listed_in_order() {
        let mut report = InitReport::default();
        report.record_failure(Step::FlushOutput);
        report.record_failure(Step::WriteOffsetY);
        report.record_device_id(DEVICE_ID);

        let mut failures = report.failures();
        assert_eq!(failures.next(), Some(Step::WriteOffsetY));
        assert_eq!(failures.next(), Some(Step::FlushOutput));
        assert_eq!(failures.next(), None);
        assert!(report.failed(Step::FlushOutput));
        assert!(!report.failed(Step::WriteCfgA));
        assert!(report.identity_matched());
        assert!(!report.is_clean());
    }

    #[test]
    fn identity_mismatch_is_not_clean() {
        let mut report = InitReport::default();
        report.record_device_id(0x3D);
        assert_eq!(report.device_id(), Some(0x3D));
        assert!(!report.is_clean());
    }

    #[test]
    fn step_registers() {
        assert_eq!(Step::WriteCfgB.register(), Some(0x61));
        assert_eq!(Step::WriteThreshold.register(), Some(0x65));
        assert_eq!(Step::EnableInterrupt.register(), None);
    }
}
