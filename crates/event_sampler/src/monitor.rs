//! Repair and rebuild scheduling for rejection-based samplers.
//!
//! Every weight update nudges a rejection sampler away from the packing it was built
//! with: bin contents accumulate round-off and the height bound only ever grows. The
//! [EfficiencyMonitor] counts updates and, when polled with the current efficiency,
//! tells the sampler whether to keep going, repair its cached bin contents, or rebuild
//! its packing from scratch.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning knobs for repair/rebuild scheduling.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaintenanceConfig {
    /// Updates allowed between repairs.
    pub steps_between_repairs: u32,
    /// Updates allowed between rebuild checks.
    pub steps_between_rebuilds: u32,
    /// A due rebuild only happens when efficiency is below this.
    pub target_efficiency: f64,
    /// Efficiency below this forces a rebuild immediately.
    pub minimum_efficiency: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            steps_between_repairs: 1000,
            steps_between_rebuilds: 1000,
            target_efficiency: 0.75,
            minimum_efficiency: 0.25,
        }
    }
}

impl MaintenanceConfig {
    /// Sets the number of updates between repairs.
    pub fn with_steps_between_repairs(mut self, steps: u32) -> Self {
        self.steps_between_repairs = steps;
        self
    }

    /// Sets the number of updates between rebuild checks.
    pub fn with_steps_between_rebuilds(mut self, steps: u32) -> Self {
        self.steps_between_rebuilds = steps;
        self
    }

    /// Sets the target efficiency.
    pub fn with_target_efficiency(mut self, efficiency: f64) -> Self {
        self.target_efficiency = efficiency;
        self
    }

    /// Sets the minimum allowed efficiency.
    pub fn with_minimum_efficiency(mut self, efficiency: f64) -> Self {
        self.minimum_efficiency = efficiency;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.steps_between_repairs == 0 {
            return Err(Error::InvalidConfig(
                "steps_between_repairs must be > 0".into(),
            ));
        }
        if self.steps_between_rebuilds == 0 {
            return Err(Error::InvalidConfig(
                "steps_between_rebuilds must be > 0".into(),
            ));
        }
        if !(self.minimum_efficiency > 0.0 && self.minimum_efficiency <= 1.0) {
            return Err(Error::InvalidConfig(
                "minimum_efficiency must be in (0, 1]".into(),
            ));
        }
        if !(self.target_efficiency >= self.minimum_efficiency && self.target_efficiency <= 1.0)
        {
            return Err(Error::InvalidConfig(
                "target_efficiency must be in [minimum_efficiency, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// What a sampler should do before its next draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maintenance {
    None,
    /// Recompute cached aggregates, keep the packing.
    Repair,
    /// Re-sort and repack from scratch.
    Rebuild,
}

/// Countdown-driven scheduler plus acceptance statistics.
#[derive(Debug, Clone)]
pub struct EfficiencyMonitor {
    config: MaintenanceConfig,
    steps_until_repair: i64,
    steps_until_rebuild: i64,
    /// Set by any update since the last rebuild.
    dirty: bool,
    repairs: u64,
    rebuilds: u64,
    accepted: u64,
    attempts: u64,
}

impl Default for EfficiencyMonitor {
    fn default() -> Self {
        Self::new(MaintenanceConfig::default())
    }
}

impl EfficiencyMonitor {
    pub fn new(config: MaintenanceConfig) -> Self {
        Self {
            config,
            steps_until_repair: config.steps_between_repairs as i64,
            steps_until_rebuild: config.steps_between_rebuilds as i64,
            dirty: false,
            repairs: 0,
            rebuilds: 0,
            accepted: 0,
            attempts: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    /// Replace the configuration and restart both countdowns.
    pub fn set_config(&mut self, config: MaintenanceConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.steps_until_repair = config.steps_between_repairs as i64;
        self.steps_until_rebuild = config.steps_between_rebuilds as i64;
        Ok(())
    }

    /// Forget all history, as after building a sampler from fresh weights.
    pub fn restart(&mut self) {
        *self = Self::new(self.config);
    }

    /// Count an immediate update. Updates that leave the weight unchanged count too.
    #[inline]
    pub fn record_update(&mut self) {
        self.steps_until_repair -= 1;
        self.steps_until_rebuild -= 1;
        self.dirty = true;
    }

    /// Count an update whose bin refresh is deferred until the next commit.
    #[inline]
    pub fn record_deferred_update(&mut self) {
        self.steps_until_rebuild -= 1;
        self.dirty = true;
    }

    /// Record one accepted draw that took `attempts` tries.
    #[inline]
    pub fn record_attempts(&mut self, attempts: u64) {
        self.accepted += 1;
        self.attempts += attempts;
    }

    /// Decide what to do before the next draw given the current efficiency.
    ///
    /// Efficiency below the minimum forces a rebuild if any update happened since the last
    /// one. An expired rebuild countdown with efficiency at or above target simply restarts.
    pub fn poll(&mut self, efficiency: f64) -> Maintenance {
        if efficiency < self.config.minimum_efficiency && self.dirty {
            return Maintenance::Rebuild;
        }
        if self.steps_until_rebuild <= 0 {
            if efficiency < self.config.target_efficiency {
                return Maintenance::Rebuild;
            }
            self.steps_until_rebuild = self.config.steps_between_rebuilds as i64;
        }
        if self.steps_until_repair <= 0 {
            return Maintenance::Repair;
        }
        Maintenance::None
    }

    /// Note that a repair happened.
    pub fn repaired(&mut self) {
        self.repairs += 1;
        self.steps_until_repair = self.config.steps_between_repairs as i64;
    }

    /// Note that a rebuild happened. A rebuild also counts as a repair for scheduling.
    pub fn rebuilt(&mut self) {
        self.rebuilds += 1;
        self.dirty = false;
        self.steps_until_repair = self.config.steps_between_repairs as i64;
        self.steps_until_rebuild = self.config.steps_between_rebuilds as i64;
    }

    #[inline]
    pub fn steps_until_repair(&self) -> i64 {
        self.steps_until_repair
    }

    #[inline]
    pub fn steps_until_rebuild(&self) -> i64 {
        self.steps_until_rebuild
    }

    #[inline]
    pub fn repairs(&self) -> u64 {
        self.repairs
    }

    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Fraction of draw attempts that were accepted, or `None` before the first draw.
    pub fn acceptance_rate(&self) -> Option<f64> {
        (self.attempts > 0).then(|| self.accepted as f64 / self.attempts as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> MaintenanceConfig {
        MaintenanceConfig::default()
            .with_steps_between_repairs(3)
            .with_steps_between_rebuilds(5)
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = MaintenanceConfig::default();
        assert_eq!(c.steps_between_repairs, 1000);
        assert_eq!(c.steps_between_rebuilds, 1000);
        assert_eq!(c.target_efficiency, 0.75);
        assert_eq!(c.minimum_efficiency, 0.25);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = MaintenanceConfig::default();
        assert!(base.with_steps_between_repairs(0).validate().is_err());
        assert!(base.with_steps_between_rebuilds(0).validate().is_err());
        assert!(base.with_minimum_efficiency(0.0).validate().is_err());
        assert!(base
            .with_minimum_efficiency(0.8)
            .with_target_efficiency(0.5)
            .validate()
            .is_err());
        assert!(base.with_target_efficiency(1.5).validate().is_err());
    }

    #[test]
    fn collapse_forces_rebuild_regardless_of_countdown() {
        let mut m = EfficiencyMonitor::new(small());
        m.record_update();
        assert_eq!(m.poll(0.1), Maintenance::Rebuild);
    }

    #[test]
    fn collapse_without_updates_does_not_rebuild_again() {
        let mut m = EfficiencyMonitor::new(small());
        m.record_update();
        assert_eq!(m.poll(0.1), Maintenance::Rebuild);
        m.rebuilt();
        assert_eq!(m.poll(0.1), Maintenance::None);
    }

    #[test]
    fn restart_clears_history_but_keeps_config() {
        let mut m = EfficiencyMonitor::new(small());
        m.record_update();
        m.rebuilt();
        m.record_attempts(2);
        m.restart();
        assert_eq!(m.rebuilds(), 0);
        assert_eq!(m.acceptance_rate(), None);
        assert_eq!(m.config().steps_between_repairs, 3);
        assert_eq!(m.poll(0.1), Maintenance::None);
    }

    #[test]
    fn repair_due_after_configured_updates() {
        let mut m = EfficiencyMonitor::new(small());
        for _ in 0..2 {
            m.record_update();
            assert_eq!(m.poll(0.9), Maintenance::None);
        }
        m.record_update();
        assert_eq!(m.poll(0.9), Maintenance::Repair);
        m.repaired();
        assert_eq!(m.repairs(), 1);
        assert_eq!(m.poll(0.9), Maintenance::None);
    }

    #[test]
    fn due_rebuild_skipped_when_efficient_enough() {
        let mut m = EfficiencyMonitor::new(
            small().with_steps_between_repairs(100),
        );
        for _ in 0..5 {
            m.record_deferred_update();
        }
        assert_eq!(m.poll(0.9), Maintenance::None);
        assert_eq!(m.steps_until_rebuild(), 5);

        for _ in 0..5 {
            m.record_deferred_update();
        }
        assert_eq!(m.poll(0.5), Maintenance::Rebuild);
        m.rebuilt();
        assert_eq!(m.rebuilds(), 1);
        assert_eq!(m.steps_until_rebuild(), 5);
    }

    #[test]
    fn deferred_updates_leave_repair_countdown_alone() {
        let mut m = EfficiencyMonitor::new(small());
        m.record_deferred_update();
        assert_eq!(m.steps_until_repair(), 3);
        assert_eq!(m.steps_until_rebuild(), 4);
    }

    #[test]
    fn acceptance_rate_tracks_attempts() {
        let mut m = EfficiencyMonitor::default();
        assert_eq!(m.acceptance_rate(), None);
        m.record_attempts(1);
        m.record_attempts(3);
        assert_eq!(m.acceptance_rate(), Some(0.5));
    }

    #[test]
    fn set_config_validates_and_restarts() {
        let mut m = EfficiencyMonitor::default();
        m.record_update();
        assert!(m
            .set_config(MaintenanceConfig::default().with_steps_between_repairs(0))
            .is_err());
        m.set_config(small()).unwrap();
        assert_eq!(m.steps_until_repair(), 3);
    }
}
