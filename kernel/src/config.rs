// SPDX-License-Identifier: MPL-2.0

//! Boot-time configuration of the kernel.

use log::LevelFilter;
use nachos_machine::{
    boot::kcmdline::{KCmdlineArg, ModuleArg},
    logger,
};

use crate::{prelude::*, sched::SchedPolicy};

/// The kernel module whose command-line arguments configure scheduling.
const SCHED_MODULE: &str = "sched";

/// The configuration the kernel boots with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KernelConfig {
    pub policy: SchedPolicy,
    /// The size of the thread table, including the boot thread.
    pub max_threads: usize,
    /// The maximum level of the console logger.
    pub log_level: LevelFilter,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            policy: SchedPolicy::RoundRobin,
            max_threads: 64,
            log_level: LevelFilter::Off,
        }
    }
}

impl KernelConfig {
    pub fn with_policy(mut self, policy: SchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }

    /// Reads `log_level=`, `sched.policy=` and `sched.max_threads=` from the
    /// kernel command line. Missing arguments keep their defaults.
    pub fn from_cmdline(cmdline: &KCmdlineArg) -> Result<Self> {
        let mut config = Self::default();
        if let Some(log_level) = logger::get_log_level(cmdline) {
            config.log_level = log_level;
        }
        let Some(args) = cmdline.get_module_args(SCHED_MODULE) else {
            return Ok(config);
        };

        for arg in args {
            match arg {
                ModuleArg::KeyVal(key, value) if key == "policy" => {
                    config.policy = value.parse()?;
                }
                ModuleArg::KeyVal(key, value) if key == "max_threads" => {
                    config.max_threads = value.parse()?;
                }
                ModuleArg::KeyVal(key, _) | ModuleArg::Arg(key) => {
                    warn!("unknown scheduler option {}, ignored", key);
                }
            }
        }

        if config.max_threads == 0 {
            return_errno_with_message!(Errno::EINVAL, "the boot thread needs a thread slot");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(cmdline: &str) -> Result<KernelConfig> {
        KernelConfig::from_cmdline(&KCmdlineArg::from(cmdline))
    }

    #[test]
    fn defaults_without_args() {
        assert_eq!(parse(""), Ok(KernelConfig::default()));
        assert_eq!(KernelConfig::default().log_level, LevelFilter::Off);
    }

    #[test]
    fn log_level_without_sched_args() {
        assert_eq!(
            parse("log_level=info"),
            Ok(KernelConfig::default().with_log_level(LevelFilter::Info))
        );
    }

    #[test]
    fn policy_and_capacity() {
        let config = parse("sched.policy=sjf sched.max_threads=8").unwrap();
        assert_eq!(config.policy, SchedPolicy::ShortestJobFirst);
        assert_eq!(config.max_threads, 8);
        assert_eq!(config.log_level, LevelFilter::Off);
    }

    #[test]
    fn unknown_options_are_ignored() {
        let config = parse("sched.policy=fcfs sched.quantum=4 sched.verbose").unwrap();
        assert_eq!(config.policy, SchedPolicy::FirstComeFirstServed);
    }

    #[test]
    fn invalid_values() {
        for cmdline in [
            "sched.policy=lottery",
            "sched.max_threads=many",
            "sched.max_threads=0",
        ] {
            assert_eq!(
                parse(cmdline).map_err(|err| err.error()),
                Err(Errno::EINVAL),
                "{}",
                cmdline
            );
        }
    }
}
