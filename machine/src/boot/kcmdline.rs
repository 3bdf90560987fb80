// SPDX-License-Identifier: MPL-2.0

//! The module to parse kernel command-line arguments.
//!
//! The format follows the Linux kernel command line rules: arguments are
//! separated by spaces, `option=value` sets a kernel option, and
//! `module.option=value` passes an argument to a kernel module. Double quotes
//! protect spaces inside a value.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

/// Kernel module arguments
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ModuleArg {
    /// A string argument
    Arg(String),
    /// A key-value argument
    KeyVal(String, String),
}

/// The struct to store the parsed kernel command-line arguments.
#[derive(Debug, Default)]
pub struct KCmdlineArg {
    options: BTreeMap<String, Option<String>>,
    module_args: BTreeMap<String, Vec<ModuleArg>>,
}

// Define get APIs.
impl KCmdlineArg {
    /// Gets the value of a kernel option.
    ///
    /// Returns `Some(None)` if the option is present without a value.
    pub fn get_option(&self, option: &str) -> Option<Option<&str>> {
        self.options.get(option).map(|value| value.as_deref())
    }

    /// Gets the argument vector of a kernel module.
    pub fn get_module_args(&self, module: &str) -> Option<&Vec<ModuleArg>> {
        self.module_args.get(module)
    }
}

// Splits the command line string by spaces but preserve
// ones that are protected by double quotes(`"`).
fn split_arg(input: &str) -> impl Iterator<Item = &str> {
    let mut inside_quotes = false;

    input
        .split(move |c: char| {
            if c == '"' {
                inside_quotes = !inside_quotes;
            }

            !inside_quotes && c.is_whitespace()
        })
        .filter(|arg| !arg.is_empty())
}

fn unquote(value: &str) -> String {
    value.trim_matches('"').to_string()
}

impl From<&str> for KCmdlineArg {
    fn from(cmdline: &str) -> Self {
        let mut result = KCmdlineArg::default();

        for arg in split_arg(cmdline) {
            // Arg => Entry | Entry "=" Value
            let (entry, value) = match arg.split_once('=') {
                None => (arg, None),
                Some((entry, value)) if !value.contains('=') => (entry, Some(unquote(value))),
                Some(_) => {
                    log::warn!(
                        "[KCmdline] Unable to parse kernel argument {}, skip for now",
                        arg
                    );
                    continue;
                }
            };
            // Entry => Module "." ModuleOptionName | KernelOptionName
            let entry_pattern: Vec<_> = entry.split('.').collect();
            let (node, option) = match entry_pattern.as_slice() {
                [option] => (None, *option),
                [module, option] => (Some(*module), *option),
                _ => {
                    log::warn!(
                        "[KCmdline] Unable to parse entry {} in argument {}, skip for now",
                        entry,
                        arg
                    );
                    continue;
                }
            };
            if option.is_empty() {
                log::warn!("[KCmdline] Empty option in argument {}, skip for now", arg);
                continue;
            }

            if let Some(module) = node {
                let module_arg = match value {
                    Some(value) => ModuleArg::KeyVal(option.to_string(), value),
                    None => ModuleArg::Arg(option.to_string()),
                };
                result
                    .module_args
                    .entry(module.to_string())
                    .or_default()
                    .push(module_arg);
            } else {
                result.options.insert(option.to_string(), value);
            }
        }

        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn options_and_module_args() {
        let cmdline = KCmdlineArg::from("log_level=debug quiet sched.policy=sjf sched.verbose");
        assert_eq!(cmdline.get_option("log_level"), Some(Some("debug")));
        assert_eq!(cmdline.get_option("quiet"), Some(None));
        assert_eq!(cmdline.get_option("missing"), None);
        assert_eq!(
            cmdline.get_module_args("sched"),
            Some(&vec![
                ModuleArg::KeyVal("policy".to_string(), "sjf".to_string()),
                ModuleArg::Arg("verbose".to_string()),
            ])
        );
    }

    #[test]
    fn quoted_values_keep_spaces() {
        let cmdline = KCmdlineArg::from("banner=\"hello world\"  sched.policy=rr");
        assert_eq!(cmdline.get_option("banner"), Some(Some("hello world")));
        assert_eq!(
            cmdline.get_module_args("sched"),
            Some(&vec![ModuleArg::KeyVal("policy".to_string(), "rr".to_string())])
        );
    }

    #[test]
    fn repeated_module_args_are_kept_in_order() {
        let cmdline = KCmdlineArg::from("sched.policy=rr sched.policy=fcfs");
        assert_eq!(
            cmdline.get_module_args("sched"),
            Some(&vec![
                ModuleArg::KeyVal("policy".to_string(), "rr".to_string()),
                ModuleArg::KeyVal("policy".to_string(), "fcfs".to_string()),
            ])
        );
    }

    #[test]
    fn malformed_arguments_are_skipped() {
        let cmdline = KCmdlineArg::from("a=b=c x.y.z=1 .=2 ok=1");
        assert_eq!(cmdline.get_option("a"), None);
        assert_eq!(cmdline.get_module_args("x"), None);
        assert_eq!(cmdline.get_option("ok"), Some(Some("1")));
    }
}
