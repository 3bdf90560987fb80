// SPDX-License-Identifier: MPL-2.0

//! Boot-time information handed to the kernel.

pub mod kcmdline;
