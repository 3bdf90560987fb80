// SPDX-License-Identifier: MPL-2.0

#![allow(unused)]

pub(crate) use alloc::{
    boxed::Box,
    collections::VecDeque,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};
pub(crate) use core::fmt::Debug;

pub(crate) use log::{debug, error, info, trace, warn};
pub(crate) use nachos_machine::{
    irq::IrqLevel,
    task::{ContextSwitch, ThreadId},
    Machine,
};
pub(crate) use spin::Mutex as SpinLock;

pub(crate) use crate::{
    error::{Errno, Error},
    Result,
};
pub(crate) use crate::return_errno_with_message;
