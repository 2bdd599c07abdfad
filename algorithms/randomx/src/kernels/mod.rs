//! Kernel Dispatcher
//!
//! Hardware-specific implementations of the AES generators used by the VM.

#[cfg(target_arch = "x86_64")]
pub(crate) mod aesni;
pub mod constants;
pub mod portable;
