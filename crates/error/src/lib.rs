//! Kernel error definitions and the fatal-error facility.
//!
//! Provides the `define_kernel_error!` macro for consistent error type
//! definitions, and [`fatal`], which reports an invariant violation and
//! halts.
//!
//! ## Usage
//!
//! ### Simple errors (no payload)
//! ```ignore
//! define_kernel_error! {
//!     pub enum FrameError(0x02) {
//!         NotInitialized = 0x07 => "frame allocator not initialized",
//!     }
//! }
//! ```
//!
//! ### Errors carrying a payload
//! ```ignore
//! define_kernel_error! {
//!     pub enum FrameError(0x02) {
//!         InvalidAddress(PhysAddr) = 0x01 => "invalid address",
//!     }
//! }
//! ```
//!
//! The payload only needs `Debug + Clone + Copy + PartialEq + Eq + Display`.
//! It is printed in parentheses after the description.

#![no_std]

use core::fmt::Display;

/// Macro to define a kernel error type with consistent handling.
///
/// Every variant gets a 16-bit code: the subsystem in the high byte and the
/// variant code in the low byte.
#[macro_export]
macro_rules! define_kernel_error {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($subsystem:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(($inner:ty))? = $code:literal => $desc:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(($inner))?,
            )*
        }

        impl $name {
            /// Subsystem identifier for this error type.
            pub const SUBSYSTEM: u8 = $subsystem;

            /// Numeric error code, `(subsystem << 8) | variant`.
            pub const fn code(&self) -> u16 {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? _unused) => {
                            (($subsystem as u16) << 8) | $code
                        }
                    )*
                }
            }

            /// Short description, without the payload.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? _unused) => {
                            $desc
                        }
                    )*
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $(
                        $crate::define_kernel_error!(@pattern $variant $(($inner))? inner) => {
                            $crate::define_kernel_error!(@display_body self f $desc $(($inner))? inner)
                        }
                    )*
                }
            }
        }

        impl core::error::Error for $name {}
    };

    (@pattern $variant:ident ($inner:ty) $bind:ident) => { Self::$variant($bind) };
    (@pattern $variant:ident $bind:ident) => { Self::$variant };

    (@display_body $self:ident $f:ident $desc:literal ($inner:ty) $bind:ident) => {
        write!($f, "E{:04X}: {} ({})", $self.code(), $desc, $bind)
    };
    (@display_body $self:ident $f:ident $desc:literal $bind:ident) => {
        write!($f, "E{:04X}: {}", $self.code(), $desc)
    };
}

/// Report an unrecoverable invariant violation and halt.
///
/// Memory accounting that has gone wrong cannot be repaired from inside the
/// kernel, so this never returns. The error is logged, then the kernel panic
/// handler takes over and stops the hart.
#[cold]
#[inline(never)]
#[track_caller]
#[allow(clippy::panic)]
pub fn fatal<E: Display>(err: E) -> ! {
    log::error!("fatal: {err}");
    panic!("{err}");
}
