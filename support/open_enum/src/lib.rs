// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_std]

//! Provides the [`open_enum`] macro.

/// Declares an enum-like struct for a wire-format code point whose full value
/// set is not under our control.
///
/// Firmware is free to hand back type or subtype values that post-date (or
/// simply ignore) the UEFI specification revision this code was written
/// against. Matching such a value against a true Rust `enum` would be
/// undefined behavior after a `transmute`, and a conversion step would lose
/// the original value. Instead, this macro expands to a
/// `#[repr(transparent)]` newtype over the storage type with one associated
/// constant per named value, so unknown values flow through untouched:
///
/// ```
/// # #[macro_use] extern crate open_enum; fn main() {
/// use open_enum::open_enum;
/// open_enum! {
///     pub enum DeviceType: u8 {
///         #![expect(missing_docs)] // applies to the generated constants
///         HARDWARE = 0x01,
///         END = 0x7F,
///     }
/// }
///
/// assert_eq!(DeviceType::HARDWARE.0, 0x01);
/// assert_eq!(DeviceType::END.name(), Some("END"));
/// assert_eq!(DeviceType(0x42).name(), None);
/// assert_eq!(format!("{:?}", DeviceType::END), "END");
/// assert_eq!(format!("{:?}", DeviceType(0x42)), "66");
/// # }
/// ```
///
/// The generated struct derives `Copy`, `Clone`, `Eq`, `PartialEq`, `Hash`,
/// `Ord`, and `PartialOrd`, and gains a `name` method returning the
/// constant's identifier for named values. `Debug` prints that name when one
/// exists and falls back to the raw value, so an unrecognized code point
/// never disappears from logs or test failures.
#[macro_export]
macro_rules! open_enum {
    (
        $(#[$a:meta])*
        $v:vis enum $name:ident : $storage:ty {
            $(#![$implattr:meta])*
            $(
                $(#[$vattr:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        $(#[$a])*
        $v struct $name(pub $storage);

        $(#[$implattr])*
        impl $name {
            $(
                $(#[$vattr])*
                pub const $variant: $name = $name($value);
            )*
        }

        impl $name {
            /// The identifier of the named constant holding this value, if
            /// there is one.
            $v fn name(&self) -> Option<&'static str> {
                #![allow(unreachable_patterns)]
                match *self {
                    $( Self::$variant => Some(stringify!($variant)), )*
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.name() {
                    Some(name) => fmt.pad(name),
                    None => ::core::fmt::Debug::fmt(&self.0, fmt),
                }
            }
        }
    }
}
