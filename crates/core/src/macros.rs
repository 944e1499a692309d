// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared across the workspace.
//!
//! - [`simple_display!`] — `Display` for fieldless enums as fixed strings
//! - [`setters!`] — chained by-value setters for config structs

/// Implement `Display` for an enum by mapping each variant to a literal.
///
/// ```ignore
/// crate::simple_display! {
///     ProducerClass {
///         Background => "background",
///         Foreground => "foreground",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant => $str, )+
                })
            }
        }
    };
}

/// Generate `fn field(mut self, v: Type) -> Self` setters inside an `impl`.
///
/// ```ignore
/// impl FilterConfig {
///     tl_core::setters! {
///         continuity_threshold: Duration,
///         drop_threshold: u32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    ($( $field:ident : $ty:ty ),* $(,)?) => {
        $(
            pub fn $field(mut self, v: $ty) -> Self {
                self.$field = v;
                self
            }
        )*
    };
}
