//! `bridgekit` is the library hosts link against. It re-exports
//! [`bridgekit_core`] together with its foreign-language scaffolding.

bridgekit_core::uniffi_reexport_scaffolding!();

pub use bridgekit_core::*;
