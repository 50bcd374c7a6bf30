//! `bridgekit-core` connects untrusted pages shown in a wallet's embedded
//! browser to the wallet host.
//!
//! The page side runs a [`Provider`], the host side one [`HostBridge`] per
//! embedded page. They talk over a [`MessagePort`] in each direction. Keys
//! and the user interface stay with the host application, reached through
//! the [`WalletBackend`] and [`ConsentPresenter`] foreign traits.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod approval;

mod backend;
pub use backend::*;

mod bridge;
pub use bridge::HostBridge;

mod channel;
pub use channel::*;

mod config;
pub use config::*;

mod consent;
pub use consent::*;

pub mod defaults;

mod envelope;
pub use envelope::*;

mod error;
pub use error::*;

/// Forwarding of this crate's `log` records to a host logger.
pub mod logger;

mod method;
pub use method::*;

mod navigation;
pub use navigation::*;

mod origin;
pub use origin::*;

mod permissions;
pub use permissions::*;

mod provider;
pub use provider::*;

pub mod security;
pub use security::{
    NavigationAssessment, NavigationChoice, NavigationWarning, SecurityLists, SecurityPolicy,
    Threat, WarningKind,
};

pub mod storage;

pub mod units;

uniffi::setup_scaffolding!("bridgekit_core");
