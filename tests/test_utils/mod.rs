//! Test Utilities and Mocks
//!
//! Scripted stand-ins for the local shell, the ssh transport and scp, plus
//! fixtures that wire them into a [`shellrunner::Runner`].

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_engine;

pub use fixtures::{test_config, write_script, TestRig};
pub use mock_engine::{MockEngine, MockTransfer, TransferCall};
pub use mock_transport::{MockHost, MockTransport};
