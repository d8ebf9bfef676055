//! # WS-Management Protocol Client
//!
//! The wire-level collaborator for talking to baseboard management
//! controllers: SOAP envelope construction, HTTPS transport with basic
//! authentication, fault detection, and search utilities over response
//! bodies.
//!
//! Consumers depend on the [`ManagementClient`] trait rather than the
//! concrete [`HttpClient`], so probe logic can be exercised against the
//! scripted clients in [`testing`].

mod client;
mod envelope;
pub mod testing;
pub mod xml;

pub use client::{HttpClient, ManagementClient, Response, WsmanError};
