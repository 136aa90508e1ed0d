#![doc = "kubeglob-core: core pipeline for kubeglob."]

//! This crate holds everything between "a directory and a glob" and "a create call":
//! file discovery, manifest decoding, namespace defaulting and the sequential
//! submission loop. It has no network code; the remote side is reached only
//! through the [`contract::ResourceCreator`] trait.
//!
//! # Usage
//! Build an [`config::ApplyConfig`], hand it to [`submit::apply`] together with any
//! `ResourceCreator` implementation and inspect the returned report.

pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod locate;
pub mod pattern;
pub mod submit;

pub use error::{ApplyError, ApplyResult};
