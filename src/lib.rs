#![doc = "dav-publish: transform a local file and publish it to a WebDAV store."]

//! The pipeline renames, timestamps and optionally zips a single file, checks that the target
//! object does not already exist on the remote store, and uploads it with HTTP basic auth.
//!
//! # Usage
//! - Binary: `dav-publish publish --help`.
//! - Library: build a [`config::PublishConfig`] (usually via [`load_config::load_config`]), wrap it
//!   in a [`publish::UploadJob`] and call [`publish::publish`] with any [`contract::RemoteStore`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod exists;
pub mod load_config;
pub mod publish;
pub mod rename;
pub mod webdav;

pub use error::PublishError;
