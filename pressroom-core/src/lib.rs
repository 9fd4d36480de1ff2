#![doc = "pressroom-core: core pipeline library for pressroom."]

//! This crate holds everything in pressroom that is not a network client:
//! markup cleaning, paragraph segmentation, the retry executor, the generator
//! registry, the document model and the job processor.
//!
//! Concrete assistants, publishers and notifiers live in the `pressroom` binary
//! crate and plug in through the traits in [`assistant`] and [`contract`].
//!
//! # Usage
//! Build a [`generators::GeneratorRegistry`], populate it with
//! [`generators::register_builtin`], and hand it to a [`job::JobProcessor`]
//! together with the collaborators.

pub mod assistant;
pub mod content;
pub mod contract;
pub mod document;
pub mod generators;
pub mod job;
pub mod request;
pub mod retry;
