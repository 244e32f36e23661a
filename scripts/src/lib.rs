//! Scripts for deploying and upgrading the ssvETH vault wrapper.

#![deny(missing_docs)]

pub mod artifacts;
pub mod chain;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod deployments;
pub mod environment;
pub mod errors;
pub mod runner;
mod solidity;
pub mod steps;

#[cfg(test)]
mod test_utils;
