//! Ravensh Exec - Interpreter Process Plumbing
//!
//! This crate owns everything that touches an OS process:
//! - Pipe reader: drain a byte stream with a quiescence window
//! - Process: a live interpreter with its three standard streams
//! - Args: shell-like argument tokenizer
//! - Program: one-shot execution with a deadline and capped output

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod command;
pub mod error;
mod group;
pub mod pipe_reader;
pub mod process;
pub mod program;

pub use args::split_args;
pub use command::InterpreterCommand;
pub use error::{Error, Result};
pub use pipe_reader::BoundedPipeReader;
pub use process::{InterpreterProcess, PipeSettings};
pub use program::{ExecutionLimits, ExecutionResult, ExecutionStatus, ProgramRequest, ProgramRunner};
