//! The pre-structured business hours format, kept for reading old records only.

pub mod text;
