//! Core value objects shared by every part of the domain.

pub mod error;
pub mod ids;
pub mod string;
pub mod output_format;
