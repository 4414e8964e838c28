//! Output generators.
//!
//! This module contains generators that write the parsed structures out:
//! outline trees as XMind packages, Word documents as Markdown.

pub mod markdown;
pub mod xmind;
