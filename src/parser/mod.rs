//! Input parsers: tab-indented outlines and Word documents.

pub mod docx;
pub mod tab_outline;
