pub mod cli;
pub mod docs;
pub mod document;
pub mod generator;
pub mod outline;
pub mod parser;
