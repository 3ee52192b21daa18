pub mod backend;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod imagetool;
pub mod job;
pub mod progress;
pub mod prompt;
pub mod record;
pub mod sheet;

#[cfg(test)]
mod tests;
