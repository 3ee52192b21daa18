//! Concrete service clients.

pub mod google;
pub mod local;
pub mod sftp;
