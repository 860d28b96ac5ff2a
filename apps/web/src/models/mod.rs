pub mod document;
pub mod job;
pub mod result;
pub mod session;
pub mod settings;
