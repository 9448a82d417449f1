pub mod upload;
pub mod ws;
