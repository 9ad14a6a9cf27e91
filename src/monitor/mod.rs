mod backend;
mod enumeration;

pub use backend::DisplayTransport;
pub use enumeration::DdcTransport;
