// Adapters layer: concrete implementations of the domain ports
// (SMTP transports, subscription sink, clocks, counter storage).

pub mod clock;
pub mod counter_store;
pub mod mocks;
pub mod smtp;
pub mod subscription;
