pub mod aggregator;
pub mod codec;
pub mod formatter;
pub mod link;
pub mod loopback;
pub mod ports;
pub mod scheduler;
pub mod session;
