pub mod warm_worker;

pub use warm_worker::run as run_warm_worker;
