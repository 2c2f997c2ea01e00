//! Clock port - Wall time in milliseconds.

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}
