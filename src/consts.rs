pub mod transport {
    /// `POST /process` may take a while on large system descriptions.
    pub const SUBMIT_TIMEOUT_SECS: u64 = 30;
    /// Client-wide timeout for every other request.
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

pub mod polling {
    /// Period of the status poll of an active job.
    pub const POLL_INTERVAL_MS: u64 = 500;
    /// Capacity of the session event channel.
    pub const EVENT_QUEUE_SIZE: usize = 100;
}

pub mod search {
    /// Random-walk length asked of the simulator per epoch.
    pub const DEFAULT_BRANCHES: u32 = 50;
    pub const DEFAULT_EPOCHS: u32 = 1;
}

pub mod backend {
    pub const LOCAL_CHECKER_URL: &str = "http://127.0.0.1:7050";
    pub const LOCAL_SIMULATOR_URL: &str = "http://127.0.0.1:5000";
}
