use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current time since the UNIX epoch
fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Name of the sub-directory one export run writes into: `<unix-seconds>_<millis>`.
pub fn export_folder_name() -> String {
    folder_name_at(since_epoch())
}

fn folder_name_at(time: Duration) -> String {
    format!("{}_{:03}", time.as_secs(), time.subsec_millis())
}
