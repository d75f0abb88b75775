//! Build information

use tracing::info;

/// UTC build time, stamped through `PD_BUILD_TS` at compile time.
pub const PD_BUILD_TS: &str = match option_env!("PD_BUILD_TS") {
    Some(ts) => ts,
    None => "None",
};

/// Git commit hash, stamped through `PD_GIT_HASH` at compile time.
pub const PD_GIT_HASH: &str = match option_env!("PD_GIT_HASH") {
    Some(hash) => hash,
    None => "None",
};

/// Log the version banner.
pub fn print_pd_info() {
    info!("Welcome to the PD.");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Git Commit Hash: {}", PD_GIT_HASH);
    info!("UTC Build Time:  {}", PD_BUILD_TS);
    info!(
        "Started at: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
    );
}
