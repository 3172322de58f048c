use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "SaluLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/SaluLink/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("SaluLink")
}

/// Get the reference-data directory (the six PMB CSV files)
pub fn reference_data_dir() -> PathBuf {
    app_data_dir().join("reference")
}

/// Get the case database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("salulink.db")
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Initialize tracing for embedders and test harnesses that want output.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("SaluLink"));
    }

    #[test]
    fn reference_dir_under_app_data() {
        let reference = reference_data_dir();
        let app = app_data_dir();
        assert!(reference.starts_with(app));
        assert!(reference.ends_with("reference"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("salulink.db"));
    }

    #[test]
    fn app_name_is_salulink() {
        assert_eq!(APP_NAME, "SaluLink");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
