use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

pub const DATA_PATH_ENV: &str = "HOUSING_DATA_PATH";
pub const WINDOW_WIDTH_ENV: &str = "HOUSING_WINDOW_WIDTH";
pub const WINDOW_HEIGHT_ENV: &str = "HOUSING_WINDOW_HEIGHT";
pub const START_PAGE_ENV: &str = "HOUSING_START_PAGE";

/// Settings resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Dataset to load before the window opens.
    pub data_path: PathBuf,
    pub window_width: f32,
    pub window_height: f32,
    /// Sidebar label of the page shown first.
    pub start_page: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("final_housing_data.csv"),
            window_width: 1200.0,
            window_height: 800.0,
            start_page: "Home".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Defaults, then environment variables, then the first CLI argument.
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok(), std::env::args().nth(1))
    }

    fn resolve(env: impl Fn(&str) -> Option<String>, path_arg: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = env(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(w) = parse_dimension(WINDOW_WIDTH_ENV, env(WINDOW_WIDTH_ENV)) {
            config.window_width = w;
        }
        if let Some(h) = parse_dimension(WINDOW_HEIGHT_ENV, env(WINDOW_HEIGHT_ENV)) {
            config.window_height = h;
        }
        if let Some(page) = env(START_PAGE_ENV) {
            config.start_page = page;
        }
        if let Some(path) = path_arg {
            config.data_path = PathBuf::from(path);
        }

        config
    }
}

fn parse_dimension(key: &str, raw: Option<String>) -> Option<f32> {
    let raw = raw?;
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            log::warn!("Ignoring {key}={raw:?}: expected a positive number");
            None
        }
    }
}
