use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml` from this manager's directory.
    /// A missing file yields the defaults.
    pub fn read_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub workbook: WorkbookConfig,
    pub export: ExportConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

/// Which workbook to open and which columns of which sheets to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    pub path: PathBuf,
    pub sheets: Vec<SheetConfig>,
}

/// Allow-list for one sheet: only these headers (matched exactly) are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub name: String,
    pub columns: Vec<String>,
}

impl SheetConfig {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn allows(&self, header: &str) -> bool {
        self.columns.iter().any(|c| c == header)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportConfig {
    /// Where exported files go; `None` means the current directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    pub sidebar_width: u16,
    pub max_column_width: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub dimmed: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub table_border: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub modal_border_error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Log file path; `None` means `<cache dir>/ggcdash/ggcdash.log`.
    pub log_file: Option<PathBuf>,
}

/// Sheets and columns of the GGC laptop profit workbook.
pub fn default_sheets() -> Vec<SheetConfig> {
    vec![
        SheetConfig::new(
            "Purchase",
            &[
                "Date of Purchase",
                "Month",
                "Branch",
                "Vendor Name",
                "Model No.",
                "Serial No",
                "Part Code",
                "Bill No.",
                "Price (Excuding GST)",
                "Extra Support Committed",
                "HP ST Support",
            ],
        ),
        SheetConfig::new(
            "Original Sale",
            &[
                "Date of Sales",
                "Month",
                "Branch",
                "Party Name",
                "Model No.",
                "Bill No.",
                "Part Code",
                "Price (Excuding GST)",
                "HP SO Support",
            ],
        ),
        SheetConfig::new(
            "Tally-II Sale",
            &[
                "Month",
                "Branch",
                "Party Name",
                "Model No.",
                "Serial No.",
                "Part Code",
                "HP SO Support",
            ],
        ),
        SheetConfig::new(
            "Return",
            &[
                "Date of Purchase",
                "Month",
                "Branch",
                "Party Name",
                "Model No.",
                "Serial No.",
                "Return date",
                "SRN No",
                "Return Value",
                "Actual Profit/Los",
            ],
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            workbook: WorkbookConfig::default(),
            export: ExportConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("GGC_Laptop_Profit_Sheet.xlsx"),
            sheets: default_sheets(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "GGC Laptop Profit Sheet Data Analysis".to_string(),
            sidebar_width: 36,
            max_column_width: 28,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_border: "cyan".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            modal_border_error: "red".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        match ConfigManager::new(app_name) {
            Ok(manager) => Self::load_with(&manager),
            Err(e) => {
                // No home directory: run on the built-in defaults
                tracing::warn!("{}", e);
                let config = AppConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Defaults merged with the user file of `manager`. A file that cannot be
    /// read or parsed is an error.
    pub fn load_with(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.read_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.workbook.merge(other.workbook);
        self.export.merge(other.export);
        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.workbook.sheets.is_empty() {
            return Err(eyre!("[workbook] must list at least one sheet"));
        }
        for sheet in &self.workbook.sheets {
            if sheet.name.trim().is_empty() {
                return Err(eyre!("[[workbook.sheets]] entries need a non-empty name"));
            }
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.display.sidebar_width < 16 {
            return Err(eyre!("sidebar_width must be at least 16"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

// Merge implementations for each config section
impl WorkbookConfig {
    pub fn merge(&mut self, other: Self) {
        let default = WorkbookConfig::default();
        if other.path != default.path {
            self.path = other.path;
        }
        if other.sheets != default.sheets && !other.sheets.is_empty() {
            self.sheets = other.sheets;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        if other.directory.is_some() {
            self.directory = other.directory;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.title != default.title {
            self.title = other.title;
        }
        if other.sidebar_width != default.sidebar_width {
            self.sidebar_width = other.sidebar_width;
        }
        if other.max_column_width != default.max_column_width {
            self.max_column_width = other.max_column_width;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        macro_rules! validate_color {
            ($field:expr, $name:expr) => {
                parser
                    .parse($field)
                    .map_err(|e| eyre!("Invalid color value for '{}': {}", $name, e))?;
            };
        }

        validate_color!(&self.primary, "primary");
        validate_color!(&self.secondary, "secondary");
        validate_color!(&self.success, "success");
        validate_color!(&self.error, "error");
        validate_color!(&self.dimmed, "dimmed");
        validate_color!(&self.controls_bg, "controls_bg");
        validate_color!(&self.text_primary, "text_primary");
        validate_color!(&self.text_secondary, "text_secondary");
        validate_color!(&self.table_header, "table_header");
        validate_color!(&self.table_border, "table_border");
        validate_color!(&self.modal_border, "modal_border");
        validate_color!(&self.modal_border_active, "modal_border_active");
        validate_color!(&self.modal_border_error, "modal_border_error");

        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();

        macro_rules! merge_color {
            ($field:ident) => {
                if other.$field != default.$field {
                    self.$field = other.$field;
                }
            };
        }

        merge_color!(primary);
        merge_color!(secondary);
        merge_color!(success);
        merge_color!(error);
        merge_color!(dimmed);
        merge_color!(controls_bg);
        merge_color!(text_primary);
        merge_color!(text_secondary);
        merge_color!(table_header);
        merge_color!(table_border);
        merge_color!(modal_border);
        merge_color!(modal_border_active);
        merge_color!(modal_border_error);
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, `indexed(n)` or named)
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),
            "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
                Ok(Color::Indexed(8))
            }
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),
            "reset" => Ok(Color::Reset),
            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 gray variants, indexed(n), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            Color::Rgb(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let c = &config.colors;
        let entries = [
            ("primary", &c.primary),
            ("secondary", &c.secondary),
            ("success", &c.success),
            ("error", &c.error),
            ("dimmed", &c.dimmed),
            ("controls_bg", &c.controls_bg),
            ("text_primary", &c.text_primary),
            ("text_secondary", &c.text_secondary),
            ("table_header", &c.table_header),
            ("table_border", &c.table_border),
            ("modal_border", &c.modal_border),
            ("modal_border_active", &c.modal_border_active),
            ("modal_border_error", &c.modal_border_error),
        ];

        let mut colors = HashMap::new();
        for (name, value) in entries {
            colors.insert(name.to_string(), parser.parse(value)?);
        }

        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
