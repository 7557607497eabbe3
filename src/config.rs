use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::DashboardResult;

// Constants
pub const DATA_FILE: &str = "data/supermarkt_sales.xlsx";
pub const SHEET_NAME: &str = "Sales";
pub const SKIP_ROWS: u32 = 3;
pub const COLUMN_RANGE: &str = "B:R";
pub const MAX_ROWS: u32 = 1000;
pub const STYLESHEET: &str = "style.css";
pub const STATIC_DIR: &str = "static";
pub const BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const CONTACT_FORM_ACTION: &str = "https://formsubmit.co/ndelly@gmail.com";
pub const CONTACT_IMAGE_URL: &str =
    "https://complexdatainsights.com/wp-content/uploads/2020/09/contactNewk.png";

lazy_static! {
    static ref COLUMN_RANGE_RE: Regex = Regex::new(r"^([A-Za-z]{1,3}):([A-Za-z]{1,3})$").unwrap();
}

/// The rectangle of the worksheet that holds the sales table
///
/// `first_column` and `last_column` are zero-based and inclusive. The row
/// right after the skipped rows is the header row.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetWindow {
    pub sheet: String,
    pub skip_rows: u32,
    pub first_column: u32,
    pub last_column: u32,
    pub max_rows: u32,
}

impl SheetWindow {
    /// Build a window from a column range such as `"B:R"`
    pub fn new(sheet: &str, skip_rows: u32, columns: &str, max_rows: u32) -> DashboardResult<Self> {
        let (first_column, last_column) = parse_column_range(columns)?;
        Ok(SheetWindow {
            sheet: sheet.to_string(),
            skip_rows,
            first_column,
            last_column,
            max_rows,
        })
    }

    pub fn width(&self) -> usize {
        (self.last_column - self.first_column + 1) as usize
    }
}

impl Default for SheetWindow {
    fn default() -> Self {
        // B:R
        SheetWindow {
            sheet: SHEET_NAME.to_string(),
            skip_rows: SKIP_ROWS,
            first_column: 1,
            last_column: 17,
            max_rows: MAX_ROWS,
        }
    }
}

/// Runtime settings for the dashboard server
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub data_file: PathBuf,
    pub window: SheetWindow,
    pub stylesheet: PathBuf,
    pub static_dir: PathBuf,
    pub bind_address: SocketAddr,
    pub contact_form_action: String,
    pub contact_image_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_file: PathBuf::from(DATA_FILE),
            window: SheetWindow::default(),
            stylesheet: PathBuf::from(STYLESHEET),
            static_dir: PathBuf::from(STATIC_DIR),
            bind_address: BIND_ADDRESS
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000))),
            contact_form_action: CONTACT_FORM_ACTION.to_string(),
            contact_image_url: CONTACT_IMAGE_URL.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Apply positional command line arguments: `[data_file] [bind_address]`
    ///
    /// `args` excludes the program name. An address that does not parse is
    /// ignored and the default is kept.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = DashboardConfig::default();
        let mut args = args.into_iter();

        if let Some(data_file) = args.next() {
            config.data_file = PathBuf::from(data_file);
        }

        if let Some(address) = args.next() {
            match address.parse() {
                Ok(addr) => config.bind_address = addr,
                Err(_) => warn!(
                    "Ignoring invalid bind address {:?}, using {}",
                    address, config.bind_address
                ),
            }
        }

        config
    }
}

/// Convert a column name to a zero-based index (A=0, B=1, AA=26)
pub fn column_index(name: &str) -> DashboardResult<u32> {
    if name.is_empty() {
        return Err("Empty column name".into());
    }

    let mut index: u32 = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(format!("Invalid column name: {}", name).into());
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        index = index * 26 + digit;
    }

    Ok(index - 1)
}

/// Parse a column range such as `"B:R"` into inclusive zero-based indices
pub fn parse_column_range(range: &str) -> DashboardResult<(u32, u32)> {
    let caps = COLUMN_RANGE_RE
        .captures(range.trim())
        .ok_or_else(|| format!("Invalid column range: {}. Expected format: B:R", range))?;

    let first = column_index(&caps[1])?;
    let last = column_index(&caps[2])?;

    if first > last {
        return Err(format!("Column range {} ends before it starts", range).into());
    }

    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_map_to_zero_based_indices() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("B").unwrap(), 1);
        assert_eq!(column_index("r").unwrap(), 17);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert_eq!(column_index("AZ").unwrap(), 51);
        assert!(column_index("A1").is_err());
        assert!(column_index("").is_err());
    }

    #[test]
    fn default_window_matches_b_to_r() {
        let parsed = SheetWindow::new(SHEET_NAME, SKIP_ROWS, COLUMN_RANGE, MAX_ROWS).unwrap();
        assert_eq!(parsed, SheetWindow::default());
        assert_eq!(parsed.width(), 17);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!(parse_column_range("B-R").is_err());
        assert!(parse_column_range("R:B").is_err());
        assert!(parse_column_range("B1:R10").is_err());
    }

    #[test]
    fn positional_args_override_defaults() {
        let config = DashboardConfig::from_args(vec![
            "sales.xlsx".to_string(),
            "0.0.0.0:8080".to_string(),
        ]);
        assert_eq!(config.data_file, PathBuf::from("sales.xlsx"));
        assert_eq!(config.bind_address.port(), 8080);

        let config = DashboardConfig::from_args(vec!["sales.xlsx".to_string(), "nope".to_string()]);
        assert_eq!(config.bind_address.port(), 3000);

        let config = DashboardConfig::from_args(Vec::new());
        assert_eq!(config.data_file, PathBuf::from(DATA_FILE));
    }
}
