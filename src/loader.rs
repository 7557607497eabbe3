use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::DashboardResult;
use crate::config::SheetWindow;
use crate::record::{SalesRecord, SalesTable};

/// Number of loaded rows kept as raw text for the data preview
pub const PREVIEW_ROWS: usize = 5;

/// Header of the derived hour-of-day column
pub const HOUR_HEADER: &str = "hour";

const SECONDS_PER_DAY: f64 = 86_400.0;

static EMPTY_CELL: Data = Data::Empty;

/// Positions of the required headers inside the loaded window
struct ColumnMap {
    city: usize,
    customer_type: usize,
    gender: usize,
    branch: usize,
    payment: usize,
    product_line: usize,
    total: usize,
    rating: usize,
    time: usize,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> DashboardResult<Self> {
        let find = |name: &str| -> DashboardResult<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| format!("Missing column {:?} in sales sheet header", name).into())
        };

        Ok(ColumnMap {
            city: find("City")?,
            customer_type: find("Customer_type")?,
            gender: find("Gender")?,
            branch: find("Branch")?,
            payment: find("Payment")?,
            product_line: find("Product line")?,
            total: find("Total")?,
            rating: find("Rating")?,
            time: find("Time")?,
        })
    }
}

/// Load the sales table from a workbook
///
/// Reads the rectangle described by `window`: the first row after the
/// skipped rows holds the headers, the rows below it (at most
/// `window.max_rows`) hold the records. Reading stops early at the first
/// row that is empty across the whole window.
///
/// Any problem with the file, the sheet, a header or a cell value aborts
/// the load; there is no partial result.
///
/// # Examples
/// ```no_run
/// use sales_dashboard::config::SheetWindow;
/// use sales_dashboard::loader::load_sales;
///
/// match load_sales("data/supermarkt_sales.xlsx", &SheetWindow::default()) {
///     Ok(table) => println!("Loaded {} sales records", table.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn load_sales(filepath: impl AsRef<Path>, window: &SheetWindow) -> DashboardResult<SalesTable> {
    let path = filepath.as_ref();
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open workbook {}: {}", path.display(), e))?;

    if !workbook.sheet_names().iter().any(|name| name == &window.sheet) {
        return Err(format!("Sheet {:?} not found in {}", window.sheet, path.display()).into());
    }

    let range = workbook
        .worksheet_range(&window.sheet)
        .map_err(|e| format!("Failed to read sheet {:?}: {}", window.sheet, e))?;

    let table = read_window(&range, window)?;
    info!(
        "Loaded {} sales records from {} (sheet {:?})",
        table.len(),
        path.display(),
        window.sheet
    );

    Ok(table)
}

/// Convert a worksheet range into a sales table
pub fn read_window(range: &Range<Data>, window: &SheetWindow) -> DashboardResult<SalesTable> {
    let header_row = window.skip_rows;
    let mut headers: Vec<String> = row_cells(range, header_row, window)
        .map(cell_text)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(format!("No header row found at row {} of the sales sheet", header_row + 1).into());
    }

    let columns = ColumnMap::from_headers(&headers)?;
    let last_row = range.end().map(|(row, _)| row).unwrap_or(0);

    let mut records = Vec::new();
    let mut preview = Vec::new();

    for offset in 0..window.max_rows {
        let row = header_row + 1 + offset;
        if row > last_row {
            break;
        }

        let cells: Vec<&Data> = row_cells(range, row, window).collect();
        if cells.iter().all(|cell| is_blank(cell)) {
            debug!("Stopping at blank row {}", row + 1);
            break;
        }

        let record = parse_record(&cells, &columns, row)?;

        if preview.len() < PREVIEW_ROWS {
            let mut texts: Vec<String> = cells.iter().map(|cell| cell_text(cell)).collect();
            texts[columns.time] = record.time.clone();
            texts.push(record.hour.to_string());
            preview.push(texts);
        }

        records.push(record);
    }

    headers.push(HOUR_HEADER.to_string());

    Ok(SalesTable::new(headers, preview, records))
}

fn row_cells<'a>(
    range: &'a Range<Data>,
    row: u32,
    window: &SheetWindow,
) -> impl Iterator<Item = &'a Data> + 'a {
    (window.first_column..=window.last_column)
        .map(move |col| range.get_value((row, col)).unwrap_or(&EMPTY_CELL))
}

fn parse_record(cells: &[&Data], columns: &ColumnMap, row: u32) -> DashboardResult<SalesRecord> {
    // 1-based row number for messages, as shown in spreadsheet programs
    let line = row + 1;

    let number = |index: usize, name: &str| -> DashboardResult<f64> {
        cell_number(cells[index])
            .ok_or_else(|| format!("Row {}: invalid {} value {:?}", line, name, cells[index]).into())
    };

    let time = parse_time_of_day(cells[columns.time])
        .map_err(|e| format!("Row {}: {}", line, e))?;

    Ok(SalesRecord {
        city: cell_text(cells[columns.city]),
        customer_type: cell_text(cells[columns.customer_type]),
        gender: cell_text(cells[columns.gender]),
        branch: cell_text(cells[columns.branch]),
        payment: cell_text(cells[columns.payment]),
        product_line: cell_text(cells[columns.product_line]),
        total: number(columns.total, "Total")?,
        rating: number(columns.rating, "Rating")?,
        time: time.format("%H:%M:%S").to_string(),
        hour: time.hour() as u8,
    })
}

/// Parse a time-of-day cell
///
/// Text cells must use the `HH:MM:SS` format. Excel time and date-time
/// serials are reduced to their fractional day.
pub fn parse_time_of_day(cell: &Data) -> DashboardResult<NaiveTime> {
    match cell {
        Data::String(s) => {
            let time = NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
                .map_err(|e| format!("invalid time {:?}: {}", s, e))?;
            Ok(time)
        }
        Data::DateTime(dt) => time_from_serial(dt.as_f64()),
        Data::Float(f) => time_from_serial(*f),
        Data::DateTimeIso(s) => {
            let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.time()))
                .map_err(|e| format!("invalid time {:?}: {}", s, e))?;
            Ok(time)
        }
        other => Err(format!("unsupported time value {:?}", other).into()),
    }
}

fn time_from_serial(serial: f64) -> DashboardResult<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(format!("invalid time serial {}", serial).into());
    }

    // 23:59:59.6 rounds up to a full day
    let seconds = ((serial.fract() * SECONDS_PER_DAY).round() as u32) % 86_400;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
        .ok_or_else(|| format!("invalid time serial {}", serial))?;
    Ok(time)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render a cell as the text shown in the preview table
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => serial_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
        Data::Empty => String::new(),
    }
}

fn serial_text(serial: f64) -> String {
    if (0.0..1.0).contains(&serial) {
        return time_from_serial(serial)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|_| serial.to_string());
    }

    // Excel's day zero, accounting for the 1900 leap year bug
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;

    match epoch.and_then(|e| e.checked_add_signed(Duration::seconds(seconds))) {
        Some(dt) if dt.time().num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}

/// Process-wide memo of the loaded sales table
///
/// The first successful load is kept for the life of the process and never
/// invalidated. A failed load is not remembered, so the next call tries
/// again.
pub struct DatasetCache {
    path: PathBuf,
    window: SheetWindow,
    table: Mutex<Option<Arc<SalesTable>>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, window: SheetWindow) -> Self {
        DatasetCache {
            path: path.into(),
            window,
            table: Mutex::new(None),
        }
    }

    /// Cache pre-filled with an already loaded table
    pub fn preloaded(table: SalesTable) -> Self {
        DatasetCache {
            path: PathBuf::new(),
            window: SheetWindow::default(),
            table: Mutex::new(Some(Arc::new(table))),
        }
    }

    pub fn get(&self) -> DashboardResult<Arc<SalesTable>> {
        let mut slot = self
            .table
            .lock()
            .map_err(|_| "Dataset cache lock poisoned")?;

        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_sales(&self.path, &self.window)?);
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn is_loaded(&self) -> bool {
        self.table.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    const HEADERS: [&str; 17] = [
        "Invoice ID",
        "Branch",
        "City",
        "Customer_type",
        "Gender",
        "Product line",
        "Unit price",
        "Quantity",
        "Tax 5%",
        "Total",
        "Date",
        "Time",
        "Payment",
        "cogs",
        "gross margin percentage",
        "gross income",
        "Rating",
    ];

    type Row<'a> = (&'a str, &'a str, &'a str, &'a str, f64, &'a str, &'a str, f64);

    // Branch, City, Customer_type, Gender, Product line, Total, Time, Payment, Rating
    fn write_workbook(dir: &TempDir, sheet: &str, rows: &[Row], time_override: Option<&str>) -> PathBuf {
        let path = dir.path().join("sales.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();

        worksheet.write_string(0, 1, "Supermarket sales").unwrap();
        for (c, header) in HEADERS.iter().enumerate() {
            worksheet.write_string(3, (c + 1) as u16, *header).unwrap();
        }

        for (r, (city, ctype, gender, line, total, time, payment, rating)) in rows.iter().enumerate() {
            let row = (r + 4) as u32;
            let branch = if *city == "Yangon" { "A" } else { "B" };
            worksheet.write_string(row, 1, &format!("{:03}-00-0000", r)).unwrap();
            worksheet.write_string(row, 2, branch).unwrap();
            worksheet.write_string(row, 3, *city).unwrap();
            worksheet.write_string(row, 4, *ctype).unwrap();
            worksheet.write_string(row, 5, *gender).unwrap();
            worksheet.write_string(row, 6, *line).unwrap();
            worksheet.write_number(row, 10, *total).unwrap();
            worksheet.write_string(row, 12, time_override.unwrap_or(*time)).unwrap();
            worksheet.write_string(row, 13, *payment).unwrap();
            worksheet.write_number(row, 17, *rating).unwrap();
        }

        workbook.save(&path).unwrap();
        path
    }

    fn sample_rows() -> Vec<Row<'static>> {
        vec![
            ("Yangon", "Member", "Female", "Health and beauty", 548.97, "13:08:00", "Ewallet", 9.1),
            ("Naypyitaw", "Normal", "Female", "Electronic accessories", 80.22, "10:29:00", "Cash", 9.6),
            ("Yangon", "Normal", "Male", "Home and lifestyle", 340.53, "13:23:00", "Credit card", 7.4),
        ]
    }

    #[test]
    fn loads_window_and_derives_hour() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "Sales", &sample_rows(), None);

        let table = load_sales(&path, &SheetWindow::default()).unwrap();
        assert_eq!(table.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.city, "Yangon");
        assert_eq!(first.branch, "A");
        assert_eq!(first.product_line, "Health and beauty");
        assert_eq!(first.total, 548.97);
        assert_eq!(first.rating, 9.1);
        assert_eq!(first.time, "13:08:00");
        assert_eq!(first.hour, 13);
        assert_eq!(table.records[1].hour, 10);

        assert_eq!(table.headers.len(), HEADERS.len() + 1);
        assert_eq!(table.headers.last().map(String::as_str), Some(HOUR_HEADER));
        assert_eq!(table.preview.len(), 3);
        assert_eq!(table.preview[0].last().map(String::as_str), Some("13"));
    }

    #[test]
    fn row_cap_limits_records() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "Sales", &sample_rows(), None);
        let window = SheetWindow {
            max_rows: 2,
            ..SheetWindow::default()
        };

        let table = load_sales(&path, &window).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "Other", &sample_rows(), None);

        let err = load_sales(&path, &SheetWindow::default()).unwrap_err();
        assert!(err.to_string().contains("Sales"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_sales(dir.path().join("absent.xlsx"), &SheetWindow::default()).is_err());
    }

    #[test]
    fn bad_time_aborts_the_load() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "Sales", &sample_rows(), Some("1:08 PM"));

        let err = load_sales(&path, &SheetWindow::default()).unwrap_err();
        assert!(err.to_string().starts_with("Row 5"));
    }

    #[test]
    fn missing_header_aborts_the_load() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "Sales", &sample_rows(), None);
        // Window that stops before the Rating column
        let window = SheetWindow::new("Sales", 3, "B:Q", 1000).unwrap();

        let err = load_sales(&path, &window).unwrap_err();
        assert!(err.to_string().contains("Rating"));
    }

    #[test]
    fn time_cells_in_every_encoding() {
        let text = parse_time_of_day(&Data::String("09:41:07".to_string())).unwrap();
        assert_eq!(text.hour(), 9);

        // 0.5 of a day is noon
        let serial = parse_time_of_day(&Data::Float(0.5)).unwrap();
        assert_eq!(serial.hour(), 12);

        // A date-time serial keeps only its time of day
        let with_date = parse_time_of_day(&Data::Float(43_466.75)).unwrap();
        assert_eq!(with_date.hour(), 18);

        let iso = parse_time_of_day(&Data::DateTimeIso("2019-01-05T23:59:59".to_string())).unwrap();
        assert_eq!(iso.hour(), 23);

        assert!(parse_time_of_day(&Data::String("25:00:00".to_string())).is_err());
        assert!(parse_time_of_day(&Data::Empty).is_err());
        assert!(parse_time_of_day(&Data::Float(-1.0)).is_err());
    }

    #[test]
    fn hour_stays_in_range_for_every_second_of_the_day() {
        for seconds in (0..86_400).step_by(97) {
            let time = time_from_serial(seconds as f64 / SECONDS_PER_DAY).unwrap();
            assert!(time.hour() <= 23);
        }
        assert_eq!(time_from_serial(0.999_999_9).unwrap().hour(), 0);
    }

    #[test]
    fn cache_keeps_first_successful_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sales.xlsx");
        let cache = DatasetCache::new(&path, SheetWindow::default());

        // Nothing there yet, and the failure is not remembered
        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());

        let written = write_workbook(&dir, "Sales", &sample_rows(), None);
        assert_eq!(written, path);
        let first = cache.get().unwrap();
        assert!(cache.is_loaded());

        // Later changes to the file are not picked up
        std::fs::remove_file(&path).unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
