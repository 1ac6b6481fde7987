use crate::error::StoreError;
use crate::model::StudentInput;
use crate::store::StudentStore;
use crate::validate::validate_student;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

pub const EXPORT_HEADER: [&str; 5] = ["Name", "Roll", "Department", "Email", "Phone"];
const REQUIRED_COLUMNS: [&str; 4] = ["Name", "Roll", "Department", "Email"];
const DELIMITERS: [char; 3] = [',', ';', '\t'];

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("file has no header row")]
    NoHeader,
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub line: usize,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub import_id: String,
    pub succeeded: usize,
    pub failed: usize,
    pub created_ids: Vec<i64>,
    pub failures: Vec<RowFailure>,
}

/// Picks the most frequent of `,` `;` tab outside quotes on the header line,
/// which is the first line holding anything but separators and whitespace.
fn sniff_delimiter(text: &str) -> char {
    let header = text
        .lines()
        .find(|l| {
            l.chars()
                .any(|c| !c.is_whitespace() && c != '"' && !DELIMITERS.contains(&c))
        })
        .unwrap_or("");
    let mut in_quotes = false;
    let mut counts = [0usize; DELIMITERS.len()];
    for ch in header.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = DELIMITERS.iter().position(|d| *d == ch) {
            counts[i] += 1;
        }
    }
    let mut best = 0usize;
    for i in 1..DELIMITERS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}

/// Splits CSV text into records, each tagged with the 1-based line it starts
/// on. Quoted fields may contain the delimiter, `""` escapes and line breaks.
fn parse_records(text: &str, delim: char) -> Vec<(usize, Vec<String>)> {
    let mut out: Vec<(usize, Vec<String>)> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    buf.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    buf.push(ch);
                }
                _ => buf.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut buf));
                out.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            c if c == delim => fields.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !fields.is_empty() {
        fields.push(buf);
        out.push((record_line, fields));
    }
    out
}

fn csv_quote(s: &str, delim: char) -> String {
    if s.contains(delim) || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn is_blank_record(fields: &[String]) -> bool {
    fields.iter().all(|f| f.trim().is_empty())
}

struct ColumnMap {
    name: usize,
    roll: usize,
    department: usize,
    email: usize,
    phone: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, TransferError> {
        let find = |col: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(col))
        };
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| find(**c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TransferError::MissingColumns(missing));
        }
        Ok(Self {
            name: find("Name").unwrap_or_default(),
            roll: find("Roll").unwrap_or_default(),
            department: find("Department").unwrap_or_default(),
            email: find("Email").unwrap_or_default(),
            phone: find("Phone"),
        })
    }

    fn input(&self, fields: &[String]) -> StudentInput {
        let at = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
        StudentInput::new(
            at(self.name),
            at(self.roll),
            at(self.department),
            at(self.email),
            self.phone.map(at),
        )
    }
}

/// Validates and adds every data row. Row failures are collected; only a
/// missing header or an unavailable store aborts the batch.
pub fn import_students(store: &StudentStore<'_>, text: &str) -> Result<ImportReport, TransferError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delim = sniff_delimiter(text);
    let mut records = parse_records(text, delim)
        .into_iter()
        .filter(|(_, fields)| !is_blank_record(fields));

    let Some((_, header)) = records.next() else {
        return Err(TransferError::NoHeader);
    };
    let columns = ColumnMap::from_header(&header)?;

    let import_id = Uuid::new_v4().to_string();
    let mut report = ImportReport {
        import_id: import_id.clone(),
        succeeded: 0,
        failed: 0,
        created_ids: Vec::new(),
        failures: Vec::new(),
    };

    for (line, fields) in records {
        let outcome = validate_student(&columns.input(&fields))
            .map_err(StoreError::Invalid)
            .and_then(|draft| store.add(&draft));
        match outcome {
            Ok(student) => {
                report.succeeded += 1;
                report.created_ids.push(student.id);
            }
            Err(e @ StoreError::StoreUnavailable(_)) => {
                tracing::error!(import_id = %import_id, line, error = %e, "import aborted");
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(import_id = %import_id, line, error = %e, "import row skipped");
                report.failed += 1;
                report.failures.push(RowFailure {
                    line,
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        import_id = %import_id,
        succeeded = report.succeeded,
        failed = report.failed,
        "csv import finished"
    );
    Ok(report)
}

pub fn import_students_file(
    store: &StudentStore<'_>,
    path: &Path,
) -> Result<ImportReport, TransferError> {
    let text = std::fs::read_to_string(path).map_err(|source| TransferError::Read {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    import_students(store, &text)
}

pub fn render_students_csv(store: &StudentStore<'_>) -> Result<(String, usize), TransferError> {
    let students = store.list_all()?;
    let mut csv = EXPORT_HEADER.join(",");
    csv.push('\n');
    for s in &students {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_quote(&s.name, ','),
            csv_quote(&s.roll, ','),
            csv_quote(&s.department, ','),
            csv_quote(&s.email, ','),
            csv_quote(s.phone.as_deref().unwrap_or(""), ',')
        ));
    }
    Ok((csv, students.len()))
}

/// Writes every record to `path`. Returns the number of data rows.
pub fn export_students_file(store: &StudentStore<'_>, path: &Path) -> Result<usize, TransferError> {
    let (csv, rows) = render_students_csv(store)?;
    let write_err = |source| TransferError::Write {
        path: path.to_string_lossy().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, csv).map_err(write_err)?;
    tracing::info!(path = %path.display(), rows, "csv export written");
    Ok(rows)
}
