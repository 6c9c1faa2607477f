//! Report sinks.
//!
//! The walker hands every [`ReportRow`] to a [`ReportSink`] as soon as it is
//! produced. [`DelimitedReportWriter`] renders rows as comma-delimited text:
//!
//! ```text
//! URL,Object,Title,PermissionType,Permissions
//! https://contoso.sharepoint.com/sites/hr,Site,HR,Direct,Read
//! https://contoso.sharepoint.com/sites/hr/Docs/Forms/DispForm.aspx?ID=1,Folder,F1,Member of 'HR Members',Contribute; Read
//! ```

use std::io::Write;

use permission_audit_sdk::ReportRow;

use super::error::DomainError;

pub const REPORT_HEADER: [&str; 5] = ["URL", "Object", "Title", "PermissionType", "Permissions"];
pub const FIELD_DELIMITER: char = ',';
pub const PERMISSION_DELIMITER: &str = "; ";

/// Receives report rows in emission order.
pub trait ReportSink {
    /// # Errors
    ///
    /// Returns `DomainError::Report` when the row cannot be written.
    fn emit(&mut self, row: ReportRow) -> Result<(), DomainError>;
}

impl ReportSink for Vec<ReportRow> {
    fn emit(&mut self, row: ReportRow) -> Result<(), DomainError> {
        self.push(row);
        Ok(())
    }
}

/// Writes a header line, then one delimited line per row.
pub struct DelimitedReportWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> DelimitedReportWriter<W> {
    /// Write the header to `out`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Report` if the header cannot be written.
    pub fn new(mut out: W) -> Result<Self, DomainError> {
        write_line(&mut out, REPORT_HEADER)?;
        Ok(Self { out, rows: 0 })
    }

    /// Rows written so far, header excluded.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Report` if the flush fails.
    pub fn finish(mut self) -> Result<W, DomainError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> ReportSink for DelimitedReportWriter<W> {
    fn emit(&mut self, row: ReportRow) -> Result<(), DomainError> {
        let object_type = row.object_type.to_string();
        let source = row.source.to_string();
        let permissions = row.permissions.join(PERMISSION_DELIMITER);
        write_line(
            &mut self.out,
            [
                row.object_url.as_str(),
                object_type.as_str(),
                row.object_title.as_str(),
                source.as_str(),
                permissions.as_str(),
            ],
        )?;
        self.rows += 1;
        Ok(())
    }
}

fn write_line<W: Write>(out: &mut W, fields: [&str; 5]) -> Result<(), DomainError> {
    let line = fields
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(FIELD_DELIMITER.to_string().as_str());
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Fields holding the delimiter, a quote, or a line break are wrapped in
/// quotes with inner quotes doubled.
fn quote(field: &str) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == FIELD_DELIMITER || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use permission_audit_sdk::{ObjectType, PermissionSource};

    use super::*;

    fn row(title: &str, source: PermissionSource, permissions: &[&str]) -> ReportRow {
        ReportRow {
            object_url: "https://contoso.sharepoint.com/sites/hr".to_owned(),
            object_type: ObjectType::Web,
            object_title: title.to_owned(),
            source,
            permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    fn render(rows: Vec<ReportRow>) -> String {
        let mut writer = DelimitedReportWriter::new(Vec::new()).unwrap();
        for r in rows {
            writer.emit(r).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn empty_report_is_just_the_header() {
        assert_eq!(render(Vec::new()), "URL,Object,Title,PermissionType,Permissions\n");
    }

    #[test]
    fn joins_permissions_and_formats_source() {
        let out = render(vec![row(
            "HR",
            PermissionSource::Group("HR Members".to_owned()),
            &["Read", "Contribute"],
        )]);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[1],
            "https://contoso.sharepoint.com/sites/hr,Web,HR,Member of 'HR Members',Read; Contribute"
        );
    }

    #[test]
    fn quotes_fields_that_need_it() {
        let out = render(vec![row(
            "Budget, \"final\"",
            PermissionSource::Direct,
            &["Read"],
        )]);

        assert!(out.ends_with(",Web,\"Budget, \"\"final\"\"\",Direct,Read\n"));
    }

    #[test]
    fn counts_rows() {
        let mut writer = DelimitedReportWriter::new(Vec::new()).unwrap();
        writer.emit(row("A", PermissionSource::Direct, &["Read"])).unwrap();
        writer.emit(row("B", PermissionSource::Direct, &["Edit"])).unwrap();
        assert_eq!(writer.rows_written(), 2);
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink: Vec<ReportRow> = Vec::new();
        sink.emit(row("A", PermissionSource::Direct, &["Read"])).unwrap();
        sink.emit(row("B", PermissionSource::Direct, &["Edit"])).unwrap();
        let titles: Vec<&str> = sink.iter().map(|r| r.object_title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
