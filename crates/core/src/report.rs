//! CSV rendering of the identifier report.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::identifiers::IdentifierRecord;

pub const HEADER: [&str; 2] = ["identifier", "type"];
const LINE_END: &str = "\r\n";

pub fn write_report<W: Write>(mut writer: W, records: &[IdentifierRecord]) -> io::Result<()> {
    write_row(&mut writer, HEADER[0], HEADER[1])?;
    for record in records {
        write_row(&mut writer, &record.identifier, record.category.as_str())?;
    }
    writer.flush()
}

fn write_row<W: Write>(writer: &mut W, identifier: &str, category: &str) -> io::Result<()> {
    write!(writer, "{},{}{LINE_END}", quote(identifier), quote(category))
}

/// Quotes a field only when it contains a delimiter, quote, or line break.
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
