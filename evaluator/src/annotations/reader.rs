//! Tab-separated record reading

use std::io::BufRead;

use crate::error::{EvalError, EvalResult};

/// Feed every non-empty line of `reader` to `record` as `columns` fields.
///
/// Lines with fewer fields fail with [`EvalError::Input`]; extra fields
/// are ignored. Line numbers are 1-based.
pub fn for_each_record<R, F>(reader: R, columns: usize, mut record: F) -> EvalResult<()>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> EvalResult<()>,
{
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).take(columns).collect();
        if fields.len() < columns {
            return Err(EvalError::Input {
                line: n + 1,
                message: format!("expected {} tab-separated fields, found {}", columns, fields.len()),
            });
        }
        record(n + 1, &fields)?;
    }
    Ok(())
}
