pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// Render rows as CSV, the first row being the header.
pub fn csv_bytes<R, C>(rows: R) -> Result<Vec<u8>>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: ToString,
{
    let mut table = prettytable::Table::new();
    for row in rows {
        table.add_row(prettytable::Row::new(
            row.into_iter()
                .map(|cell| prettytable::Cell::new(&cell.to_string()))
                .collect(),
        ));
    }

    let mut buf = Vec::new();
    table.to_csv(&mut buf)?.flush()?;
    Ok(buf)
}
