use crate::scoring::RankedRecord;
use std::io::{Read, Write};
use std::path::Path;

/// Column order of the contact list table.
pub const CONTACT_COLUMNS: [&str; 7] = [
    "row_id",
    "rank",
    "uplift_hat",
    "y1_hat",
    "y0_hat",
    "exp_incremental_revenue",
    "exp_profit_per_contact",
];

pub fn write_contacts<W: Write>(writer: W, records: &[RankedRecord]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty selection still yields a header row.
    csv_writer.write_record(CONTACT_COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_contacts_to_path<P: AsRef<Path>>(
    path: P,
    records: &[RankedRecord],
) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_contacts(file, records)
}

pub fn read_contacts<R: Read>(reader: R) -> Result<Vec<RankedRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<RankedRecord>().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::IndividualId;
    use std::io::Cursor;

    fn contact(id: &str, rank: usize, uplift: f64) -> RankedRecord {
        RankedRecord {
            row_id: IndividualId::from(id),
            rank,
            uplift_hat: uplift,
            y1_hat: uplift + 0.125,
            y0_hat: 0.125,
            exp_incremental_revenue: uplift,
            exp_profit_per_contact: 0.3 * uplift - 0.05,
        }
    }

    #[test]
    fn writes_header_in_contact_column_order() {
        let mut buffer = Vec::new();
        write_contacts(&mut buffer, &[contact("c-1", 1, 0.5)]).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CONTACT_COLUMNS.join(",").as_str()));
        assert!(lines.next().expect("data row").starts_with("c-1,1,0.5,"));
    }

    #[test]
    fn empty_selection_still_has_header() {
        let mut buffer = Vec::new();
        write_contacts(&mut buffer, &[]).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text.trim_end(), CONTACT_COLUMNS.join(","));
        assert!(read_contacts(Cursor::new(text)).expect("read").is_empty());
    }

    #[test]
    fn contact_list_round_trips() {
        let records = vec![
            contact("c-7", 1, 0.812_345_678_9),
            contact("0042", 2, 0.1 + 0.2),
            contact("c-1", 3, -1e-9),
        ];

        let mut buffer = Vec::new();
        write_contacts(&mut buffer, &records).expect("write");
        let parsed = read_contacts(Cursor::new(buffer)).expect("read");

        assert_eq!(parsed, records);
    }
}
