use crate::record::Record;

/// Field offsets for one observed rendering of the listing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    pub columns: usize,
    pub name: usize,
    pub address: usize,
    pub zip: usize,
    pub city: usize,
    pub canton: usize,
    pub phone: usize,
}

impl RowSchema {
    const fn stride(columns: usize, name: usize) -> Self {
        Self {
            columns,
            name,
            address: name + 1,
            zip: name + 2,
            city: name + 3,
            canton: name + 4,
            phone: name + 5,
        }
    }

    fn offsets(&self) -> [usize; 6] {
        [
            self.name,
            self.address,
            self.zip,
            self.city,
            self.canton,
            self.phone,
        ]
    }
}

/// Every column count the listing has been seen to render. Each extra pair of
/// leading columns pushes the payload two cells to the right.
///
/// This is a closed set: counts outside it are not extrapolated.
pub const SCHEMAS: [RowSchema; 5] = [
    RowSchema::stride(13, 2),
    RowSchema::stride(15, 4),
    RowSchema::stride(17, 6),
    RowSchema::stride(19, 8),
    RowSchema::stride(21, 10),
];

pub fn schema_for(columns: usize) -> Option<&'static RowSchema> {
    SCHEMAS.iter().find(|schema| schema.columns == columns)
}

/// Why a raw row did or did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    Record(Record),
    /// Every cell empty; used by the table as visual spacing.
    Spacer,
    UnknownLayout { columns: usize },
    MissingRequired { columns: usize },
}

/// Classify a raw row (cell texts in column order).
pub fn inspect<S: AsRef<str>>(cells: &[S]) -> RowVerdict {
    let text = |idx: usize| cells[idx].as_ref().trim();

    if cells.iter().all(|cell| cell.as_ref().trim().is_empty()) {
        return RowVerdict::Spacer;
    }

    let Some(schema) = schema_for(cells.len()) else {
        return RowVerdict::UnknownLayout {
            columns: cells.len(),
        };
    };

    if text(schema.name).is_empty() || text(schema.address).is_empty() {
        return RowVerdict::MissingRequired {
            columns: schema.columns,
        };
    }

    let [name, address, zip, city, canton, phone] = schema.offsets().map(text);
    RowVerdict::Record(Record::new(name, address, zip, city, canton, phone))
}

/// Returns the normalized record for a data row, or `None` for anything else.
pub fn classify<S: AsRef<str>>(cells: &[S]) -> Option<Record> {
    match inspect(cells) {
        RowVerdict::Record(record) => Some(record),
        _ => None,
    }
}
