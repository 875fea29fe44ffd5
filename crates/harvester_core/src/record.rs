use std::fmt;

/// The six columns every harvested row is normalized into, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Address,
    Zip,
    City,
    Canton,
    Phone,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Address,
        Field::Zip,
        Field::City,
        Field::Canton,
        Field::Phone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Address => "address",
            Field::Zip => "zip",
            Field::City => "city",
            Field::Canton => "canton",
            Field::Phone => "phone",
        }
    }

    /// Column header used in exported files. The downstream merge step keys on
    /// these exact names.
    pub fn column_header(self) -> &'static str {
        match self {
            Field::Name => "restaurant_name",
            Field::Address => "address",
            Field::Zip => "zip_code",
            Field::City => "city",
            Field::Canton => "canton",
            Field::Phone => "phone",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified table row. Built once by the schema extractor and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    name: String,
    address: String,
    zip: String,
    city: String,
    canton: String,
    phone: String,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        zip: impl Into<String>,
        city: impl Into<String>,
        canton: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            zip: zip.into(),
            city: city.into(),
            canton: canton.into(),
            phone: phone.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn canton(&self) -> &str {
        &self.canton
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Address => &self.address,
            Field::Zip => &self.zip,
            Field::City => &self.city,
            Field::Canton => &self.canton,
            Field::Phone => &self.phone,
        }
    }

    /// Values in [`Field::ALL`] order.
    pub fn values(&self) -> [&str; 6] {
        Field::ALL.map(|field| self.get(field))
    }
}
