use std::cmp::Ordering;

/// Column names the loader requires in every dataset.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "MONTH",
    "PAID_AMOUNT",
    "SERVICE_CATEGORY",
    "PAYER",
    "CLAIM_SPECIALTY",
];

/// One claim transaction after load-time derivation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    /// Year and month as a single integer, e.g. 201805.
    pub month: i64,
    pub paid_amount: f64,
    pub service_category: String,
    pub payer: String,
    pub claim_specialty: String,
    /// First four characters of `month`.
    pub year: String,
    /// Last two characters of `month`, as a number.
    pub month_n: u32,
    /// Values of any non-required source columns, aligned with
    /// `Dataset::extra_columns`.
    pub extras: Vec<String>,
}

/// Intermediate row produced by a source reader before derivation.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Month,
    Year,
    MonthN,
    PaidAmount,
    ServiceCategory,
    Payer,
    ClaimSpecialty,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Month,
        Column::Year,
        Column::MonthN,
        Column::PaidAmount,
        Column::ServiceCategory,
        Column::Payer,
        Column::ClaimSpecialty,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Month => "MONTH",
            Self::Year => "YEAR",
            Self::MonthN => "MONTH_N",
            Self::PaidAmount => "PAID_AMOUNT",
            Self::ServiceCategory => "SERVICE_CATEGORY",
            Self::Payer => "PAYER",
            Self::ClaimSpecialty => "CLAIM_SPECIALTY",
        }
    }

    /// Parse a column from its header name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Column> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.header() == upper)
    }

    pub fn next(&self) -> Column {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn compare(&self, a: &ClaimRecord, b: &ClaimRecord) -> Ordering {
        match self {
            Self::Month => a.month.cmp(&b.month),
            Self::Year => a.year.cmp(&b.year),
            Self::MonthN => a.month_n.cmp(&b.month_n),
            Self::PaidAmount => a.paid_amount.total_cmp(&b.paid_amount),
            Self::ServiceCategory => a.service_category.cmp(&b.service_category),
            Self::Payer => a.payer.cmp(&b.payer),
            Self::ClaimSpecialty => a.claim_specialty.cmp(&b.claim_specialty),
        }
    }

    pub fn value(&self, record: &ClaimRecord) -> String {
        match self {
            Self::Month => record.month.to_string(),
            Self::Year => record.year.clone(),
            Self::MonthN => record.month_n.to_string(),
            Self::PaidAmount => record.paid_amount.to_string(),
            Self::ServiceCategory => record.service_category.clone(),
            Self::Payer => record.payer.clone(),
            Self::ClaimSpecialty => record.claim_specialty.clone(),
        }
    }
}
