use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use teamgrid_core::{GridError, GridResult};

/// Number of intra-day time blocks an assignment can occupy.
pub const BLOCKS_PER_DAY: u8 = 4;

/// Identifier of a person on the roster. Issued externally; may contain any
/// character, including the delimiter used when encoding cell keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the four intra-day time slots, index 0..=3.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct BlockIndex(u8);

impl BlockIndex {
    pub fn new(index: u8) -> GridResult<Self> {
        if index < BLOCKS_PER_DAY {
            Ok(Self(index))
        } else {
            Err(GridError::Validation(format!(
                "block index {} out of range 0..{}",
                index, BLOCKS_PER_DAY
            )))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = BlockIndex> {
        (0..BLOCKS_PER_DAY).map(BlockIndex)
    }
}

impl TryFrom<u8> for BlockIndex {
    type Error = GridError;

    fn try_from(value: u8) -> GridResult<Self> {
        Self::new(value)
    }
}

impl From<BlockIndex> for u8 {
    fn from(value: BlockIndex) -> u8 {
        value.0
    }
}

/// Composite identity of one grid cell: (person, day, time block).
///
/// Encoded as `YYYY-MM-DD:B:<person>`. The date and block are fixed-width
/// and lead the string, so decoding parses from the front and takes the
/// remainder as the person id verbatim. A person id containing the `:`
/// delimiter round-trips unharmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub person: PersonId,
    pub date: NaiveDate,
    pub block: BlockIndex,
}

impl CellKey {
    pub fn new(person: PersonId, date: NaiveDate, block: BlockIndex) -> Self {
        Self { person, date, block }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.date.format("%Y-%m-%d"),
            self.block.index(),
            self.person
        )
    }

    pub fn decode(encoded: &str) -> GridResult<Self> {
        // Layout: 10-char date, ':', 1-char block, ':', person (rest).
        const DATE_LEN: usize = 10;
        const PERSON_START: usize = DATE_LEN + 4;

        let malformed = || GridError::Validation(format!("malformed cell key: {encoded:?}"));

        if encoded.len() < PERSON_START || !encoded.is_char_boundary(PERSON_START) {
            return Err(malformed());
        }
        let (head, person) = encoded.split_at(PERSON_START);
        let date_part = &head[..DATE_LEN];
        let block_part = &head[DATE_LEN..];

        let date =
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| malformed())?;
        let block_digit = block_part
            .strip_prefix(':')
            .and_then(|rest| rest.strip_suffix(':'))
            .ok_or_else(malformed)?;
        let block = block_digit
            .parse::<u8>()
            .map_err(|_| malformed())
            .and_then(BlockIndex::new)?;
        if person.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(PersonId::new(person), date, block))
    }

    /// Same key with a different block index; person and date unchanged.
    pub fn at_block(&self, block: BlockIndex) -> Self {
        Self::new(self.person.clone(), self.date, block)
    }

    /// True if the other key addresses the same (person, day) column.
    pub fn same_column(&self, other: &CellKey) -> bool {
        self.person == other.person && self.date == other.date
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
