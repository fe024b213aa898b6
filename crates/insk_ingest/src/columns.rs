use crate::reader::RawTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Summary,
    Category,
    Subcat,
    Url,
    Score,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Summary => "summary",
            Field::Category => "category",
            Field::Subcat => "subcat",
            Field::Url => "url",
            Field::Score => "score",
        }
    }
}

/// Source headers of the scoring spreadsheets and the field each one feeds.
const HEADER_MAP: &[(&str, Field)] = &[
    ("제목", Field::Title),
    ("내용 요약", Field::Summary),
    ("분류 결과", Field::Category),
    ("대분류", Field::Category),
    ("소분류", Field::Subcat),
    ("URL", Field::Url),
    ("총 점", Field::Score),
];

const FIELDS: [Field; 6] = [
    Field::Title,
    Field::Summary,
    Field::Category,
    Field::Subcat,
    Field::Url,
    Field::Score,
];

pub fn field_for_header(header: &str) -> Option<Field> {
    let header = header.trim();
    HEADER_MAP
        .iter()
        .find(|(source, _)| *source == header)
        .map(|(_, field)| *field)
        .or_else(|| FIELDS.iter().copied().find(|f| f.name().eq_ignore_ascii_case(header)))
}

/// Column positions of each canonical field within a raw table.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<(Field, usize)>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| field_for_header(h).map(|f| (f, i)))
            .collect();
        Self { columns }
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.iter().any(|(f, _)| *f == field)
    }

    /// First non-empty cell among the columns mapped to `field`.
    pub fn get<'a>(&self, row: &'a [String], field: Field) -> Option<&'a str> {
        self.columns
            .iter()
            .filter(|(f, _)| *f == field)
            .filter_map(|(_, i)| row.get(*i))
            .map(|cell| cell.as_str())
            .find(|cell| !cell.trim().is_empty())
    }
}

impl From<&RawTable> for ColumnMap {
    fn from(table: &RawTable) -> Self {
        Self::from_headers(&table.headers)
    }
}
