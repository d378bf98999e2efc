use std::cmp::Ordering;

use super::model::{
    BASE_MSRP, COUNTY, Dataset, ELECTRIC_RANGE, EV_TYPE, FieldValue, MAKE, MODEL, MODEL_YEAR,
    Record,
};

/// Rows per table page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A displayed column: source key plus header label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: &str, label: &str) -> Self {
        Column {
            key: key.to_string(),
            label: label.to_string(),
        }
    }

    /// Column whose label is the source header itself.
    pub fn verbatim(key: &str) -> Self {
        Column::new(key, key)
    }
}

/// The fixed whitelist of columns shown in the table, searched and sortable.
pub fn display_columns() -> Vec<Column> {
    vec![
        Column::new(MAKE, "Make"),
        Column::new(MODEL, "Model"),
        Column::new(MODEL_YEAR, "Year"),
        Column::new(EV_TYPE, "Type"),
        Column::new(ELECTRIC_RANGE, "Range (mi)"),
        Column::new(BASE_MSRP, "MSRP ($)"),
        Column::new(COUNTY, "County"),
    ]
}

/// Every source column of a dataset, in header order.
pub fn source_columns(dataset: &Dataset) -> Vec<Column> {
    dataset.columns.iter().map(|c| Column::verbatim(c)).collect()
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Everything the table view depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub search: String,
    pub sort: Option<SortSpec>,
    /// 1-based; 0 is served as page 1.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        TableQuery {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of the filtered, sorted table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TablePage {
    /// Dataset indices of the rows on this page.
    pub rows: Vec<usize>,
    /// Dataset indices of every matching row, in sorted order.
    pub matching: Vec<usize>,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl TablePage {
    pub fn total_matching(&self) -> usize {
        self.matching.len()
    }

    /// 1-based inclusive range of the rows shown, for "Showing a to b of n".
    pub fn showing(&self) -> (usize, usize) {
        if self.rows.is_empty() {
            return (0, 0);
        }
        let first = (self.page - 1) * self.page_size + 1;
        (first, first + self.rows.len() - 1)
    }
}

// ---------------------------------------------------------------------------
// filter → sort → paginate
// ---------------------------------------------------------------------------

/// Return indices of records where any displayed column contains `term`,
/// case-insensitively. An empty term keeps every record.
pub fn filter_indices(dataset: &Dataset, columns: &[Column], term: &str) -> Vec<usize> {
    if term.is_empty() {
        return (0..dataset.len()).collect();
    }
    let needle = term.to_lowercase();
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            columns
                .iter()
                .any(|col| rec.text(&col.key).to_lowercase().contains(&needle))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Compare two cells the way the table sorts them. Numbers come before
/// text and compare numerically; text compares by its rendering. Missing
/// cells compare greater than present ones.
pub fn compare_cells(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx.total_cmp(&fy),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.to_string().cmp(&y.to_string()),
        },
    }
}

/// Stable sort of `indices` by one column.
pub fn sort_indices(dataset: &Dataset, indices: &mut [usize], sort: &SortSpec) {
    let cell = |i: usize| dataset.records[i].get(&sort.column);
    indices.sort_by(|&a, &b| {
        let ord = compare_cells(cell(a), cell(b));
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Number of pages needed for `total` rows.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Slice out one 1-based page. Pages past the end are empty.
pub fn paginate(indices: &[usize], page: usize, page_size: usize) -> &[usize] {
    let page_size = page_size.max(1);
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    if start >= indices.len() {
        return &[];
    }
    let end = (start + page_size).min(indices.len());
    &indices[start..end]
}

/// Run the full table pipeline for one query.
pub fn view(dataset: &Dataset, query: &TableQuery) -> TablePage {
    let columns = display_columns();
    let mut matching = filter_indices(dataset, &columns, &query.search);
    if let Some(sort) = &query.sort {
        sort_indices(dataset, &mut matching, sort);
    }
    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let rows = paginate(&matching, page, page_size).to_vec();
    TablePage {
        rows,
        total_pages: page_count(matching.len(), page_size),
        matching,
        page,
        page_size,
    }
}

/// Resolve dataset indices to records.
pub fn rows<'a>(dataset: &'a Dataset, indices: &[usize]) -> Vec<&'a Record> {
    indices
        .iter()
        .filter_map(|&i| dataset.records.get(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn vehicle(make: &str, model: &str, year: i64, msrp: Option<i64>) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert(MAKE.to_string(), FieldValue::String(make.into()));
        fields.insert(MODEL.to_string(), FieldValue::String(model.into()));
        fields.insert(MODEL_YEAR.to_string(), FieldValue::Integer(year));
        fields.insert(
            BASE_MSRP.to_string(),
            msrp.map(FieldValue::Integer).unwrap_or(FieldValue::Null),
        );
        Record::new(fields)
    }

    fn example() -> Dataset {
        Dataset::new(
            vec![
                vehicle("Tesla", "Model S", 2020, Some(35_000)),
                vehicle("Tesla", "Model X", 2019, Some(85_000)),
                vehicle("Ford", "Mustang Mach-E", 2021, Some(45_000)),
            ],
            vec![MAKE.into(), MODEL.into(), MODEL_YEAR.into(), BASE_MSRP.into()],
        )
    }

    fn numbered(n: usize) -> Dataset {
        let records = (0..n)
            .map(|i| vehicle(&format!("Make{i}"), "M", 2000 + i as i64, Some(i as i64)))
            .collect();
        Dataset::new(records, vec![MAKE.into()])
    }

    fn query(search: &str, sort: Option<(&str, SortDirection)>, page: usize) -> TableQuery {
        TableQuery {
            search: search.to_string(),
            sort: sort.map(|(column, direction)| SortSpec {
                column: column.to_string(),
                direction,
            }),
            page,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let page = view(&example(), &query("tesla", None, 1));
        assert_eq!(page.rows, vec![0, 1]);
        assert_eq!(page.total_matching(), 2);

        let page = view(&example(), &query("MACH", None, 1));
        assert_eq!(page.rows, vec![2]);
    }

    #[test]
    fn search_matches_numeric_columns_as_text() {
        let page = view(&example(), &query("2019", None, 1));
        assert_eq!(page.rows, vec![1]);
    }

    #[test]
    fn empty_search_keeps_everything() {
        assert_eq!(view(&example(), &TableQuery::default()).rows, vec![0, 1, 2]);
    }

    #[test]
    fn numeric_sort_is_not_lexicographic() {
        let mut ds = example();
        ds.records.push(vehicle("Kia", "Niro", 2018, Some(9_000)));
        let asc = view(&ds, &query("", Some((BASE_MSRP, SortDirection::Ascending)), 1));
        assert_eq!(asc.rows, vec![3, 0, 2, 1]);
        let desc = view(&ds, &query("", Some((BASE_MSRP, SortDirection::Descending)), 1));
        assert_eq!(desc.rows, vec![1, 2, 0, 3]);
    }

    #[test]
    fn sort_is_stable_on_equal_keys() {
        let page = view(&example(), &query("", Some((MAKE, SortDirection::Descending)), 1));
        assert_eq!(page.rows, vec![0, 1, 2]);
    }

    #[test]
    fn missing_values_sort_last_ascending() {
        let mut ds = example();
        ds.records.insert(0, vehicle("Rivian", "R1T", 2022, None));
        let page = view(&ds, &query("", Some((BASE_MSRP, SortDirection::Ascending)), 1));
        assert_eq!(page.rows.last(), Some(&0));
        let page = view(&ds, &query("", Some((BASE_MSRP, SortDirection::Descending)), 1));
        assert_eq!(page.rows.first(), Some(&0));
    }

    #[test]
    fn pagination_splits_pages() {
        let ds = numbered(23);
        let first = view(&ds, &query("", None, 1));
        assert_eq!(first.rows, (0..10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.showing(), (1, 10));

        let last = view(&ds, &query("", None, 3));
        assert_eq!(last.rows, vec![20, 21, 22]);
        assert_eq!(last.showing(), (21, 23));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = view(&numbered(5), &query("", None, 9));
        assert!(page.rows.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_matching(), 5);
        assert_eq!(page.showing(), (0, 0));
    }

    #[test]
    fn page_zero_is_first_page() {
        let page = view(&numbered(3), &query("", None, 0));
        assert_eq!(page.page, 1);
        assert_eq!(page.rows, vec![0, 1, 2]);
    }

    #[test]
    fn no_matches_has_no_pages() {
        let page = view(&example(), &query("zzz", None, 1));
        assert_eq!(page.total_pages, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn pipeline_is_idempotent() {
        let ds = example();
        let q = query("t", Some((BASE_MSRP, SortDirection::Descending)), 1);
        let once = view(&ds, &q);

        let reduced = Dataset::new(
            rows(&ds, &once.rows).into_iter().cloned().collect(),
            ds.columns.clone(),
        );
        let twice = view(&reduced, &q);
        let again: Vec<&Record> = rows(&reduced, &twice.rows);
        assert_eq!(again, rows(&ds, &once.rows));
    }

    #[test]
    fn mixed_number_and_text_column_sorts_the_same_from_any_order() {
        let models = [
            FieldValue::Integer(9),
            FieldValue::Integer(10),
            FieldValue::String("5 SERIES".into()),
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let mut sorted = Vec::new();
            for order in orders {
                let records = order
                    .iter()
                    .map(|&i| {
                        let mut fields = BTreeMap::new();
                        fields.insert(MODEL.to_string(), models[i].clone());
                        Record::new(fields)
                    })
                    .collect();
                let ds = Dataset::new(records, vec![MODEL.into()]);
                let page = view(&ds, &query("", Some((MODEL, direction)), 1));
                let values: Vec<FieldValue> = rows(&ds, &page.rows)
                    .iter()
                    .filter_map(|r| r.get(MODEL).cloned())
                    .collect();
                sorted.push(values);
            }
            assert!(sorted.windows(2).all(|w| w[0] == w[1]), "{sorted:?}");
        }
    }

    #[test]
    fn numbers_sort_before_text() {
        let nine = FieldValue::Integer(9);
        let ten = FieldValue::Float(10.0);
        let text = FieldValue::String("5 SERIES".into());
        assert_eq!(compare_cells(Some(&nine), Some(&ten)), Ordering::Less);
        assert_eq!(compare_cells(Some(&ten), Some(&text)), Ordering::Less);
        assert_eq!(compare_cells(Some(&nine), Some(&text)), Ordering::Less);
        assert_eq!(compare_cells(Some(&text), None), Ordering::Less);
    }

    #[test]
    fn paginate_handles_degenerate_sizes() {
        let idx = [1, 2, 3];
        assert_eq!(paginate(&idx, 1, 0), &[1]);
        assert_eq!(paginate(&idx, usize::MAX, 2), &[] as &[usize]);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(11, 10), 2);
    }
}
