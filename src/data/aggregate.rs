use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::model::{
    BASE_MSRP, COUNTY, Dataset, ELECTRIC_RANGE, EV_TYPE, FieldValue, MAKE, MODEL, MODEL_YEAR,
};

/// Truncation length of every ranked chart.
pub const TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Aggregate buckets
// ---------------------------------------------------------------------------

/// Number of records sharing a categorical value.
#[derive(Debug, Clone, PartialEq)]
pub struct CountBucket {
    pub label: String,
    pub count: usize,
}

/// Mean of a numeric column across the records of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanBucket {
    pub label: String,
    pub mean: f64,
}

/// Number of records per model year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBucket {
    pub year: i64,
    pub count: usize,
}

/// Number of records per price band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBucket {
    pub band: PriceBand,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Price bands
// ---------------------------------------------------------------------------

/// One of the eleven fixed price bands. Each band covers
/// `(previous upper bound, upper bound]`; the last one is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceBand(usize);

/// Inclusive upper bounds and labels, in ascending order.
const PRICE_BANDS: [(Option<f64>, &str); 11] = [
    (Some(20_000.0), "≤$20k"),
    (Some(30_000.0), "$20k-$30k"),
    (Some(40_000.0), "$30k-$40k"),
    (Some(50_000.0), "$40k-$50k"),
    (Some(60_000.0), "$50k-$60k"),
    (Some(70_000.0), "$60k-$70k"),
    (Some(80_000.0), "$70k-$80k"),
    (Some(90_000.0), "$80k-$90k"),
    (Some(100_000.0), "$90k-$100k"),
    (Some(125_000.0), "$100k-$125k"),
    (None, ">$125k"),
];

impl PriceBand {
    /// Every band in boundary order.
    pub fn all() -> impl Iterator<Item = PriceBand> {
        (0..PRICE_BANDS.len()).map(PriceBand)
    }

    /// The band a price falls into.
    pub fn classify(price: f64) -> PriceBand {
        let idx = PRICE_BANDS
            .iter()
            .position(|(upper, _)| match upper {
                Some(u) => price <= *u,
                None => true,
            })
            .unwrap_or(PRICE_BANDS.len() - 1);
        PriceBand(idx)
    }

    pub fn label(&self) -> &'static str {
        PRICE_BANDS[self.0].1
    }
}

// ---------------------------------------------------------------------------
// Grouping primitives
// ---------------------------------------------------------------------------

/// Count records per value of `field`, in first-seen order.
/// Records where the field is missing or null are left out.
pub fn count_by(dataset: &Dataset, field: &str) -> Vec<CountBucket> {
    let mut index: HashMap<&FieldValue, usize> = HashMap::new();
    let mut buckets: Vec<CountBucket> = Vec::new();

    for rec in &dataset.records {
        let Some(value) = rec.present(field) else {
            continue;
        };
        let seen = index.get(value).copied();
        match seen {
            Some(i) => buckets[i].count += 1,
            None => {
                index.insert(value, buckets.len());
                buckets.push(CountBucket {
                    label: value.to_string(),
                    count: 1,
                });
            }
        }
    }
    buckets
}

/// Full categorical distribution of `field` without truncation.
pub fn distribution(dataset: &Dataset, field: &str) -> Vec<CountBucket> {
    count_by(dataset, field)
}

/// The `n` most frequent values of `field`, most frequent first.
/// Equal counts keep first-seen order.
pub fn top_n_by_count(dataset: &Dataset, field: &str, n: usize) -> Vec<CountBucket> {
    let mut buckets = count_by(dataset, field);
    // sort_by is stable
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(n);
    buckets
}

/// Records per model year, ascending by year. Non-numeric years are skipped.
pub fn year_distribution(dataset: &Dataset) -> Vec<YearBucket> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for rec in &dataset.records {
        let year = match rec.get(MODEL_YEAR) {
            Some(FieldValue::Integer(y)) => *y,
            Some(FieldValue::Float(y)) if y.fract() == 0.0 => *y as i64,
            _ => continue,
        };
        *counts.entry(year).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(year, count)| YearBucket { year, count })
        .collect()
}

/// Mean of `metric` per value of `group`, highest mean first, truncated to
/// `n`. A group without a single numeric `metric` value has a mean of 0.
pub fn mean_by_group(dataset: &Dataset, group: &str, metric: &str, n: usize) -> Vec<MeanBucket> {
    let mut index: HashMap<&FieldValue, usize> = HashMap::new();
    let mut sums: Vec<(String, f64, usize)> = Vec::new();

    for rec in &dataset.records {
        let Some(key) = rec.present(group) else {
            continue;
        };
        let i = *index.entry(key).or_insert_with(|| {
            sums.push((key.to_string(), 0.0, 0));
            sums.len() - 1
        });
        if let Some(v) = rec.number(metric) {
            sums[i].1 += v;
            sums[i].2 += 1;
        }
    }

    let mut buckets: Vec<MeanBucket> = sums
        .into_iter()
        .map(|(label, sum, count)| MeanBucket {
            label,
            mean: if count == 0 { 0.0 } else { sum / count as f64 },
        })
        .collect();
    buckets.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    buckets.truncate(n);
    buckets
}

/// Records per price band, in band order. Only non-empty bands are returned;
/// records without a numeric price are left out.
pub fn price_histogram(dataset: &Dataset) -> Vec<PriceBucket> {
    let mut counts: BTreeMap<PriceBand, usize> = BTreeMap::new();
    for price in dataset.records.iter().filter_map(|r| r.number(BASE_MSRP)) {
        *counts.entry(PriceBand::classify(price)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(band, count)| PriceBucket { band, count })
        .collect()
}

/// Arithmetic mean of the numeric values of `field`; 0 when there are none.
pub fn mean_of(dataset: &Dataset, field: &str) -> f64 {
    let (sum, n) = dataset
        .records
        .iter()
        .filter_map(|r| r.number(field))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Number of distinct non-null values of `field`.
pub fn distinct_count(dataset: &Dataset, field: &str) -> usize {
    dataset
        .records
        .iter()
        .filter_map(|r| r.present(field))
        .collect::<BTreeSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Dashboard bundle
// ---------------------------------------------------------------------------

/// Headline scalars of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total_vehicles: usize,
    pub avg_range: f64,
    pub avg_msrp: f64,
    pub unique_makes: usize,
}

impl Summary {
    pub fn compute(dataset: &Dataset) -> Self {
        Summary {
            total_vehicles: dataset.len(),
            avg_range: mean_of(dataset, ELECTRIC_RANGE),
            avg_msrp: mean_of(dataset, BASE_MSRP),
            unique_makes: distinct_count(dataset, MAKE),
        }
    }
}

/// Every series the dashboard shows, derived once per loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct DashboardAggregates {
    pub summary: Summary,
    pub top_makes: Vec<CountBucket>,
    pub ev_types: Vec<CountBucket>,
    pub years: Vec<YearBucket>,
    pub range_by_make: Vec<MeanBucket>,
    pub top_counties: Vec<CountBucket>,
    pub top_models: Vec<CountBucket>,
    pub price_ranges: Vec<PriceBucket>,
}

impl DashboardAggregates {
    pub fn compute(dataset: &Dataset, top_n: usize) -> Self {
        DashboardAggregates {
            summary: Summary::compute(dataset),
            top_makes: top_n_by_count(dataset, MAKE, top_n),
            ev_types: distribution(dataset, EV_TYPE),
            years: year_distribution(dataset),
            range_by_make: mean_by_group(dataset, MAKE, ELECTRIC_RANGE, top_n),
            top_counties: top_n_by_count(dataset, COUNTY, top_n),
            top_models: top_n_by_count(dataset, MODEL, top_n),
            price_ranges: price_histogram(dataset),
        }
    }

    /// The most populous price band; the first one wins on equal counts.
    pub fn most_common_price_range(&self) -> Option<&PriceBucket> {
        self.price_ranges
            .iter()
            .fold(None, |best: Option<&PriceBucket>, b| match best {
                Some(cur) if cur.count >= b.count => Some(cur),
                _ => Some(b),
            })
    }
}
