/// Data layer: core types, loading, aggregation and the table view.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (type-coerced cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, header order; immutable after load
///   └──────────┘
///        │
///        ├──────────────────┐
///        ▼                  ▼
///   ┌───────────┐     ┌──────────┐
///   │ aggregate  │     │  table    │  search → sort → paginate
///   └───────────┘     └──────────┘
///   counts, means,     page of row indices
///   price bands
/// ```

pub mod aggregate;
pub mod loader;
pub mod model;
pub mod table;
