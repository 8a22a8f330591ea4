/// Data layer: core types, payload decoding, filtering, selection and export.
///
/// Architecture:
/// ```text
///  public-metadata / public-data JSON
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode payload → ColumnMetadata, Vec<Row>
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   predicate   │  FilterSet (from filter::FilterStore) → visible indices
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  selection    │  visible columns ──► export::ExportRequest
///   └──────────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod predicate;
pub mod selection;
