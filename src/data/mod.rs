/// Data layer: core types, loading, saving and transforms.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐        ┌───────────┐
///   │  Table    │ ◄──── │ selection  │  "0, 2, proto" → indices / names
///   └──────────┘        └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ transform  │  drop / scale / one-hot / PCA / clean → new Table
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → .xlsx / .csv / .parquet
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod selection;
pub mod transform;
pub mod writer;
