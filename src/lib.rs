pub mod db_pool;
pub mod error;
pub mod model;
pub mod params;
pub mod query_builder;
pub mod utils;

pub use db_pool::{ConnectionConfig, DbDriver, DbPool, FromAnyRow};
pub use error::{Result, SqlxModelError};
pub use model::TableModel;
pub use params::{derive_placeholder, BindValue, ParamMap};
pub use query_builder::{
    Comparator, Joiner, OrderDir, QueryBuilder, ROWSTATE_COLUMN, ROWSTATE_DELETED_ROW,
    ROWSTATE_PUBLISHED, ROWSTATE_UNPUBLISHED,
};
pub use utils::{passes_guard, quote};
