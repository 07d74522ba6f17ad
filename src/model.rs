//! 表模型 - 连接池与语句构建器的组合入口
//!
//! 一个 `TableModel` 绑定一张表：先通过 [`TableModel::query`] 在构建器上
//! 累积片段，再调用终结方法渲染、执行。执行成功后构建器自动清空，
//! 同一个模型可以继续发起下一条语句；执行失败则保留现场便于排查。

use crate::db_pool::{DbPool, FromAnyRow};
use crate::error::Result;
use crate::params::{BindValue, ParamMap};
use crate::query_builder::{QueryBuilder, ROWSTATE_COLUMN, ROWSTATE_DELETED_ROW};
use crate::utils;

#[derive(Debug, Clone)]
pub struct TableModel {
    pool: DbPool,
    /// 是否把插值后的语句写进日志
    pub allow_logging: bool,
    query: QueryBuilder,
}

impl TableModel {
    pub fn new(pool: DbPool, table: &str) -> Self {
        Self {
            pool,
            allow_logging: true,
            query: QueryBuilder::new(table),
        }
    }

    pub fn table(&self) -> &str {
        self.query.table()
    }

    /// 访问底层构建器，累积查询片段
    pub fn query(&mut self) -> &mut QueryBuilder {
        &mut self.query
    }

    fn log_statement(&self, sql: &str, params: &ParamMap) {
        if self.allow_logging {
            tracing::debug!(
                table = self.query.table(),
                statement = %utils::interpolate_query(sql, params),
                "executing statement"
            );
        }
    }

    /// 渲染并执行 SELECT，返回全部命中行
    pub async fn fetch_all<T>(&mut self) -> Result<Vec<T>>
    where
        T: FromAnyRow,
    {
        let sql = self.query.build_select();
        self.log_statement(&sql, self.query.params());
        let rows = self.pool.fetch_all_named(&sql, self.query.params()).await?;
        self.query.reset();
        Ok(rows)
    }

    /// 渲染并执行 SELECT，只取第一行
    pub async fn fetch_one<T>(&mut self) -> Result<Option<T>>
    where
        T: FromAnyRow,
    {
        let sql = self.query.build_select();
        self.log_statement(&sql, self.query.params());
        let row = self.pool.fetch_one_named(&sql, self.query.params()).await?;
        self.query.reset();
        Ok(row)
    }

    /// 插入一行，返回自增主键
    pub async fn insert(&mut self, columns: &[&str], values: &[BindValue]) -> Result<i64> {
        let (sql, params) = self.query.build_insert(columns, values)?;
        self.log_statement(&sql, &params);
        let id = self.pool.insert_named(&sql, &params).await?;
        self.query.reset();
        Ok(id)
    }

    /// 按累积的 WHERE 条件更新，返回受影响行数
    ///
    /// 没有 WHERE 条件时在渲染阶段即被拒绝，不会触碰数据库。
    pub async fn update(&mut self, columns: &[&str], values: &[BindValue]) -> Result<u64> {
        let (sql, params) = self.query.build_update(columns, values)?;
        self.log_statement(&sql, &params);
        let affected = self.pool.execute_named(&sql, &params).await?;
        self.query.reset();
        Ok(affected)
    }

    /// 软删除：把行状态置为删除值，受 UPDATE 同样的 WHERE 约束
    pub async fn soft_delete(&mut self) -> Result<u64> {
        self.update(
            &[ROWSTATE_COLUMN],
            &[BindValue::Int64(ROWSTATE_DELETED_ROW)],
        )
        .await
    }

    /// 原样执行查询语句，不经过构建器
    pub async fn query_raw<T>(&self, sql: &str) -> Result<Vec<T>>
    where
        T: FromAnyRow,
    {
        if self.allow_logging {
            tracing::debug!(table = self.query.table(), statement = sql, "raw query");
        }
        self.pool.query_raw(sql).await
    }

    /// 手动引用字符串字面量，见 [`utils::quote`]
    pub fn quote(&self, value: &str) -> String {
        utils::quote(value)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::db_pool::DbPool;
    use crate::error::SqlxModelError;
    use crate::query_builder::ROWSTATE_PUBLISHED;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    #[derive(Debug, sqlx::FromRow)]
    struct UserRow {
        id: i64,
        name: String,
        email: String,
        rowstate: i64,
    }

    // 单连接：每个 sqlite::memory: 连接都是独立数据库
    async fn memory_model() -> TableModel {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let pool = DbPool::from_sqlite_pool(Arc::new(pool)).unwrap();
        pool.execute_raw(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             name TEXT NOT NULL, email TEXT NOT NULL, \
             rowstate INTEGER NOT NULL DEFAULT 1)",
        )
        .await
        .unwrap();
        TableModel::new(pool, "users")
    }

    // ========== 端到端往返测试 ==========
    #[tokio::test]
    async fn test_insert_fetch_update_soft_delete_roundtrip() {
        let mut model = memory_model().await;

        let id = model
            .insert(&["name", "email"], &["Ann".into(), "ann@example.com".into()])
            .await
            .unwrap();
        assert_eq!(id, 1);

        model.query().add_where("name", "=", "Ann").unwrap();
        let rows: Vec<UserRow> = model.fetch_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].email, "ann@example.com");
        assert_eq!(rows[0].rowstate, ROWSTATE_PUBLISHED);
        // 成功执行之后构建器回到初始状态
        assert_eq!(model.query().build_select(), "SELECT * FROM users ");

        model.query().add_where("id", "=", id).unwrap();
        let affected = model
            .update(&["email"], &["ann@new.example.com".into()])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        // 无条件软删除被拒绝，且不会执行任何语句
        let err = model.soft_delete().await.unwrap_err();
        assert!(matches!(err, SqlxModelError::MissingWhereClause("UPDATE")));

        model.query().add_where("id", "=", id).unwrap();
        assert_eq!(model.soft_delete().await.unwrap(), 1);

        model.query().is_deleted().unwrap();
        let row: Option<UserRow> = model.fetch_one().await.unwrap();
        assert_eq!(row.unwrap().rowstate, 999);

        let raw: Vec<UserRow> = model
            .query_raw("SELECT * FROM users WHERE email = 'ann@new.example.com'")
            .await
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_fetch_one_returns_first_row_or_none() {
        let mut model = memory_model().await;
        model
            .insert(&["name", "email"], &["Ann".into(), "a@x.com".into()])
            .await
            .unwrap();
        model
            .insert(&["name", "email"], &["Bob".into(), "b@x.com".into()])
            .await
            .unwrap();

        model.query().is_not_deleted().unwrap();
        model.query().add_order_by(&["id"], crate::query_builder::OrderDir::Asc);
        let row: Option<UserRow> = model.fetch_one().await.unwrap();
        assert_eq!(row.unwrap().name, "Ann");

        model.query().add_where("name", "=", "Zed").unwrap();
        let row: Option<UserRow> = model.fetch_one().await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_failed_terminal_keeps_builder_state() {
        let mut model = memory_model().await;
        model.query().add_where("no_such_column", "=", 1i64).unwrap();
        let result: Result<Vec<UserRow>> = model.fetch_all().await;
        assert!(result.is_err());
        // 失败后现场保留，可以检查或修正
        assert!(model.query().has_where());
    }

    #[test]
    fn test_quote_helper() {
        // quote 不依赖连接，直接在 utils 层验证
        assert_eq!(crate::utils::quote("it's"), "'it''s'");
    }
}
