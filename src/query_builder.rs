//! 语句构建模块 - 片段累积与最终 SQL 渲染
//!
//! 构建器只负责把调用方逐步给出的片段攒成结构化状态，真正的 SQL 文本
//! 在 `build_*` 时一次性渲染。片段里的值全部走 [`ParamMap`] 绑定，
//! 自由文本片段过一遍黑名单检查。

use crate::error::{Result, SqlxModelError};
use crate::params::{BindValue, ParamMap};
use crate::utils::{passes_guard, strip_leading_keyword, strip_leading_keywords};

/// 行状态：正常可见
pub const ROWSTATE_PUBLISHED: i64 = 1;
/// 行状态:已下线但未删除
pub const ROWSTATE_UNPUBLISHED: i64 = 0;
/// 行状态：软删除
pub const ROWSTATE_DELETED_ROW: i64 = 999;
/// 行状态列名
pub const ROWSTATE_COLUMN: &str = "rowstate";

/// 允许的比较运算符集合
///
/// 枚举只做校验与分类；渲染时使用调用方传入的原文，大小写原样保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    NeAngle,
    NullSafeEq,
    Gt,
    Lt,
    Le,
    Ge,
    In,
    Not,
    Between,
    IsNull,
    IsNotNull,
    Like,
    Exists,
}

impl Comparator {
    /// 大小写不敏感地解析运算符原文
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "=" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            "<>" => Ok(Comparator::NeAngle),
            "<=>" => Ok(Comparator::NullSafeEq),
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            ">=" => Ok(Comparator::Ge),
            "in" => Ok(Comparator::In),
            "not" => Ok(Comparator::Not),
            "between" => Ok(Comparator::Between),
            "is null" => Ok(Comparator::IsNull),
            "is not null" => Ok(Comparator::IsNotNull),
            "like" => Ok(Comparator::Like),
            "exists" => Ok(Comparator::Exists),
            _ => Err(SqlxModelError::InvalidComparator(raw.to_string())),
        }
    }

    /// 该运算符是否携带绑定值
    pub fn takes_value(&self) -> bool {
        !matches!(self, Comparator::IsNull | Comparator::IsNotNull)
    }
}

/// 条件前缀关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    Where,
    And,
    Or,
    In,
    NotIn,
}

impl Joiner {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "where" => Ok(Joiner::Where),
            "and" => Ok(Joiner::And),
            "or" => Ok(Joiner::Or),
            "in" => Ok(Joiner::In),
            "not in" => Ok(Joiner::NotIn),
            _ => Err(SqlxModelError::InvalidClause(raw.to_string())),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Joiner::Where => "WHERE",
            Joiner::And => "AND",
            Joiner::Or => "OR",
            Joiner::In => "IN",
            Joiner::NotIn => "NOT IN",
        }
    }

    /// IN / NOT IN 的条件体要包进括号
    pub fn opens_paren(&self) -> bool {
        matches!(self, Joiner::In | Joiner::NotIn)
    }
}

/// 排序方向，默认倒序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDir {
    Asc,
    #[default]
    Desc,
}

impl OrderDir {
    fn keyword(&self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }
}

/// 单个 WHERE 谓词，渲染推迟到 build 阶段
#[derive(Debug, Clone, PartialEq)]
struct WherePredicate {
    joiner: Joiner,
    column: String,
    /// 运算符原文，渲染时原样输出
    comparator: String,
    placeholder: Option<String>,
}

impl WherePredicate {
    fn render(&self) -> String {
        let clause = match &self.placeholder {
            Some(key) => format!("{} {} :{}", self.column, self.comparator, key),
            None => format!("{} {}", self.column, self.comparator),
        };
        if self.joiner.opens_paren() {
            format!("{} ({})", self.joiner.keyword(), clause)
        } else {
            format!("{} {}", self.joiner.keyword(), clause)
        }
    }
}

/// 流式语句构建器
///
/// 同一组调用永远渲染出字节级相同的 SQL；`reset` 之后可复用同一个实例。
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    table: String,
    projection: String,
    predicates: Vec<WherePredicate>,
    join: Vec<String>,
    order_by: Option<(String, OrderDir)>,
    group_by: Option<String>,
    limit: Option<(u64, Option<u64>)>,
    params: ParamMap,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            projection: "*".to_string(),
            predicates: Vec::new(),
            join: Vec::new(),
            order_by: None,
            group_by: None,
            limit: None,
            params: ParamMap::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 当前累积的绑定参数
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn has_where(&self) -> bool {
        !self.predicates.is_empty()
    }

    /// 设置投影列，开头的 SELECT 关键字会被剥掉
    pub fn set_projection(&mut self, projection: &str) -> Result<&mut Self> {
        if !passes_guard(projection) {
            return Err(SqlxModelError::GuardRejected(projection.to_string()));
        }
        self.projection = strip_leading_keyword(projection, "select").to_string();
        Ok(self)
    }

    /// 设置 GROUP BY 表达式，开头的 GROUP BY 关键字会被剥掉
    pub fn set_group_by(&mut self, expr: &str) -> Result<&mut Self> {
        if !passes_guard(expr) {
            return Err(SqlxModelError::GuardRejected(expr.to_string()));
        }
        self.group_by = Some(strip_leading_keyword(expr, "group by").to_string());
        Ok(self)
    }

    /// 追加一个携带绑定值的条件，前缀按默认规则推断
    pub fn add_where(
        &mut self,
        column: &str,
        comparator: &str,
        value: impl Into<BindValue>,
    ) -> Result<&mut Self> {
        self.add_where_joined(column, comparator, Some(value.into()), "")
    }

    /// 追加 IS NULL / IS NOT NULL 这类无值条件
    pub fn add_where_null(&mut self, column: &str, comparator: &str) -> Result<&mut Self> {
        self.add_where_joined(column, comparator, None, "")
    }

    /// 追加条件并显式指定前缀关键字
    ///
    /// 前缀留空时：首个条件是 WHERE，其余是 AND。显式传 WHERE 的
    /// 后续条件同样落成 AND，一条语句只有一个 WHERE。
    pub fn add_where_joined(
        &mut self,
        column: &str,
        comparator: &str,
        value: Option<BindValue>,
        joiner: &str,
    ) -> Result<&mut Self> {
        if !passes_guard(column) {
            return Err(SqlxModelError::GuardRejected(column.to_string()));
        }
        let parsed = Comparator::parse(comparator)?;
        if !parsed.takes_value() && value.is_some() {
            return Err(SqlxModelError::UnexpectedValue(comparator.to_string()));
        }
        // 即使首个条件必然落成 WHERE，显式传入的前缀也要先通过校验
        let requested = if joiner.trim().is_empty() {
            None
        } else {
            Some(Joiner::parse(joiner)?)
        };
        let joiner = if self.predicates.is_empty() {
            Joiner::Where
        } else {
            match requested {
                None | Some(Joiner::Where) => Joiner::And,
                Some(other) => other,
            }
        };

        let column = strip_leading_keywords(column, &["where", "and", "or"]).to_string();
        let placeholder = match value {
            Some(value) => {
                let value = if parsed == Comparator::Like {
                    BindValue::String(format!("%{}%", value.to_plain_string()))
                } else {
                    value
                };
                Some(self.params.register(&column, value))
            }
            None => None,
        };
        self.predicates.push(WherePredicate {
            joiner,
            column,
            comparator: comparator.trim().to_string(),
            placeholder,
        });
        Ok(self)
    }

    /// 追加 JOIN，每个 (列, 值) 对生成一段 ON 等值条件
    pub fn add_join(
        &mut self,
        table: &str,
        alias: &str,
        on: &[(&str, BindValue)],
    ) -> Result<&mut Self> {
        if !passes_guard(table) || !passes_guard(alias) {
            return Err(SqlxModelError::GuardRejected(format!("{} {}", table, alias)));
        }
        let table = strip_leading_keyword(table, "join").to_string();
        // 别名可选，留空时不渲染这一段
        let target = if alias.is_empty() {
            table
        } else {
            format!("{} {}", table, alias)
        };
        for (column, value) in on {
            if !passes_guard(column) {
                return Err(SqlxModelError::GuardRejected(column.to_string()));
            }
            let key = self.params.register(column, value.clone());
            self.join
                .push(format!("JOIN {} ON {} = :{}", target, column, key));
        }
        Ok(self)
    }

    pub fn add_order_by(&mut self, columns: &[&str], dir: OrderDir) -> &mut Self {
        self.order_by = Some((columns.join(","), dir));
        self
    }

    /// LIMIT start 或 LIMIT start,end
    pub fn add_limit(&mut self, start: u64, end: Option<u64>) -> &mut Self {
        self.limit = Some((start, end));
        self
    }

    // ========== 行状态快捷条件 ==========

    pub fn is_published(&mut self) -> Result<&mut Self> {
        self.add_where(ROWSTATE_COLUMN, "=", ROWSTATE_PUBLISHED)
    }

    pub fn is_not_published(&mut self) -> Result<&mut Self> {
        self.add_where(ROWSTATE_COLUMN, "=", ROWSTATE_UNPUBLISHED)
    }

    pub fn is_deleted(&mut self) -> Result<&mut Self> {
        self.add_where(ROWSTATE_COLUMN, "=", ROWSTATE_DELETED_ROW)
    }

    pub fn is_not_deleted(&mut self) -> Result<&mut Self> {
        self.add_where(ROWSTATE_COLUMN, "<>", ROWSTATE_DELETED_ROW)
    }

    // ========== 渲染 ==========

    fn render_where(&self) -> String {
        self.predicates
            .iter()
            .map(WherePredicate::render)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 渲染 SELECT 语句；子句之间单空格分隔，结尾保留一个空格
    pub fn build_select(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.projection, self.table);
        for join in &self.join {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.predicates.is_empty() {
            sql.push(' ');
            sql.push_str(&self.render_where());
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some((columns, dir)) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(columns);
            sql.push(' ');
            sql.push_str(dir.keyword());
        }
        if let Some((start, end)) = self.limit {
            match end {
                Some(end) => sql.push_str(&format!(" LIMIT {},{}", start, end)),
                None => sql.push_str(&format!(" LIMIT {}", start)),
            }
        }
        sql.push(' ');
        sql
    }

    /// 渲染 INSERT 语句，绑定参数是全新的一组，与累积状态无关
    pub fn build_insert(
        &self,
        columns: &[&str],
        values: &[BindValue],
    ) -> Result<(String, ParamMap)> {
        if columns.len() != values.len() {
            return Err(SqlxModelError::LengthMismatch("INSERT"));
        }
        let mut params = ParamMap::new();
        let keys: Vec<String> = columns
            .iter()
            .zip(values)
            .map(|(column, value)| format!(":{}", params.register(column, value.clone())))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES({});",
            self.table,
            columns.join(","),
            keys.join(",")
        );
        Ok((sql, params))
    }

    /// 渲染 UPDATE 语句；没有 WHERE 条件时拒绝
    ///
    /// SET 占位符注册进累积参数表的副本里，与 WHERE 绑定合并执行，
    /// 同名列自然落到带后缀的键上。
    pub fn build_update(
        &self,
        columns: &[&str],
        values: &[BindValue],
    ) -> Result<(String, ParamMap)> {
        if self.predicates.is_empty() {
            return Err(SqlxModelError::MissingWhereClause("UPDATE"));
        }
        if columns.len() != values.len() {
            return Err(SqlxModelError::LengthMismatch("UPDATE"));
        }
        let mut params = self.params.clone();
        let sets: Vec<String> = columns
            .iter()
            .zip(values)
            .map(|(column, value)| {
                format!("{}=:{}", column, params.register(column, value.clone()))
            })
            .collect();
        let sql = format!(
            "UPDATE {} SET {} {}",
            self.table,
            sets.join(","),
            self.render_where()
        );
        Ok((sql, params))
    }

    /// 清空全部累积状态，回到刚 new 出来的样子（表名不变）
    pub fn reset(&mut self) {
        self.projection = "*".to_string();
        self.predicates.clear();
        self.join.clear();
        self.order_by = None;
        self.group_by = None;
        self.limit = None;
        self.params.clear();
    }
}
