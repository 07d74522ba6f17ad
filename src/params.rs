//! 参数绑定模块 - 占位符名称派生与单条语句的绑定值管理

use std::collections::HashMap;

use crate::db_pool::DbDriver;
use crate::error::{Result, SqlxModelError};

/// 绑定值，用于安全地传递参数
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    String(String),
    Int64(i64),
    Int32(i32),
    Int16(i16),
    Float64(f64),
    Float32(f32),
    Bool(bool),
    Null,
}

impl BindValue {
    /// 渲染为带引号的 SQL 字面量（仅供日志插值和 quote 辅助使用）
    pub fn to_sql_value(&self) -> String {
        match self {
            BindValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            BindValue::Int64(i) => i.to_string(),
            BindValue::Int32(i) => i.to_string(),
            BindValue::Int16(i) => i.to_string(),
            BindValue::Float64(f) => f.to_string(),
            BindValue::Float32(f) => f.to_string(),
            BindValue::Bool(b) => b.to_string(),
            BindValue::Null => "NULL".to_string(),
        }
    }

    /// 不带引号的原始文本，LIKE 通配包装时使用
    pub(crate) fn to_plain_string(&self) -> String {
        match self {
            BindValue::String(s) => s.clone(),
            BindValue::Int64(i) => i.to_string(),
            BindValue::Int32(i) => i.to_string(),
            BindValue::Int16(i) => i.to_string(),
            BindValue::Float64(f) => f.to_string(),
            BindValue::Float32(f) => f.to_string(),
            BindValue::Bool(b) => b.to_string(),
            BindValue::Null => String::new(),
        }
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::String(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::String(s.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Int64(i)
    }
}

impl From<i32> for BindValue {
    fn from(i: i32) -> Self {
        BindValue::Int32(i)
    }
}

impl From<i16> for BindValue {
    fn from(i: i16) -> Self {
        BindValue::Int16(i)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Float64(f)
    }
}

impl From<f32> for BindValue {
    fn from(f: f32) -> Self {
        BindValue::Float32(f)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

/// 把单个 BindValue 应用到 sqlx 查询上（query / query_as 通用）
#[macro_export]
macro_rules! apply_bind_value {
    ($query:expr, $bind:expr) => {
        match $bind {
            $crate::params::BindValue::String(s) => {
                $query = $query.bind(s.clone());
            }
            $crate::params::BindValue::Int64(i) => {
                $query = $query.bind(*i);
            }
            $crate::params::BindValue::Int32(i) => {
                $query = $query.bind(*i);
            }
            $crate::params::BindValue::Int16(i) => {
                $query = $query.bind(*i);
            }
            $crate::params::BindValue::Float64(f) => {
                $query = $query.bind(*f);
            }
            $crate::params::BindValue::Float32(f) => {
                $query = $query.bind(*f);
            }
            $crate::params::BindValue::Bool(b) => {
                $query = $query.bind(*b);
            }
            $crate::params::BindValue::Null => {
                $query = $query.bind(Option::<String>::None);
            }
        }
    };
}

/// 从列名派生占位符名称：剥掉空格/下划线/连字符/句点，每段首字母大写
///
/// 派生是纯函数且确定：`"foo_bar"` 与 `"FooBar"` 会派生出同一个基础名，
/// 这类冲突由 [`ParamMap::register`] 的后缀机制处理。
pub fn derive_placeholder(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper_next = true;
    for ch in column.chars() {
        if matches!(ch, ' ' | '_' | '-' | '.') {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// 单条语句的绑定参数集合
///
/// 键在一条语句内唯一；派生名冲突时追加数字后缀（从 2 开始）。
/// 后缀用计数表推进，而不是从已生成的键里解析尾部数字。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<(String, BindValue)>,
    counters: HashMap<String, u32>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个绑定值，返回实际使用的占位符键
    pub fn register(&mut self, column: &str, value: BindValue) -> String {
        let base = derive_placeholder(column);
        let key = if !self.contains(&base) {
            base
        } else {
            let next = self.counters.entry(base.clone()).or_insert(2);
            let mut candidate = format!("{}{}", base, *next);
            while self.entries.iter().any(|(k, _)| *k == candidate) {
                *next += 1;
                candidate = format!("{}{}", base, *next);
            }
            *next += 1;
            candidate
        };
        self.entries.push((key.clone(), value));
        key
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&BindValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// 按注册顺序遍历 (键, 值)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counters.clear();
    }

    /// 把命名占位符语句翻译成驱动的位置占位符形式
    ///
    /// 返回重写后的 SQL 和按出现顺序排列的绑定值。`::` 是类型转换语法，
    /// 原样保留；出现未注册的占位符说明渲染与绑定不一致，直接报错。
    pub fn to_positional(&self, sql: &str, driver: DbDriver) -> Result<(String, Vec<BindValue>)> {
        let chars: Vec<char> = sql.chars().collect();
        let mut out = String::with_capacity(sql.len());
        let mut binds = Vec::with_capacity(self.entries.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != ':' {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            if i + 1 < chars.len() && chars[i + 1] == ':' {
                out.push_str("::");
                i += 2;
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end == start {
                out.push(':');
                i += 1;
                continue;
            }
            let name: String = chars[start..end].iter().collect();
            let value = self
                .get(&name)
                .ok_or_else(|| SqlxModelError::MissingParameter(name.clone()))?;
            out.push_str(&driver.placeholder(binds.len()));
            binds.push(value.clone());
            i = end;
        }
        Ok((out, binds))
    }
}
