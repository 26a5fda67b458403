// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 数组工具
//!
//! 针对 `serde_json::Value` 集合的无状态辅助函数。
//!
//! - 对象与数组都视为可按键查找的子集合，其余值都是标量。
//! - 键存在但值为 `null` 时按缺失处理。
//! - 数值归约只统计数字与数字字符串，布尔值不参与。

use std::fmt;

use serde_json::{Map, Value};

use crate::exception::Exception;

/// 子集合中的键：对象字段名或数组下标。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Name(String),
    Index(usize),
}

impl ArrayKey {
    fn as_index(&self) -> Option<usize> {
        match self {
            ArrayKey::Name(name) => name.parse().ok(),
            ArrayKey::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Name(name) => write!(f, "{}", name),
            ArrayKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for ArrayKey {
    fn from(name: &str) -> Self {
        ArrayKey::Name(name.to_string())
    }
}

impl From<String> for ArrayKey {
    fn from(name: String) -> Self {
        ArrayKey::Name(name)
    }
}

impl From<usize> for ArrayKey {
    fn from(i: usize) -> Self {
        ArrayKey::Index(i)
    }
}

pub struct ArrayTool;

impl ArrayTool {
    /// 以每个元素在 `key` 处的值作为新键重建集合。
    ///
    /// `remove_value` 为真时从每个元素中删除该键。键重复时后出现的元素覆盖先出现的。
    pub fn index_by(
        key: impl Into<ArrayKey>,
        values: &[Value],
        remove_value: bool,
    ) -> Result<Map<String, Value>, Exception> {
        let key = key.into();
        let mut indexed = Map::new();
        for element in values {
            let new_key = map_key(lookup(element, &key)?)?;
            let mut element = element.clone();
            if remove_value {
                remove_from_element(&mut element, &key);
            }
            indexed.insert(new_key, element);
        }
        Ok(indexed)
    }

    /// 以每个元素在 `new_key` 处的值为键、在 `new_value` 处的值为值构建映射。
    pub fn map(
        values: &[Value],
        new_key: impl Into<ArrayKey>,
        new_value: impl Into<ArrayKey>,
    ) -> Result<Map<String, Value>, Exception> {
        let new_key = new_key.into();
        let new_value = new_value.into();
        let mut mapped = Map::new();
        for element in values {
            let k = map_key(lookup(element, &new_key)?)?;
            let v = lookup(element, &new_value)?;
            mapped.insert(k, v.clone());
        }
        Ok(mapped)
    }

    /// 按原顺序取出每个元素在 `key` 处的值。
    pub fn column(values: &[Value], key: impl Into<ArrayKey>) -> Result<Vec<Value>, Exception> {
        let key = key.into();
        values
            .iter()
            .map(|element| lookup(element, &key).map(Value::clone))
            .collect()
    }

    pub fn add(values: &[Value]) -> f64 {
        numeric_values(values).sum()
    }

    /// 没有数值时返回 0。
    pub fn average(values: &[Value]) -> f64 {
        let (total, count) = numeric_values(values).fold((0.0, 0usize), |(t, c), v| (t + v, c + 1));
        if count == 0 {
            return 0.0;
        }
        total / count as f64
    }

    pub fn max(values: &[Value]) -> Result<f64, Exception> {
        numeric_values(values)
            .reduce(f64::max)
            .ok_or(Exception::EmptyInput)
    }

    pub fn min(values: &[Value]) -> Result<f64, Exception> {
        numeric_values(values)
            .reduce(f64::min)
            .ok_or(Exception::EmptyInput)
    }

    /// 从映射中删除 `key` 并返回原来的值，其余条目保持原顺序。
    pub fn remove(key: impl Into<ArrayKey>, collection: &mut Map<String, Value>) -> Result<Value, Exception> {
        let key = key.into().to_string();
        match collection.get(&key) {
            Some(v) if !v.is_null() => {}
            _ => return Err(Exception::IndexNotInArray),
        }
        collection
            .shift_remove(&key)
            .ok_or(Exception::IndexNotInArray)
    }
}

fn lookup<'v>(element: &'v Value, key: &ArrayKey) -> Result<&'v Value, Exception> {
    let found = match element {
        Value::Object(map) => map.get(&key.to_string()),
        Value::Array(list) => key.as_index().and_then(|i| list.get(i)),
        _ => return Err(Exception::ScalarVariable),
    };
    match found {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(Exception::IndexNotInArray),
    }
}

fn remove_from_element(element: &mut Value, key: &ArrayKey) {
    match element {
        Value::Object(map) => {
            map.shift_remove(&key.to_string());
        }
        Value::Array(list) => {
            if let Some(i) = key.as_index().filter(|i| *i < list.len()) {
                list.remove(i);
            }
        }
        _ => {}
    }
}

/// 把值转换为映射的键。浮点数截断为整数。
fn map_key(value: &Value) -> Result<String, Exception> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else {
                Ok((n.as_f64().unwrap_or_default().trunc() as i64).to_string())
            }
        }
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Exception::IllegalOffset),
    }
}

fn numeric_values(values: &[Value]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    })
}

/// 只接受十进制写法（可带符号、小数点与指数），拒绝 `inf`、`NaN` 之类的拼写。
fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        || !s.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse().ok()
}
