use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::SecondsFormat;
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Number, Value};

/// 将一条文档转换为 JSON 对象（保持字段顺序）。
pub fn document_to_json(doc: Document) -> Value {
    let mut map = Map::with_capacity(doc.len());
    for (k, v) in doc {
        map.insert(k, bson_to_json(v));
    }
    Value::Object(map)
}

/// BSON 值 → JSON 值。
///
/// 对齐浏览器侧 `JSON.stringify` 对驱动返回值的效果：
/// ObjectId 输出 hex 字符串，日期输出带毫秒的 ISO 字符串，二进制输出 base64，
/// 整数与浮点输出数字；其余类型回退到 relaxed Extended JSON。
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Bson::String(s) | Bson::Symbol(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => datetime_to_json(dt),
        Bson::Binary(bin) => Value::String(BASE64_STANDARD.encode(&bin.bytes)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        other => other.into_relaxed_extjson(),
    }
}

fn datetime_to_json(dt: mongodb::bson::DateTime) -> Value {
    let millis = dt.timestamp_millis();
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        // 超出 chrono 可表示范围的日期（JS 中同样无法 toISOString）
        None => Value::Null,
    }
}
