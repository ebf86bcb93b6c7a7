//! Value module - the closed set of scalars that can be bound to a statement

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Text layout used for time-of-day values
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A geometric point, stored by SQLite as the JSON text `{"x":..,"y":..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub(crate) fn to_json_text(self) -> String {
        // Non-finite coordinates become null
        serde_json::json!({ "x": self.x, "y": self.y }).to_string()
    }
}

/// Every bindable scalar the query layer can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Data(Vec<u8>),
    Bool(bool),
    Float(f32),
    Double(f64),
    /// Platform-width signed integer
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Platform-width unsigned integer
    UInt(u64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Point(Point),
    Time(NaiveTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Time-of-day from its components; `None` when out of range
    pub fn time(hour: u32, minute: u32, second: u32) -> Option<Value> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Value::Time)
    }

    pub fn point(x: f64, y: f64) -> Value {
        Value::Point(Point::new(x, y))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    String => String,
    Vec<u8> => Data,
    bool => Bool,
    f32 => Float,
    f64 => Double,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    Point => Point,
    NaiveTime => Time,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Data(b.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
