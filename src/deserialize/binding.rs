use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::deserialize::{SemanticType, Value};

/// Capability that maps a column name to a target slot. Returning `None`
/// leaves the column unbound; it is silently skipped during typed parsing.
///
/// How the mapping is built (by hand, from declarative config, generated) is
/// the caller's business; the parser only consumes this interface.
pub trait FieldBinder<T> {
    #[allow(clippy::type_complexity)]
    fn bind(&self, column: &str) -> Option<(&SemanticType, &(dyn Fn(&mut T, Value) + Send + Sync))>;
}

type Sink<T> = Box<dyn Fn(&mut T, Value) + Send + Sync>;

/// An explicit column-name → (semantic type, setter) table, built once via
/// [`RowBinding::builder`] and shared by reference across a parse.
pub struct RowBinding<T> {
    bindings: HashMap<String, (SemanticType, Sink<T>)>,
}

impl<T> RowBinding<T> {
    pub fn builder() -> RowBindingBuilder<T> {
        RowBindingBuilder {
            bindings: HashMap::new(),
        }
    }

}

impl<T> FieldBinder<T> for RowBinding<T> {
    fn bind(&self, column: &str) -> Option<(&SemanticType, &(dyn Fn(&mut T, Value) + Send + Sync))> {
        self.bindings
            .get(column)
            .map(|(ty, sink)| (ty, sink.as_ref()))
    }
}

impl<T> std::fmt::Debug for RowBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut columns: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        columns.sort_unstable();
        f.debug_struct("RowBinding").field("columns", &columns).finish()
    }
}

/// Typed helpers wrap the raw sink so setters receive the concrete value
/// instead of matching on [`Value`] themselves. Binding a column twice keeps
/// the later binding.
pub struct RowBindingBuilder<T> {
    bindings: HashMap<String, (SemanticType, Sink<T>)>,
}

impl<T> RowBindingBuilder<T> {
    pub fn bind(
        mut self,
        column: impl Into<String>,
        ty: SemanticType,
        sink: impl Fn(&mut T, Value) + Send + Sync + 'static,
    ) -> Self {
        self.bindings.insert(column.into(), (ty, Box::new(sink)));
        self
    }

    pub fn string(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, String) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::String, move |t, v| {
            if let Value::Text(s) = v {
                set(t, s);
            }
        })
    }

    pub fn integer(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, i32) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::Integer, move |t, v| {
            if let Value::Integer(i) = v {
                set(t, i);
            }
        })
    }

    pub fn long(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, i64) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::Long, move |t, v| {
            if let Value::Long(i) = v {
                set(t, i);
            }
        })
    }

    pub fn decimal(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, Decimal) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::Decimal, move |t, v| {
            if let Value::Decimal(d) = v {
                set(t, d);
            }
        })
    }

    pub fn boolean(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, bool) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::Boolean, move |t, v| {
            if let Value::Boolean(b) = v {
                set(t, b);
            }
        })
    }

    pub fn date(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, NaiveDate) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::Date, move |t, v| {
            if let Value::Date(d) = v {
                set(t, d);
            }
        })
    }

    pub fn date_time(
        self,
        column: impl Into<String>,
        set: impl Fn(&mut T, NaiveDateTime) + Send + Sync + 'static,
    ) -> Self {
        self.bind(column, SemanticType::DateTime, move |t, v| {
            if let Value::DateTime(d) = v {
                set(t, d);
            }
        })
    }

    /// The setter receives the index of the matched member within `members`.
    pub fn enumeration(
        self,
        column: impl Into<String>,
        members: &[&str],
        set: impl Fn(&mut T, usize) + Send + Sync + 'static,
    ) -> Self {
        let members = members.iter().map(|m| m.to_string()).collect();
        self.bind(column, SemanticType::Enum(members), move |t, v| {
            if let Value::Enum(i) = v {
                set(t, i);
            }
        })
    }

    pub fn build(self) -> RowBinding<T> {
        RowBinding {
            bindings: self.bindings,
        }
    }
}
