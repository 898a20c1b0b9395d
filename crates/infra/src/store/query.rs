//! Filter, ordering and aggregate expressions understood by a `ProductStore`.
//!
//! Filters are conjunctions of column/predicate pairs. Backends translate them
//! into their own query language; the in-memory store evaluates them directly
//! through [`Column::value_of`].

use core::cmp::Ordering;

use rust_decimal::Decimal;

use wholesale_core::ProductId;
use wholesale_products::{Grade, Product, ProductStatus, ProductType};

/// Queryable product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Grade,
    Strain,
    Price,
    Status,
    Stock,
    ProductType,
    Slug,
    MinimumStock,
    Featured,
    SortOrder,
}

impl Column {
    pub fn value_of(self, product: &Product) -> FieldValue {
        match self {
            Column::Id => FieldValue::Int(product.id.get()),
            Column::Grade => FieldValue::Grade(product.grade),
            Column::Strain => FieldValue::Text(product.strain.clone()),
            Column::Price => FieldValue::Decimal(product.price),
            Column::Status => FieldValue::Status(product.status),
            Column::Stock => FieldValue::Int(i64::try_from(product.stock).unwrap_or(i64::MAX)),
            Column::ProductType => FieldValue::Type(product.product_type),
            Column::Slug => FieldValue::Text(product.slug.clone()),
            Column::MinimumStock => FieldValue::Int(i64::from(product.minimum_stock)),
            Column::Featured => FieldValue::Bool(product.featured),
            Column::SortOrder => FieldValue::Int(i64::from(product.sort_order)),
        }
    }
}

/// A typed column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    Grade(Grade),
    Status(ProductStatus),
    Type(ProductType),
}

impl FieldValue {
    /// Ordering between comparable values; `None` across unrelated kinds.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Grade(a), FieldValue::Grade(b)) => Some(a.as_str().cmp(b.as_str())),
            (FieldValue::Status(a), FieldValue::Status(b)) => Some(a.as_str().cmp(b.as_str())),
            (FieldValue::Type(a), FieldValue::Type(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Int(v) => Some(Decimal::from(*v)),
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<ProductId> for FieldValue {
    fn from(value: ProductId) -> Self {
        FieldValue::Int(value.get())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Grade> for FieldValue {
    fn from(value: Grade) -> Self {
        FieldValue::Grade(value)
    }
}

impl From<ProductStatus> for FieldValue {
    fn from(value: ProductStatus) -> Self {
        FieldValue::Status(value)
    }
}

impl From<ProductType> for FieldValue {
    fn from(value: ProductType) -> Self {
        FieldValue::Type(value)
    }
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(Column, FieldValue),
    Ne(Column, FieldValue),
    Gt(Column, FieldValue),
    Lte(Column, FieldValue),
    Contains {
        column: Column,
        needle: String,
        case_insensitive: bool,
    },
}

impl Condition {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Condition::Eq(column, value) => column.value_of(product) == *value,
            Condition::Ne(column, value) => column.value_of(product) != *value,
            Condition::Gt(column, value) => {
                column.value_of(product).compare(value) == Some(Ordering::Greater)
            }
            Condition::Lte(column, value) => matches!(
                column.value_of(product).compare(value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Contains {
                column,
                needle,
                case_insensitive,
            } => match column.value_of(product) {
                FieldValue::Text(haystack) if *case_insensitive => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                FieldValue::Text(haystack) => haystack.contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

/// Conjunction of conditions. Soft-deleted rows are excluded unless asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub conditions: Vec<Condition>,
    pub include_deleted: bool,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    pub fn ne(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Ne(column, value.into()));
        self
    }

    pub fn gt(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Gt(column, value.into()));
        self
    }

    pub fn lte(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Lte(column, value.into()));
        self
    }

    pub fn contains(
        mut self,
        column: Column,
        needle: impl Into<String>,
        case_insensitive: bool,
    ) -> Self {
        self.conditions.push(Condition::Contains {
            column,
            needle: needle.into(),
            case_insensitive,
        });
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        (self.include_deleted || !product.is_deleted())
            && self.conditions.iter().all(|c| c.matches(product))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordered list of sort keys; earlier keys win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder(Vec<(Column, Direction)>);

impl SortOrder {
    pub fn unordered() -> Self {
        Self::default()
    }

    pub fn asc(column: Column) -> Self {
        Self(vec![(column, Direction::Asc)])
    }

    pub fn desc(column: Column) -> Self {
        Self(vec![(column, Direction::Desc)])
    }

    pub fn then_asc(mut self, column: Column) -> Self {
        self.0.push((column, Direction::Asc));
        self
    }

    pub fn then_desc(mut self, column: Column) -> Self {
        self.0.push((column, Direction::Desc));
        self
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        for (column, direction) in &self.0 {
            let ord = column
                .value_of(a)
                .compare(&column.value_of(b))
                .unwrap_or(Ordering::Equal);
            let ord = match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Scalar aggregate over the rows matching a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateExpr {
    Sum(Column),
    /// `sum(left * right)`, e.g. price times stock.
    SumProduct(Column, Column),
}

impl AggregateExpr {
    /// Contribution of one row; non-numeric columns contribute nothing.
    /// `None` when the row's term overflows `Decimal`.
    pub fn term(self, product: &Product) -> Option<Decimal> {
        match self {
            AggregateExpr::Sum(column) => {
                Some(column.value_of(product).as_decimal().unwrap_or_default())
            }
            AggregateExpr::SumProduct(left, right) => {
                match (
                    left.value_of(product).as_decimal(),
                    right.value_of(product).as_decimal(),
                ) {
                    (Some(l), Some(r)) => l.checked_mul(r),
                    _ => Some(Decimal::ZERO),
                }
            }
        }
    }

    /// Total over `rows`; `None` on overflow.
    pub fn evaluate<'a>(self, rows: impl IntoIterator<Item = &'a Product>) -> Option<Decimal> {
        rows.into_iter()
            .try_fold(Decimal::ZERO, |total, product| total.checked_add(self.term(product)?))
    }
}
